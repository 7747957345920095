//! Runs sampling passes over a loaded scene.

use rand::rngs::StdRng;
use rand::SeedableRng;
use u_placement_core::{BoxOracle, PlacementTable, Result};
use u_placement_sampler::SampleContext;

use crate::scene::Scene;

/// Configuration for a placement run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Seed of the pass generator.
    pub seed: u64,
    /// Extra passes attempted after an exhausted one.
    pub retries: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            retries: 0,
        }
    }
}

impl RunConfig {
    /// Creates a new run configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of retries.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }
}

/// Runs placement passes over a scene.
pub struct PlacementRunner {
    config: RunConfig,
    oracle: BoxOracle,
}

impl PlacementRunner {
    /// Creates a new runner.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            oracle: BoxOracle::new(),
        }
    }

    /// Runs one pass, rerunning it with fresh draws while it ends in exhaustion
    /// and retries remain.
    ///
    /// Returns the newly placed entries. Fixtures are not included.
    pub fn run(&self, scene: &Scene) -> Result<PlacementTable> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut pass = 0;
        loop {
            scene.reactivate_spawns();
            let mut ctx = SampleContext::new(&self.oracle, &mut rng);
            match scene.sampler.sample(&scene.fixtures, &scene.args, &mut ctx) {
                Ok(placed) => {
                    log::info!("Pass {} placed {} object(s)", pass, placed.len());
                    return Ok(placed);
                }
                Err(e) if e.is_exhausted() && pass < self.config.retries => {
                    log::warn!("Pass {} failed: {}; retrying", pass, e);
                    pass += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
