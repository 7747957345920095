//! Random choice among quadrant-bound samplers.

use rand::Rng;
use u_placement_core::{ObjectHandle, PlacementTable, Quadrant, QuadrantRegions, Result, Side};

use crate::config::SamplerConfig;
use crate::reference::SampleArgs;
use crate::sampler::{check_unique, SampleContext, SampleOutcome};
use crate::uniform::UniformRegionSampler;

/// Places its objects in one quadrant, chosen uniformly per call.
///
/// One [`UniformRegionSampler`] is built per quadrant covered by the side
/// selector. They share the object set and the config. A failed call never
/// falls back to another quadrant.
#[derive(Debug, Clone)]
pub struct MultiRegionSampler {
    name: String,
    side: Side,
    children: Vec<(Quadrant, UniformRegionSampler)>,
}

impl MultiRegionSampler {
    /// Creates a sampler over the quadrants selected by `side`.
    pub fn new(
        name: impl Into<String>,
        regions: QuadrantRegions,
        side: Side,
        objects: Vec<ObjectHandle>,
        config: SamplerConfig,
    ) -> Result<Self> {
        let name = name.into();
        check_unique(&[], &objects)?;
        let children = side
            .quadrants()
            .into_iter()
            .map(|q| {
                UniformRegionSampler::new(
                    format!("{}_{}", name, q),
                    objects.clone(),
                    regions.get(q).clone(),
                    config.clone(),
                )
                .map(|s| (q, s))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name,
            side,
            children,
        })
    }

    /// Sampler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Side selector.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Quadrants this sampler can choose from.
    pub fn quadrants(&self) -> impl Iterator<Item = Quadrant> + '_ {
        self.children.iter().map(|(q, _)| *q)
    }

    /// The sampler bound to `quadrant`, if selected.
    pub fn quadrant_sampler(&self, quadrant: Quadrant) -> Option<&UniformRegionSampler> {
        self.children
            .iter()
            .find(|(q, _)| *q == quadrant)
            .map(|(_, s)| s)
    }

    /// Names of the shared objects.
    pub fn object_names(&self) -> Vec<String> {
        self.children
            .first()
            .map(|(_, s)| s.object_names())
            .unwrap_or_default()
    }

    /// Registers more objects with every quadrant.
    pub fn add_objects(&mut self, objects: Vec<ObjectHandle>) -> Result<()> {
        check_unique(&self.object_names(), &objects)?;
        for (_, child) in &mut self.children {
            child.add_objects(objects.clone())?;
        }
        Ok(())
    }

    /// Clears the objects of every quadrant.
    pub fn reset(&mut self) {
        for (_, child) in &mut self.children {
            child.reset();
        }
    }

    /// Picks one quadrant uniformly and delegates to it.
    pub fn attempt<R: Rng + ?Sized>(
        &self,
        table: &PlacementTable,
        args: &SampleArgs,
        ctx: &mut SampleContext<'_, R>,
    ) -> Result<SampleOutcome> {
        if self.children.is_empty() {
            return Ok(SampleOutcome::Placed(PlacementTable::new()));
        }
        let (quadrant, child) = &self.children[ctx.rng.gen_range(0..self.children.len())];
        log::debug!("Sampler '{}': chose quadrant {}", self.name, quadrant);
        child.attempt(table, args, ctx)
    }

    /// Picks one quadrant uniformly and places every object there.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        table: &PlacementTable,
        args: &SampleArgs,
        ctx: &mut SampleContext<'_, R>,
    ) -> Result<PlacementTable> {
        self.attempt(table, args, ctx)?.into_result()
    }
}
