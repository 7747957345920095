//! # U-Placement Sampler
//!
//! Rejection-sampling object placement.
//!
//! Samplers assign each registered object a pose inside a region such that
//! the enabled constraints hold: containment in the region, no overlap with
//! placed objects, containment in a reference object's footprint, and
//! avoidance of excluded footprints. Each candidate is drawn at random and
//! retried up to a fixed budget.
//!
//! ## Sampler kinds
//!
//! - [`UniformRegionSampler`]: samples within one rectangle anchored to a reference
//! - [`SequentialCompositeSampler`]: runs named children in order, with optional children
//! - [`MultiRegionSampler`]: picks one of up to four quadrant samplers per call
//!
//! All three are wrapped by the [`Sampler`] enum so composites can nest any kind.
//!
//! ## Example
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use u_placement_core::{BoxObject, BoxOracle, PlacementTable, Region};
//! use u_placement_sampler::{SampleArgs, SampleContext, SamplerConfig, UniformRegionSampler};
//!
//! let cup = BoxObject::new("cup", 0.08, 0.08, 0.1).into_handle();
//! let sampler = UniformRegionSampler::new(
//!     "counter",
//!     vec![cup],
//!     Region::new((-0.3, 0.3), (-0.2, 0.2)),
//!     SamplerConfig::default(),
//! )
//! .unwrap();
//!
//! let oracle = BoxOracle::new();
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut ctx = SampleContext::new(&oracle, &mut rng);
//! let placed = sampler
//!     .sample(&PlacementTable::new(), &SampleArgs::new(), &mut ctx)
//!     .unwrap();
//! assert!(placed.contains("cup"));
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization of configs and arguments

pub mod composite;
pub mod config;
pub mod multi_region;
pub mod reference;
pub mod sampler;
pub mod uniform;

// Re-exports
pub use composite::SequentialCompositeSampler;
pub use config::{RotationPolicy, SamplerConfig, SpawnCommit, DEFAULT_NUM_ATTEMPTS};
pub use multi_region::MultiRegionSampler;
pub use reference::{Reference, ResolvedReference, SampleArgs, SampleOverrides, SpawnClaim};
pub use sampler::{Exhaustion, SampleContext, SampleOutcome, Sampler};
pub use uniform::UniformRegionSampler;
