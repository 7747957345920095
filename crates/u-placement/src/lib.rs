//! # U-Placement
//!
//! Randomized object placement for simulated scenes.
//!
//! This crate provides:
//! - **Core model**: poses, regions, placeable objects with spawn sites, the
//!   placement table, and the geometry oracle
//! - **Samplers**: uniform-region, sequential-composite and multi-region
//!   rejection samplers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use u_placement::core::{BoxObject, BoxOracle, PlacementTable, Region};
//! use u_placement::sampler::{SampleArgs, SampleContext, SamplerConfig, UniformRegionSampler};
//!
//! let cup = BoxObject::new("cup", 0.08, 0.08, 0.1).into_handle();
//! let sampler = UniformRegionSampler::new(
//!     "counter",
//!     vec![cup],
//!     Region::new((-0.3, 0.3), (-0.2, 0.2)),
//!     SamplerConfig::default(),
//! )?;
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mut ctx = SampleContext::new(&BoxOracle::new(), &mut rng);
//! let placed = sampler.sample(&PlacementTable::new(), &SampleArgs::new(), &mut ctx)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `sampler` (default): placement samplers
//! - `serde`: Serialization support

/// Core types and the geometry oracle.
pub use u_placement_core as core;

/// Placement samplers.
#[cfg(feature = "sampler")]
pub use u_placement_sampler as sampler;

// Re-export commonly used types at root level
pub use u_placement_core::{
    Error, GeometryOracle, ObjectHandle, PlaceableObject, PlacementTable, Pose, Region, Result,
};

#[cfg(feature = "sampler")]
pub use u_placement_sampler::{
    Reference, SampleArgs, SampleContext, Sampler, SamplerConfig, SequentialCompositeSampler,
};
