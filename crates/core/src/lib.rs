//! # U-Placement Core
//!
//! Core types for the U-Placement object placement sampler.
//!
//! This crate provides the data model shared by every sampler: poses, regions,
//! placeable objects with their spawn sites, the placement table threaded
//! through a sampling pass, and the geometry oracle the samplers consult.
//!
//! ## Core Components
//!
//! - **Transforms**: `Pose`, `Axis`, planar rotation helpers
//! - **Regions**: `Region`, `RegionCorners`, quadrant/side selection
//! - **Objects**: `PlaceableObject` capability, `SpawnSites`, reference `BoxObject`
//! - **Placement table**: insertion-ordered `PlacementTable` of `PlacedEntry`
//! - **Geometry**: `GeometryOracle` trait and the reference `BoxOracle`
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod error;
pub mod geometry;
pub mod object;
pub mod placement;
pub mod region;
pub mod transform;

// Re-exports
pub use error::{Error, Result};
pub use geometry::{BoxOracle, GeometryOracle};
pub use object::{BoxObject, ObjectHandle, PlaceableObject, SpawnSite, SpawnSites};
pub use placement::{PlacedEntry, PlacementRecord, PlacementTable};
pub use region::{Quadrant, QuadrantRegions, Region, RegionCorners, Side};
pub use transform::{rotate_2d, yaw, Axis, Pose};
