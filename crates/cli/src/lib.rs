//! Scene runner for U-Placement
//!
//! This crate provides:
//! - JSON scene loader building a sampler tree and its fixtures
//! - Placement runner with seeded, retryable passes

mod runner;
mod scene;

pub use runner::{PlacementRunner, RunConfig};
pub use scene::{Scene, SceneError, SceneParser};
