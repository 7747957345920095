//! Sampler configuration.

use std::f64::consts::TAU;

use nalgebra::UnitQuaternion;
use rand::Rng;
use u_placement_core::{Axis, Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default retry budget per object.
pub const DEFAULT_NUM_ATTEMPTS: usize = 5000;

/// How the rotation angle of each candidate is drawn.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RotationPolicy {
    /// Uniform angle in `[0, 2π)`.
    #[default]
    Uniform,
    /// Fixed angle in radians.
    Fixed(f64),
    /// Uniform angle within `(a, b)`, bounds in either order.
    Range(f64, f64),
    /// One interval chosen uniformly, then a uniform angle within it.
    Ranges(Vec<(f64, f64)>),
}

impl RotationPolicy {
    /// Draws an angle in radians.
    pub fn sample_angle<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            RotationPolicy::Uniform => uniform(rng, 0.0, TAU),
            RotationPolicy::Fixed(angle) => *angle,
            RotationPolicy::Range(a, b) => uniform(rng, a.min(*b), a.max(*b)),
            RotationPolicy::Ranges(ranges) => {
                let (a, b) = ranges[rng.gen_range(0..ranges.len())];
                uniform(rng, a.min(b), a.max(b))
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let finite = match self {
            RotationPolicy::Uniform => true,
            RotationPolicy::Fixed(a) => a.is_finite(),
            RotationPolicy::Range(a, b) => a.is_finite() && b.is_finite(),
            RotationPolicy::Ranges(ranges) => {
                if ranges.is_empty() {
                    return Err(Error::ConfigError(
                        "Rotation range list must not be empty".into(),
                    ));
                }
                ranges.iter().all(|(a, b)| a.is_finite() && b.is_finite())
            }
        };
        if !finite {
            return Err(Error::ConfigError("Rotation angles must be finite".into()));
        }
        Ok(())
    }
}

/// When a spawn site referenced by a call is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpawnCommit {
    /// Consume the site as soon as the reference is resolved, even if placement later fails.
    #[default]
    Eager,
    /// Consume the site only once every object of the call has been placed.
    OnSuccess,
}

/// Immutable per-sampler placement policy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SamplerConfig {
    /// Rotation policy.
    pub rotation: RotationPolicy,

    /// Axis the sampled rotation is applied about.
    pub rotation_axis: Axis,

    /// Require the object to lie fully inside the sampling region.
    pub ensure_object_boundary_in_range: bool,

    /// Reject candidates intersecting any already placed object.
    pub ensure_valid_placement: bool,

    /// Require keypoints of the object inside the named reference's footprint.
    pub ensure_object_in_ref_region: bool,

    /// Require the object to stay out of every excluded object's footprint.
    pub ensure_object_out_of_ref_region: bool,

    /// Vertical offset added to every placement.
    pub z_offset: f64,

    /// Retry budget per object.
    pub num_attempts: usize,

    /// Spawn consumption policy.
    pub spawn_commit: SpawnCommit,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            rotation: RotationPolicy::Uniform,
            rotation_axis: Axis::Z,
            ensure_object_boundary_in_range: true,
            ensure_valid_placement: true,
            ensure_object_in_ref_region: false,
            ensure_object_out_of_ref_region: false,
            z_offset: 0.0,
            num_attempts: DEFAULT_NUM_ATTEMPTS,
            spawn_commit: SpawnCommit::Eager,
        }
    }
}

impl SamplerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rotation policy.
    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the rotation axis.
    pub fn with_rotation_axis(mut self, axis: Axis) -> Self {
        self.rotation_axis = axis;
        self
    }

    /// Enables or disables the boundary containment check.
    pub fn with_boundary_check(mut self, enabled: bool) -> Self {
        self.ensure_object_boundary_in_range = enabled;
        self
    }

    /// Enables or disables the overlap check.
    pub fn with_overlap_check(mut self, enabled: bool) -> Self {
        self.ensure_valid_placement = enabled;
        self
    }

    /// Requires placements to fall within the named reference's footprint.
    pub fn with_in_ref_region(mut self, enabled: bool) -> Self {
        self.ensure_object_in_ref_region = enabled;
        self
    }

    /// Requires placements to avoid the excluded objects' footprints.
    pub fn with_out_of_ref_region(mut self, enabled: bool) -> Self {
        self.ensure_object_out_of_ref_region = enabled;
        self
    }

    /// Sets the vertical offset.
    pub fn with_z_offset(mut self, z_offset: f64) -> Self {
        self.z_offset = z_offset;
        self
    }

    /// Sets the retry budget per object.
    pub fn with_num_attempts(mut self, attempts: usize) -> Self {
        self.num_attempts = attempts;
        self
    }

    /// Sets the spawn consumption policy.
    pub fn with_spawn_commit(mut self, commit: SpawnCommit) -> Self {
        self.spawn_commit = commit;
        self
    }

    /// Draws a rotation about the configured axis.
    pub fn sample_rotation<R: Rng + ?Sized>(&self, rng: &mut R) -> UnitQuaternion<f64> {
        let angle = self.rotation.sample_angle(rng);
        self.rotation_axis.rotation(angle)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.rotation.validate()?;
        if !self.z_offset.is_finite() {
            return Err(Error::ConfigError("z_offset must be finite".into()));
        }
        if self.num_attempts == 0 {
            return Err(Error::ConfigError(
                "num_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Uniform draw in `[lo, hi)`; returns `lo` for an empty interval.
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if lo < hi {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}
