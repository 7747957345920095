//! Poses, rotation axes and planar rotation helpers.
//!
//! Orientations are unit quaternions. Where a quaternion crosses the API as raw
//! numbers it is always in `(w, x, y, z)` order.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Point3, Quaternion, Unit, UnitQuaternion, Vector2, Vector3};

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis about which a sampled rotation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    /// Rotation about x.
    X,
    /// Rotation about y.
    Y,
    /// Rotation about the vertical axis.
    #[default]
    Z,
}

impl Axis {
    /// Returns the unit vector of this axis.
    pub fn unit(&self) -> Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }

    /// Builds the quaternion for a rotation of `angle` radians about this axis.
    pub fn rotation(&self, angle: f64) -> UnitQuaternion<f64> {
        let (s, c) = (angle / 2.0).sin_cos();
        let q = match self {
            Axis::X => Quaternion::new(c, s, 0.0, 0.0),
            Axis::Y => Quaternion::new(c, 0.0, s, 0.0),
            Axis::Z => Quaternion::new(c, 0.0, 0.0, s),
        };
        UnitQuaternion::new_unchecked(q)
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x" | "X" => Ok(Axis::X),
            "y" | "Y" => Ok(Axis::Y),
            "z" | "Z" => Ok(Axis::Z),
            other => Err(Error::ConfigError(format!(
                "Invalid rotation axis specified. Must be 'x', 'y', or 'z'. Got: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        f.write_str(s)
    }
}

/// A rigid placement: position plus unit-quaternion orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// World-frame position.
    pub position: Vector3<f64>,
    /// World-frame orientation.
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    /// Creates a pose from a position and orientation.
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Creates an unrotated pose at the given coordinates.
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self::new(Vector3::new(x, y, z), UnitQuaternion::identity())
    }

    /// Identity pose at the origin.
    pub fn identity() -> Self {
        Self::at(0.0, 0.0, 0.0)
    }

    /// Creates a pose from a `(w, x, y, z)` quaternion, normalizing it.
    pub fn from_wxyz(position: Vector3<f64>, wxyz: [f64; 4]) -> Self {
        let q = Quaternion::new(wxyz[0], wxyz[1], wxyz[2], wxyz[3]);
        Self::new(position, UnitQuaternion::from_quaternion(q))
    }

    /// Sets the orientation.
    pub fn with_orientation(mut self, orientation: UnitQuaternion<f64>) -> Self {
        self.orientation = orientation;
        self
    }

    /// Returns the orientation as `[w, x, y, z]`.
    pub fn wxyz(&self) -> [f64; 4] {
        let q = self.orientation.quaternion();
        [q.w, q.i, q.j, q.k]
    }

    /// Maps a point from the pose's local frame into the world frame.
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.orientation * local.coords + self.position)
    }

    /// Rotates a local vector into the world frame without translating it.
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.orientation * local
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Rotates a planar offset counter-clockwise by `rot` radians.
pub fn rotate_2d(x: f64, y: f64, rot: f64) -> Vector2<f64> {
    let (s, c) = rot.sin_cos();
    Vector2::new(c * x - s * y, s * x + c * y)
}

/// Rotation of `rot` radians about the vertical axis.
pub fn yaw(rot: f64) -> UnitQuaternion<f64> {
    Axis::Z.rotation(rot)
}
