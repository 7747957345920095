//! Sampling regions, their world-frame corners, and quadrant selection.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Point3, Vector2, Vector3};

use crate::transform::rotate_2d;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rectangular sampling region expressed in a reference frame.
///
/// The extents are local to the reference frame, which is placed at
/// `reference_pos` and rotated by `reference_rot` about the vertical axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Region {
    /// Origin of the reference frame.
    pub reference_pos: Vector3<f64>,
    /// Rotation of the reference frame about z, in radians.
    pub reference_rot: f64,
    /// (min, max) extent along the local x axis.
    pub x_range: (f64, f64),
    /// (min, max) extent along the local y axis.
    pub y_range: (f64, f64),
}

impl Region {
    /// Creates a region at the origin. Ranges given in either order are normalized.
    pub fn new(x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self {
            reference_pos: Vector3::zeros(),
            reference_rot: 0.0,
            x_range: ordered(x_range),
            y_range: ordered(y_range),
        }
    }

    /// Sets the reference position.
    pub fn with_reference_pos(mut self, pos: Vector3<f64>) -> Self {
        self.reference_pos = pos;
        self
    }

    /// Sets the reference rotation about z.
    pub fn with_reference_rot(mut self, rot: f64) -> Self {
        self.reference_rot = rot;
        self
    }

    /// Maps a local (x, y) offset to a world-frame point relative to `base`.
    pub fn local_to_world(&self, x: f64, y: f64, base: &Vector3<f64>) -> Point3<f64> {
        let v = rotate_2d(x, y, self.reference_rot);
        Point3::new(base.x + v.x, base.y + v.y, base.z)
    }

    /// World-frame corners of the region placed at `base`.
    pub fn corners(&self, base: &Vector3<f64>) -> RegionCorners {
        let (x0, x1) = self.x_range;
        let (y0, y1) = self.y_range;
        RegionCorners::new(
            self.local_to_world(x0, y0, base),
            self.local_to_world(x1, y0, base),
            self.local_to_world(x0, y1, base),
        )
    }

    /// Validates the region.
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.reference_rot,
            self.x_range.0,
            self.x_range.1,
            self.y_range.0,
            self.y_range.1,
        ];
        if values.iter().chain(self.reference_pos.iter()).any(|v| !v.is_finite()) {
            return Err(Error::ConfigError("Region values must be finite".into()));
        }
        if self.x_range.0 > self.x_range.1 || self.y_range.0 > self.y_range.1 {
            return Err(Error::ConfigError("Region ranges must be (min, max)".into()));
        }
        Ok(())
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::new((0.0, 0.0), (0.0, 0.0))
    }
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Three points defining an oriented rectangle: origin, +x corner, +y corner.
///
/// The fourth corner is implied by the right angle at `origin`. A zero-width
/// side collapses the rectangle to a segment or a point; containment then
/// only constrains the remaining axis, so a zero-area region accepts any
/// offset along its collapsed direction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionCorners {
    /// Corner at (min x, min y).
    pub origin: Point3<f64>,
    /// Corner at (max x, min y).
    pub x_corner: Point3<f64>,
    /// Corner at (min x, max y).
    pub y_corner: Point3<f64>,
}

impl RegionCorners {
    /// Creates corners from the origin, +x and +y points.
    pub fn new(origin: Point3<f64>, x_corner: Point3<f64>, y_corner: Point3<f64>) -> Self {
        Self {
            origin,
            x_corner,
            y_corner,
        }
    }

    /// Builds corners from the first three bounding corners of an object.
    pub fn from_bounding(corners: &[Point3<f64>; 4]) -> Self {
        Self::new(corners[0], corners[1], corners[2])
    }

    /// Returns true if the point's planar projection lies inside (or on) the rectangle.
    pub fn contains_xy(&self, p: &Point3<f64>) -> bool {
        const EPS: f64 = 1e-9;
        let u = (self.x_corner - self.origin).xy();
        let v = (self.y_corner - self.origin).xy();
        let d = (*p - self.origin).xy();
        let du = d.dot(&u);
        let dv = d.dot(&v);
        du >= -EPS && du <= u.norm_squared() + EPS && dv >= -EPS && dv <= v.norm_squared() + EPS
    }

    /// The four planar corners, in origin, +x, opposite, +y order.
    pub fn points_xy(&self) -> [Vector2<f64>; 4] {
        let o = self.origin.xy().coords;
        let x = self.x_corner.xy().coords;
        let y = self.y_corner.xy().coords;
        [o, x, x + y - o, y]
    }

    /// Returns true if the planar projections of the two rectangles share any
    /// point, boundaries included.
    pub fn overlaps_xy(&self, other: &RegionCorners) -> bool {
        const EPS: f64 = 1e-9;
        let a = self.points_xy();
        let b = other.points_xy();
        let axes = [
            a[1] - a[0],
            a[3] - a[0],
            b[1] - b[0],
            b[3] - b[0],
            b[0] - a[0],
        ];
        let project = |points: &[Vector2<f64>; 4], axis: &Vector2<f64>| {
            points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                let d = p.dot(axis);
                (lo.min(d), hi.max(d))
            })
        };
        // Edges and their normals, plus the offset between the origins, so
        // collapsed rectangles still yield a separating direction.
        !axes
            .iter()
            .flat_map(|e| [*e, Vector2::new(-e.y, e.x)])
            .filter(|axis| axis.norm_squared() > EPS * EPS)
            .any(|axis| {
                let axis = axis.normalize();
                let (min_a, max_a) = project(&a, &axis);
                let (min_b, max_b) = project(&b, &axis);
                max_a < min_b - EPS || max_b < min_a - EPS
            })
    }
}

/// One of the four quadrant regions of a multi-region sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Quadrant {
    /// Front left.
    FrontLeft,
    /// Front right.
    FrontRight,
    /// Back left.
    BackLeft,
    /// Back right.
    BackRight,
}

impl Quadrant {
    /// All quadrants in canonical order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::FrontLeft,
        Quadrant::FrontRight,
        Quadrant::BackLeft,
        Quadrant::BackRight,
    ];

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Quadrant::FrontLeft => "front_left",
            Quadrant::FrontRight => "front_right",
            Quadrant::BackLeft => "back_left",
            Quadrant::BackRight => "back_right",
        }
    }

    fn index(&self) -> usize {
        match self {
            Quadrant::FrontLeft => 0,
            Quadrant::FrontRight => 1,
            Quadrant::BackLeft => 2,
            Quadrant::BackRight => 3,
        }
    }
}

impl FromStr for Quadrant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Quadrant::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| Error::ConfigError(format!("Unknown quadrant '{}'", s)))
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side selector mapping to one, two or four quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Side {
    /// Front-left and back-left.
    Left,
    /// Front-right and back-right.
    Right,
    /// Front-left and front-right.
    Front,
    /// Back-left and back-right.
    Back,
    /// Every quadrant.
    #[default]
    All,
    /// A single quadrant.
    Single(Quadrant),
}

impl Side {
    /// Quadrants covered by this side, in canonical order.
    pub fn quadrants(&self) -> Vec<Quadrant> {
        use Quadrant::*;
        match self {
            Side::Left => vec![FrontLeft, BackLeft],
            Side::Right => vec![FrontRight, BackRight],
            Side::Front => vec![FrontLeft, FrontRight],
            Side::Back => vec![BackLeft, BackRight],
            Side::All => Quadrant::ALL.to_vec(),
            Side::Single(q) => vec![*q],
        }
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            "front" => Ok(Side::Front),
            "back" => Ok(Side::Back),
            "all" => Ok(Side::All),
            other => other.parse::<Quadrant>().map(Side::Single).map_err(|_| {
                Error::ConfigError(format!(
                    "Invalid value for side '{}', must be one of: left, right, front, back, all, \
                     front_left, front_right, back_left, back_right",
                    other
                ))
            }),
        }
    }
}

/// The four named quadrant regions of a multi-region sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadrantRegions {
    regions: [Region; 4],
}

impl QuadrantRegions {
    /// Builds the set from exactly four `(quadrant name, region)` pairs.
    pub fn from_named<I, S>(regions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Region)>,
        S: AsRef<str>,
    {
        let named: Vec<(S, Region)> = regions.into_iter().collect();
        if named.len() != 4 {
            return Err(Error::ConfigError(format!(
                "Exactly four sites (one for each quadrant) must be provided, got {}",
                named.len()
            )));
        }

        let mut slots: [Option<Region>; 4] = [None, None, None, None];
        for (name, region) in named {
            let quadrant: Quadrant = name.as_ref().parse()?;
            region.validate()?;
            let slot = &mut slots[quadrant.index()];
            if slot.is_some() {
                return Err(Error::ConfigError(format!(
                    "Quadrant '{}' provided more than once",
                    quadrant
                )));
            }
            *slot = Some(region);
        }

        // Four distinct quadrants were assigned above, so every slot is filled.
        let [a, b, c, d] = slots;
        match (a, b, c, d) {
            (Some(a), Some(b), Some(c), Some(d)) => Ok(Self {
                regions: [a, b, c, d],
            }),
            _ => Err(Error::Internal("quadrant slots left unfilled".into())),
        }
    }

    /// Region of the given quadrant.
    pub fn get(&self, quadrant: Quadrant) -> &Region {
        &self.regions[quadrant.index()]
    }
}
