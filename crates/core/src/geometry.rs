//! Geometry oracle consumed by the samplers, and a reference box implementation.
//!
//! Samplers treat every geometric question as a black-box predicate through
//! [`GeometryOracle`]. [`BoxOracle`] answers them for objects approximated by
//! their oriented bounding boxes, using the separating axis theorem for
//! intersection.

use nalgebra::{Point3, Vector3};

use crate::object::PlaceableObject;
use crate::region::RegionCorners;
use crate::transform::Pose;

/// Geometric predicates required by the samplers.
pub trait GeometryOracle {
    /// True if the object at `pose` lies fully inside the rectangle `region`.
    fn region_contains(
        &self,
        object: &dyn PlaceableObject,
        pose: &Pose,
        region: &RegionCorners,
    ) -> bool;

    /// True if the two oriented objects intersect. Touching is not intersection.
    fn intersects(
        &self,
        a: &dyn PlaceableObject,
        pose_a: &Pose,
        b: &dyn PlaceableObject,
        pose_b: &Pose,
    ) -> bool;

    /// True if at least `min_points` of the object's keypoints fall inside `region`.
    fn keypoints_in_region(
        &self,
        object: &dyn PlaceableObject,
        pose: &Pose,
        region: &RegionCorners,
        min_points: usize,
    ) -> bool;

    /// World-frame corners of the object's base rectangle.
    ///
    /// Order is origin, +x, +y, opposite, so the first three form [`RegionCorners`].
    fn bounding_corners(&self, object: &dyn PlaceableObject, pose: &Pose) -> [Point3<f64>; 4];
}

const SIGNS: [(f64, f64, f64); 8] = [
    (-1.0, -1.0, -1.0),
    (1.0, -1.0, -1.0),
    (-1.0, 1.0, -1.0),
    (1.0, 1.0, -1.0),
    (-1.0, -1.0, 1.0),
    (1.0, -1.0, 1.0),
    (-1.0, 1.0, 1.0),
    (1.0, 1.0, 1.0),
];

/// Gap under which two projections count as touching.
const TOUCH_TOLERANCE: f64 = 1e-9;

/// Oracle treating every object as its oriented bounding box.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxOracle;

impl BoxOracle {
    /// Creates a box oracle.
    pub fn new() -> Self {
        Self
    }

    /// The eight world-frame corners of the object's box.
    pub fn world_corners(object: &dyn PlaceableObject, pose: &Pose) -> [Point3<f64>; 8] {
        let h = object.half_extents();
        SIGNS.map(|(sx, sy, sz)| pose.transform_point(&Point3::new(sx * h.x, sy * h.y, sz * h.z)))
    }

    fn keypoints(object: &dyn PlaceableObject, pose: &Pose) -> Vec<Point3<f64>> {
        let mut points = Self::world_corners(object, pose).to_vec();
        points.push(Point3::from(pose.position));
        points
    }

    fn project(corners: &[Point3<f64>; 8], axis: &Vector3<f64>) -> (f64, f64) {
        corners.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
            let d = c.coords.dot(axis);
            (lo.min(d), hi.max(d))
        })
    }
}

impl GeometryOracle for BoxOracle {
    fn region_contains(
        &self,
        object: &dyn PlaceableObject,
        pose: &Pose,
        region: &RegionCorners,
    ) -> bool {
        Self::world_corners(object, pose)
            .iter()
            .all(|c| region.contains_xy(c))
    }

    fn intersects(
        &self,
        a: &dyn PlaceableObject,
        pose_a: &Pose,
        b: &dyn PlaceableObject,
        pose_b: &Pose,
    ) -> bool {
        let ca = Self::world_corners(a, pose_a);
        let cb = Self::world_corners(b, pose_b);

        let axes_a = [Vector3::x(), Vector3::y(), Vector3::z()].map(|v| pose_a.transform_vector(&v));
        let axes_b = [Vector3::x(), Vector3::y(), Vector3::z()].map(|v| pose_b.transform_vector(&v));

        let mut axes: Vec<Vector3<f64>> = Vec::with_capacity(15);
        axes.extend_from_slice(&axes_a);
        axes.extend_from_slice(&axes_b);
        for ea in &axes_a {
            for eb in &axes_b {
                let cross = ea.cross(eb);
                // Parallel edges give a degenerate axis already covered by the face normals.
                if cross.norm_squared() > 1e-12 {
                    axes.push(cross.normalize());
                }
            }
        }

        for axis in &axes {
            let (min_a, max_a) = Self::project(&ca, axis);
            let (min_b, max_b) = Self::project(&cb, axis);
            if max_a <= min_b + TOUCH_TOLERANCE || max_b <= min_a + TOUCH_TOLERANCE {
                return false;
            }
        }
        true
    }

    fn keypoints_in_region(
        &self,
        object: &dyn PlaceableObject,
        pose: &Pose,
        region: &RegionCorners,
        min_points: usize,
    ) -> bool {
        Self::keypoints(object, pose)
            .iter()
            .filter(|p| region.contains_xy(p))
            .count()
            >= min_points
    }

    fn bounding_corners(&self, object: &dyn PlaceableObject, pose: &Pose) -> [Point3<f64>; 4] {
        let c = Self::world_corners(object, pose);
        [c[0], c[1], c[2], c[3]]
    }
}
