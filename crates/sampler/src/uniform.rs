//! Bounded-retry rejection sampling within one rectangular region.
//!
//! For each registered object, in registration order, the sampler draws a
//! planar offset inside the region and a rotation, then runs the enabled
//! checks in a fixed order: boundary containment, overlap with placed
//! objects, containment in the anchor's footprint, and avoidance of excluded
//! footprints. The first candidate passing every check is committed. When the
//! retry budget runs out for one object the whole call is abandoned.

use nalgebra::UnitQuaternion;
use rand::Rng;
use u_placement_core::{
    yaw, Error, GeometryOracle, ObjectHandle, PlaceableObject, PlacedEntry, PlacementTable, Pose,
    Region, RegionCorners, Result,
};

use crate::config::{uniform, SamplerConfig};
use crate::reference::{resolve, ResolvedReference, SampleArgs};
use crate::sampler::{check_unique, Exhaustion, SampleContext, SampleOutcome};

/// Why a candidate pose was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    OutOfBounds,
    Overlap,
    OutsideAnchor,
    InsideExcluded,
}

/// Samples poses for its objects uniformly within a region.
#[derive(Debug, Clone)]
pub struct UniformRegionSampler {
    name: String,
    objects: Vec<ObjectHandle>,
    region: Region,
    config: SamplerConfig,
}

impl UniformRegionSampler {
    /// Creates a sampler. Fails on an invalid region or config, or repeated objects.
    pub fn new(
        name: impl Into<String>,
        objects: Vec<ObjectHandle>,
        region: Region,
        config: SamplerConfig,
    ) -> Result<Self> {
        region.validate()?;
        config.validate()?;
        check_unique(&[], &objects)?;
        Ok(Self {
            name: name.into(),
            objects,
            region,
            config,
        })
    }

    /// Sampler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered objects, in placement order.
    pub fn objects(&self) -> &[ObjectHandle] {
        &self.objects
    }

    /// Names of the registered objects.
    pub fn object_names(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.name().to_string()).collect()
    }

    /// Sampling region.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Placement policy.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Registers more objects. Fails if any is already registered.
    pub fn add_objects(&mut self, objects: Vec<ObjectHandle>) -> Result<()> {
        check_unique(&self.object_names(), &objects)?;
        self.objects.extend(objects);
        Ok(())
    }

    /// Clears the registered objects.
    pub fn reset(&mut self) {
        self.objects.clear();
    }

    /// Places every object or reports the first one that could not be placed.
    ///
    /// The returned table holds only this call's new entries. Reference and
    /// exclusion names are resolved against `table`.
    pub fn attempt<R: Rng + ?Sized>(
        &self,
        table: &PlacementTable,
        args: &SampleArgs,
        ctx: &mut SampleContext<'_, R>,
    ) -> Result<SampleOutcome> {
        if let Some(obj) = self.objects.iter().find(|o| table.contains(o.name())) {
            return Err(Error::DuplicateObject(obj.name().to_string()));
        }

        let excluded = self.excluded_footprints(table, args, ctx.oracle)?;

        let resolved = resolve(
            &args.reference,
            table,
            &self.region,
            args.on_top,
            self.config.spawn_commit,
            &mut *ctx.rng,
        )?;
        let mut resolved = match resolved {
            Some(r) => r,
            None => {
                return Ok(match self.objects.first() {
                    Some(obj) => {
                        log::debug!(
                            "Sampler '{}': no free spawn site on {:?}",
                            self.name,
                            args.reference.anchor_name()
                        );
                        SampleOutcome::Exhausted(Exhaustion {
                            object: obj.name().to_string(),
                            sampler: self.name.clone(),
                            attempts: 0,
                        })
                    }
                    None => SampleOutcome::Placed(PlacementTable::new()),
                });
            }
        };

        let anchor = match (&resolved.anchor, self.config.ensure_object_in_ref_region) {
            (Some(name), true) => {
                let entry = table.resolve(name)?;
                Some(RegionCorners::from_bounding(
                    &ctx.oracle.bounding_corners(entry.object.as_ref(), &entry.pose),
                ))
            }
            _ => None,
        };

        let corners = self.region.corners(&resolved.base);
        let frame = yaw(self.region.reference_rot);

        log::debug!(
            "Sampler '{}': placing {} object(s) around ({:.3}, {:.3}, {:.3})",
            self.name,
            self.objects.len(),
            resolved.base.x,
            resolved.base.y,
            resolved.base.z
        );

        let mut delta = PlacementTable::new();
        for obj in &self.objects {
            let init = obj.init_orientation().unwrap_or_else(UnitQuaternion::identity);
            let mut placed = None;

            for attempt in 0..self.config.num_attempts {
                let pose = self.draw_pose(
                    obj.as_ref(),
                    &resolved,
                    args.on_top,
                    &frame,
                    &init,
                    &mut *ctx.rng,
                );
                match self.check(
                    obj.as_ref(),
                    &pose,
                    &corners,
                    table,
                    &delta,
                    &resolved,
                    anchor.as_ref(),
                    &excluded,
                    ctx.oracle,
                ) {
                    Ok(()) => {
                        log::debug!(
                            "Sampler '{}': placed '{}' after {} attempt(s)",
                            self.name,
                            obj.name(),
                            attempt + 1
                        );
                        placed = Some(pose);
                        break;
                    }
                    Err(reason) => {
                        log::trace!(
                            "Sampler '{}': attempt {} for '{}' rejected: {:?}",
                            self.name,
                            attempt,
                            obj.name(),
                            reason
                        );
                    }
                }
            }

            match placed {
                Some(pose) => delta.insert(PlacedEntry::new(pose, obj.clone()))?,
                None => {
                    log::debug!(
                        "Sampler '{}': gave up on '{}' after {} attempts",
                        self.name,
                        obj.name(),
                        self.config.num_attempts
                    );
                    return Ok(SampleOutcome::Exhausted(Exhaustion {
                        object: obj.name().to_string(),
                        sampler: self.name.clone(),
                        attempts: self.config.num_attempts,
                    }));
                }
            }
        }

        if let Some(claim) = resolved.spawn.as_mut() {
            claim.commit()?;
        }
        Ok(SampleOutcome::Placed(delta))
    }

    /// Places every object, failing with `PlacementExhausted` on the first one
    /// that cannot be placed.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        table: &PlacementTable,
        args: &SampleArgs,
        ctx: &mut SampleContext<'_, R>,
    ) -> Result<PlacementTable> {
        self.attempt(table, args, ctx)?.into_result()
    }

    fn excluded_footprints(
        &self,
        table: &PlacementTable,
        args: &SampleArgs,
        oracle: &dyn GeometryOracle,
    ) -> Result<Vec<RegionCorners>> {
        let mut footprints = Vec::with_capacity(args.excluded.len());
        for name in &args.excluded {
            let entry = table.resolve(name)?;
            footprints.push(RegionCorners::from_bounding(
                &oracle.bounding_corners(entry.object.as_ref(), &entry.pose),
            ));
        }
        Ok(footprints)
    }

    fn draw_pose<R: Rng + ?Sized>(
        &self,
        obj: &dyn PlaceableObject,
        resolved: &ResolvedReference,
        on_top: bool,
        frame: &UnitQuaternion<f64>,
        init: &UnitQuaternion<f64>,
        rng: &mut R,
    ) -> Pose {
        let (x0, x1) = self.region.x_range;
        let (y0, y1) = self.region.y_range;
        let x = uniform(rng, x0, x1);
        let y = uniform(rng, y0, y1);
        let rotation = self.config.sample_rotation(rng);

        let mut position = self.region.local_to_world(x, y, &resolved.base).coords;
        position.z += self.config.z_offset;
        if on_top {
            position.z -= obj.bottom_offset();
        }

        Pose::new(position, frame * (rotation * init))
    }

    #[allow(clippy::too_many_arguments)]
    fn check(
        &self,
        obj: &dyn PlaceableObject,
        pose: &Pose,
        corners: &RegionCorners,
        table: &PlacementTable,
        delta: &PlacementTable,
        resolved: &ResolvedReference,
        anchor: Option<&RegionCorners>,
        excluded: &[RegionCorners],
        oracle: &dyn GeometryOracle,
    ) -> std::result::Result<(), Rejection> {
        if self.config.ensure_object_boundary_in_range
            && !oracle.region_contains(obj, pose, corners)
        {
            return Err(Rejection::OutOfBounds);
        }

        if self.config.ensure_valid_placement {
            let owner = resolved.spawn_owner();
            let collides = table
                .iter()
                .chain(delta.iter())
                .filter(|e| !e.hidden && Some(e.name()) != owner)
                .any(|e| oracle.intersects(obj, pose, e.object.as_ref(), &e.pose));
            if collides {
                return Err(Rejection::Overlap);
            }
        }

        if let Some(anchor) = anchor {
            if !oracle.keypoints_in_region(obj, pose, anchor, 3) {
                return Err(Rejection::OutsideAnchor);
            }
        }

        if self.config.ensure_object_out_of_ref_region && !excluded.is_empty() {
            let footprint = RegionCorners::from_bounding(&oracle.bounding_corners(obj, pose));
            let touches = excluded.iter().any(|region| {
                oracle.keypoints_in_region(obj, pose, region, 1) || footprint.overlaps_xy(region)
            });
            if touches {
                return Err(Rejection::InsideExcluded);
            }
        }

        Ok(())
    }
}
