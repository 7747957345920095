//! Ordered pipeline of child samplers.
//!
//! Children run in registration order against a working copy of the caller's
//! table, so every child sees what earlier children placed. A child registered
//! as optional may fail without aborting the pipeline; a mandatory child's
//! exhaustion ends the call. The returned table holds only objects placed by
//! the children, never entries supplied as context.

use std::collections::HashSet;

use rand::Rng;
use u_placement_core::{Error, ObjectHandle, PlacementTable, Region, Result};

use crate::config::{RotationPolicy, SamplerConfig};
use crate::reference::{Reference, SampleArgs, SampleOverrides};
use crate::sampler::{check_unique, SampleContext, SampleOutcome, Sampler};
use crate::uniform::UniformRegionSampler;

/// Planar extent of the parking area used by [`SequentialCompositeSampler::hide`].
const HIDE_RANGE: (f64, f64) = (-20.0, -10.0);

/// Height of the parking area used by [`SequentialCompositeSampler::hide`].
const HIDE_Z_OFFSET: f64 = 10.0;

#[derive(Debug)]
struct ChildSampler {
    sampler: Sampler,
    overrides: SampleOverrides,
    optional: bool,
    hidden: bool,
}

/// Runs named child samplers in order, threading the placement table.
#[derive(Debug)]
pub struct SequentialCompositeSampler {
    name: String,
    children: Vec<ChildSampler>,
    hide_count: usize,
}

impl SequentialCompositeSampler {
    /// Creates an empty composite.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            hide_count: 0,
        }
    }

    /// Composite name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of child samplers.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if there are no child samplers.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child sampler names, in execution order.
    pub fn sampler_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|c| c.sampler.name())
    }

    /// Returns the child sampler named `name`.
    pub fn sampler(&self, name: &str) -> Option<&Sampler> {
        self.children
            .iter()
            .find(|c| c.sampler.name() == name)
            .map(|c| &c.sampler)
    }

    /// Names of every object owned by the children, transitively.
    pub fn object_names(&self) -> Vec<String> {
        self.children
            .iter()
            .flat_map(|c| c.sampler.object_names())
            .collect()
    }

    /// Appends a child sampler.
    ///
    /// Fails if a child with the same name exists or if the child owns an
    /// object already registered in this composite.
    pub fn append_sampler(
        &mut self,
        sampler: impl Into<Sampler>,
        overrides: SampleOverrides,
        optional: bool,
    ) -> Result<()> {
        self.push(sampler.into(), overrides, optional, false)
    }

    /// Registers more objects with the child named `name`.
    pub fn add_objects_to_sampler(&mut self, name: &str, objects: Vec<ObjectHandle>) -> Result<()> {
        check_unique(&self.object_names(), &objects)?;
        let child = self
            .children
            .iter_mut()
            .find(|c| c.sampler.name() == name)
            .ok_or_else(|| {
                Error::ConfigError(format!(
                    "No sampler named '{}' in composite '{}'",
                    name, self.name
                ))
            })?;
        child.sampler.add_objects(objects)
    }

    /// Objects must be registered through [`Self::add_objects_to_sampler`].
    pub fn add_objects(&mut self, _objects: Vec<ObjectHandle>) -> Result<()> {
        Err(Error::ConfigError(format!(
            "Composite '{}' has no objects of its own; use add_objects_to_sampler",
            self.name
        )))
    }

    /// Appends a child that parks `objects` far outside the scene.
    ///
    /// The parked entries are flagged hidden and ignored by every later
    /// overlap check.
    pub fn hide(&mut self, objects: Vec<ObjectHandle>) -> Result<()> {
        let name = format!("{}_hide_{}", self.name, self.hide_count);
        let sampler = UniformRegionSampler::new(
            name,
            objects,
            Region::new(HIDE_RANGE, HIDE_RANGE),
            SamplerConfig::new()
                .with_rotation(RotationPolicy::Fixed(0.0))
                .with_boundary_check(false)
                .with_overlap_check(false)
                .with_z_offset(HIDE_Z_OFFSET),
        )?;
        let overrides = SampleOverrides::new()
            .with_reference(Reference::Origin)
            .with_on_top(false)
            .with_excluded(Vec::<String>::new());
        self.push(sampler.into(), overrides, false, true)?;
        self.hide_count += 1;
        Ok(())
    }

    /// Clears the objects of every descendant. Children stay registered.
    pub fn reset(&mut self) {
        for child in &mut self.children {
            child.sampler.reset();
        }
    }

    /// Runs every child in order.
    pub fn attempt<R: Rng + ?Sized>(
        &self,
        table: &PlacementTable,
        args: &SampleArgs,
        ctx: &mut SampleContext<'_, R>,
    ) -> Result<SampleOutcome> {
        let mut working = table.clone();
        let mut owned: HashSet<String> = HashSet::new();

        for child in &self.children {
            let child_args = child.overrides.apply(args);
            match child.sampler.attempt(&working, &child_args, ctx)? {
                SampleOutcome::Placed(mut delta) => {
                    if child.hidden {
                        delta.mark_hidden();
                    }
                    owned.extend(delta.names().map(str::to_string));
                    working.extend(delta)?;
                }
                SampleOutcome::Exhausted(e) if child.optional => {
                    log::warn!(
                        "Composite '{}': optional sampler '{}' skipped, could not place '{}' after {} attempts",
                        self.name,
                        child.sampler.name(),
                        e.object,
                        e.attempts
                    );
                }
                SampleOutcome::Exhausted(e) => return Ok(SampleOutcome::Exhausted(e)),
            }
        }

        Ok(SampleOutcome::Placed(
            working.filtered(|name| owned.contains(name)),
        ))
    }

    /// Runs every child in order, failing on the first mandatory exhaustion.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        table: &PlacementTable,
        args: &SampleArgs,
        ctx: &mut SampleContext<'_, R>,
    ) -> Result<PlacementTable> {
        self.attempt(table, args, ctx)?.into_result()
    }

    fn push(
        &mut self,
        sampler: Sampler,
        overrides: SampleOverrides,
        optional: bool,
        hidden: bool,
    ) -> Result<()> {
        if self.sampler(sampler.name()).is_some() {
            return Err(Error::ConfigError(format!(
                "Sampler '{}' already registered in composite '{}'",
                sampler.name(),
                self.name
            )));
        }
        let registered = self.object_names();
        if let Some(dup) = sampler
            .object_names()
            .into_iter()
            .find(|n| registered.contains(n))
        {
            return Err(Error::DuplicateObject(dup));
        }
        self.children.push(ChildSampler {
            sampler,
            overrides,
            optional,
            hidden,
        });
        Ok(())
    }
}
