//! Placeable objects and their spawn sites.
//!
//! Samplers never own the objects they place. They hold [`ObjectHandle`]s that
//! are shared with the caller, and the only state they mutate through a handle
//! is the active flag of a [`SpawnSite`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nalgebra::{UnitQuaternion, Vector3};
use rand::Rng;

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shared, non-owning handle to a placeable object.
pub type ObjectHandle = Arc<dyn PlaceableObject>;

/// Capability required from every object a sampler can place.
pub trait PlaceableObject: fmt::Debug + Send + Sync {
    /// Unique name, stable for the lifetime of a pass.
    fn name(&self) -> &str;

    /// Half extents of the local bounding box, centered on the object origin.
    fn half_extents(&self) -> Vector3<f64>;

    /// Height of the object's base relative to its origin (usually negative).
    fn bottom_offset(&self) -> f64 {
        -self.half_extents().z
    }

    /// Height of the object's top relative to its origin.
    fn top_offset(&self) -> f64 {
        self.half_extents().z
    }

    /// Intrinsic orientation composed into every sampled orientation.
    fn init_orientation(&self) -> Option<UnitQuaternion<f64>> {
        None
    }

    /// Secondary attachment points, if the object has any.
    fn spawns(&self) -> Option<&SpawnSites> {
        None
    }
}

/// A secondary attachment point (e.g. one shelf level) owned by an object.
#[derive(Debug)]
pub struct SpawnSite {
    offset: Vector3<f64>,
    half_height: f64,
    disabled: bool,
    active: AtomicBool,
}

impl SpawnSite {
    /// Creates an active spawn site at a local offset from its owner's origin.
    pub fn new(offset: Vector3<f64>) -> Self {
        Self {
            offset,
            half_height: 0.0,
            disabled: false,
            active: AtomicBool::new(true),
        }
    }

    /// Sets the half height of the site volume; its base is `offset.z - half_height`.
    pub fn with_half_height(mut self, half_height: f64) -> Self {
        self.half_height = half_height;
        self
    }

    /// Permanently excludes the site from random selection.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Local offset of the site center.
    pub fn offset(&self) -> &Vector3<f64> {
        &self.offset
    }

    /// Local offset of the site's base, where a hosted object's bottom lands.
    pub fn bottom_offset(&self) -> Vector3<f64> {
        self.offset - Vector3::new(0.0, 0.0, self.half_height)
    }

    /// Returns whether the site is excluded from random selection.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns whether the site can still host an object in this pass.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

impl Clone for SpawnSite {
    fn clone(&self) -> Self {
        Self {
            offset: self.offset,
            half_height: self.half_height,
            disabled: self.disabled,
            active: AtomicBool::new(self.is_active()),
        }
    }
}

/// Ordered spawn sites of one object.
#[derive(Debug, Clone, Default)]
pub struct SpawnSites {
    sites: Vec<SpawnSite>,
}

impl SpawnSites {
    /// Creates a collection from sites in index order.
    pub fn new(sites: Vec<SpawnSite>) -> Self {
        Self { sites }
    }

    /// Number of sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Returns true if there are no sites.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Returns the site at `index`.
    pub fn get(&self, index: usize) -> Option<&SpawnSite> {
        self.sites.get(index)
    }

    /// Iterates sites in index order.
    pub fn iter(&self) -> impl Iterator<Item = &SpawnSite> {
        self.sites.iter()
    }

    /// Indices of sites that are still active.
    pub fn active_indices(&self, exclude_disabled: bool) -> Vec<usize> {
        self.sites
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_active() && !(exclude_disabled && s.is_disabled()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Picks an active site uniformly at random.
    pub fn random_active<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        exclude_disabled: bool,
    ) -> Option<usize> {
        let candidates = self.active_indices(exclude_disabled);
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.gen_range(0..candidates.len())])
    }

    /// Sets the active flag of a site.
    pub fn set_active(&self, index: usize, active: bool) -> Result<()> {
        let site = self.site(index)?;
        site.active.store(active, Ordering::Relaxed);
        Ok(())
    }

    /// Consumes a site so no later placement in the pass can use it.
    ///
    /// Fails if the site was already consumed.
    pub fn reserve(&self, index: usize) -> Result<()> {
        let site = self.site(index)?;
        site.active
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Relaxed)
            .map(|_| ())
            .map_err(|_| Error::ConfigError(format!("Spawn site {} is already in use", index)))
    }

    /// Reactivates every site. Call between passes, never within one.
    pub fn reactivate_all(&self) {
        for site in &self.sites {
            site.active.store(true, Ordering::Relaxed);
        }
    }

    /// Local base offset of the site at `index`.
    pub fn bottom_offset(&self, index: usize) -> Result<Vector3<f64>> {
        Ok(self.site(index)?.bottom_offset())
    }

    fn site(&self, index: usize) -> Result<&SpawnSite> {
        self.sites.get(index).ok_or_else(|| {
            Error::ConfigError(format!(
                "Spawn index {} out of range ({} sites)",
                index,
                self.sites.len()
            ))
        })
    }
}

/// A box-shaped placeable object.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxObject {
    name: String,
    half_extents: Vector3<f64>,
    init_orientation: Option<UnitQuaternion<f64>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    spawns: Option<SpawnSites>,
}

impl BoxObject {
    /// Creates a box with the given full dimensions (width, depth, height).
    pub fn new(name: impl Into<String>, width: f64, depth: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            half_extents: Vector3::new(width / 2.0, depth / 2.0, height / 2.0),
            init_orientation: None,
            spawns: None,
        }
    }

    /// Sets the intrinsic orientation.
    pub fn with_init_orientation(mut self, orientation: UnitQuaternion<f64>) -> Self {
        self.init_orientation = Some(orientation);
        self
    }

    /// Appends a spawn site.
    pub fn with_spawn(mut self, site: SpawnSite) -> Self {
        self.spawns
            .get_or_insert_with(SpawnSites::default)
            .sites
            .push(site);
        self
    }

    /// Wraps the object in a shared handle.
    pub fn into_handle(self) -> ObjectHandle {
        Arc::new(self)
    }

    /// Returns the full dimensions (width, depth, height).
    pub fn dimensions(&self) -> Vector3<f64> {
        self.half_extents * 2.0
    }

    /// Validates the object dimensions.
    pub fn validate(&self) -> Result<()> {
        if self.half_extents.iter().any(|&h| h <= 0.0) {
            return Err(Error::ConfigError(format!(
                "All dimensions for '{}' must be positive",
                self.name
            )));
        }
        Ok(())
    }
}

impl PlaceableObject for BoxObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn half_extents(&self) -> Vector3<f64> {
        self.half_extents
    }

    fn init_orientation(&self) -> Option<UnitQuaternion<f64>> {
        self.init_orientation
    }

    fn spawns(&self) -> Option<&SpawnSites> {
        self.spawns.as_ref()
    }
}
