//! Placement references, call arguments, and spawn reservation.
//!
//! A [`Reference`] says what a sampler's region is anchored to. Resolving it
//! against the current [`PlacementTable`] yields the world-frame base offset,
//! and for spawn references a [`SpawnClaim`] on the owner's attachment point.

use nalgebra::Vector3;
use rand::Rng;
use u_placement_core::{Error, ObjectHandle, PlacementTable, Region, Result};

use crate::config::SpawnCommit;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What a sampler's region is placed relative to.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Reference {
    /// The sampler's own configured reference position.
    #[default]
    Origin,
    /// An already placed object, optionally stacking on its top.
    Object(String),
    /// A spawn site of an already placed object. `None` picks a random active site.
    Spawn {
        /// Name of the owning object.
        owner: String,
        /// Spawn index, or `None` for a random active one.
        #[cfg_attr(feature = "serde", serde(default))]
        index: Option<usize>,
    },
    /// An explicit world-frame point.
    Point(Vector3<f64>),
}

impl Reference {
    /// Reference to a placed object.
    pub fn object(name: impl Into<String>) -> Self {
        Reference::Object(name.into())
    }

    /// Reference to a specific spawn site.
    pub fn spawn(owner: impl Into<String>, index: usize) -> Self {
        Reference::Spawn {
            owner: owner.into(),
            index: Some(index),
        }
    }

    /// Reference to a random active spawn site.
    pub fn any_spawn(owner: impl Into<String>) -> Self {
        Reference::Spawn {
            owner: owner.into(),
            index: None,
        }
    }

    /// Reference to an explicit point.
    pub fn point(x: f64, y: f64, z: f64) -> Self {
        Reference::Point(Vector3::new(x, y, z))
    }

    /// Name of the referenced object, if the reference names one.
    pub fn anchor_name(&self) -> Option<&str> {
        match self {
            Reference::Object(name) => Some(name),
            Reference::Spawn { owner, .. } => Some(owner),
            Reference::Origin | Reference::Point(_) => None,
        }
    }
}

/// Arguments of one `sample` call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SampleArgs {
    /// Reference the region is anchored to.
    pub reference: Reference,
    /// Place the object's base on the reference's top (or the spawn's base).
    pub on_top: bool,
    /// Placed objects whose footprints must be avoided.
    pub excluded: Vec<String>,
}

impl Default for SampleArgs {
    fn default() -> Self {
        Self {
            reference: Reference::Origin,
            on_top: true,
            excluded: Vec::new(),
        }
    }
}

impl SampleArgs {
    /// Creates default arguments: own origin, on top, nothing excluded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reference.
    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = reference;
        self
    }

    /// Sets the on-top flag.
    pub fn with_on_top(mut self, on_top: bool) -> Self {
        self.on_top = on_top;
        self
    }

    /// Sets the excluded object names.
    pub fn with_excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Per-child arguments of a composite. Unset fields inherit the composite's call.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SampleOverrides {
    /// Reference override.
    pub reference: Option<Reference>,
    /// On-top override.
    pub on_top: Option<bool>,
    /// Exclusion override.
    pub excluded: Option<Vec<String>>,
}

impl SampleOverrides {
    /// Creates overrides that inherit everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the reference.
    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Overrides the on-top flag.
    pub fn with_on_top(mut self, on_top: bool) -> Self {
        self.on_top = Some(on_top);
        self
    }

    /// Overrides the excluded names.
    pub fn with_excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Resolves the child's arguments against the parent's.
    pub fn apply(&self, parent: &SampleArgs) -> SampleArgs {
        SampleArgs {
            reference: self
                .reference
                .clone()
                .unwrap_or_else(|| parent.reference.clone()),
            on_top: self.on_top.unwrap_or(parent.on_top),
            excluded: self
                .excluded
                .clone()
                .unwrap_or_else(|| parent.excluded.clone()),
        }
    }
}

/// A claim on one spawn site of a placed object.
#[derive(Debug, Clone)]
pub struct SpawnClaim {
    /// Name of the owning object.
    pub owner: String,
    /// Spawn index.
    pub index: usize,
    object: ObjectHandle,
    committed: bool,
}

impl SpawnClaim {
    /// Consumes the spawn site. Idempotent for an already committed claim.
    pub fn commit(&mut self) -> Result<()> {
        if self.committed {
            return Ok(());
        }
        let spawns = self.object.spawns().ok_or_else(|| {
            Error::Internal(format!("'{}' lost its spawn sites", self.owner))
        })?;
        spawns.reserve(self.index)?;
        self.committed = true;
        Ok(())
    }
}

/// A reference resolved against the placement table.
#[derive(Debug, Clone)]
pub struct ResolvedReference {
    /// World-frame base offset of the region.
    pub base: Vector3<f64>,
    /// Named object the placement is relative to.
    pub anchor: Option<String>,
    /// Spawn site claimed by this call.
    pub spawn: Option<SpawnClaim>,
}

impl ResolvedReference {
    /// Name of the object exempt from overlap checks, if any.
    pub fn spawn_owner(&self) -> Option<&str> {
        self.spawn.as_ref().map(|c| c.owner.as_str())
    }
}

/// Resolves `reference` against `table`.
///
/// Returns `Ok(None)` when a random spawn was requested but the owner has no
/// active site left.
pub fn resolve<R: Rng + ?Sized>(
    reference: &Reference,
    table: &PlacementTable,
    region: &Region,
    on_top: bool,
    commit: SpawnCommit,
    rng: &mut R,
) -> Result<Option<ResolvedReference>> {
    let resolved = match reference {
        Reference::Origin => ResolvedReference {
            base: region.reference_pos,
            anchor: None,
            spawn: None,
        },
        Reference::Object(name) => {
            let entry = table.resolve(name)?;
            let mut base = entry.pose.position;
            if on_top {
                base.z += entry.object.top_offset();
            }
            ResolvedReference {
                base,
                anchor: Some(name.clone()),
                spawn: None,
            }
        }
        Reference::Spawn { owner, index } => {
            let entry = table.resolve(owner)?;
            let spawns = entry.object.spawns().ok_or_else(|| {
                Error::ConfigError(format!(
                    "Invalid reference received. '{}' has no spawn sites",
                    owner
                ))
            })?;
            let index = match index {
                Some(i) => *i,
                None => match spawns.random_active(rng, true) {
                    Some(i) => i,
                    None => return Ok(None),
                },
            };
            let bottom = spawns.bottom_offset(index)?;
            if !spawns.get(index).is_some_and(|s| s.is_active()) {
                return Err(Error::ConfigError(format!(
                    "Spawn site {} of '{}' is already in use",
                    index, owner
                )));
            }

            let mut claim = SpawnClaim {
                owner: owner.clone(),
                index,
                object: entry.object.clone(),
                committed: false,
            };
            if commit == SpawnCommit::Eager {
                claim.commit()?;
            }

            ResolvedReference {
                base: entry.pose.position + entry.pose.transform_vector(&bottom),
                anchor: Some(owner.clone()),
                spawn: Some(claim),
            }
        }
        Reference::Point(p) => {
            if p.iter().any(|v| !v.is_finite()) {
                return Err(Error::ConfigError(format!(
                    "Invalid reference received. Should be a finite (x, y, z) point, got: {:?}",
                    p
                )));
            }
            ResolvedReference {
                base: *p,
                anchor: None,
                spawn: None,
            }
        }
    };
    Ok(Some(resolved))
}
