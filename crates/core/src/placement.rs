//! Placement table threaded through a sampling pass.

use std::collections::HashMap;
use std::fmt;

use crate::object::ObjectHandle;
use crate::transform::Pose;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A resolved placement of one object.
#[derive(Clone)]
pub struct PlacedEntry {
    /// World-frame pose of the object's origin.
    pub pose: Pose,

    /// The placed object.
    pub object: ObjectHandle,

    /// Whether the object was parked out of the scene by a hide sampler.
    /// Hidden entries take no part in overlap checks.
    pub hidden: bool,
}

impl PlacedEntry {
    /// Creates a visible entry.
    pub fn new(pose: Pose, object: ObjectHandle) -> Self {
        Self {
            pose,
            object,
            hidden: false,
        }
    }

    /// Sets the hidden flag.
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Name of the placed object.
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Returns a serializable snapshot of this entry.
    pub fn record(&self) -> PlacementRecord {
        let p = self.pose.position;
        PlacementRecord {
            name: self.name().to_string(),
            position: [p.x, p.y, p.z],
            quat: self.pose.wxyz(),
            hidden: self.hidden,
        }
    }
}

impl fmt::Debug for PlacedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacedEntry")
            .field("name", &self.name())
            .field("pose", &self.pose)
            .field("hidden", &self.hidden)
            .finish()
    }
}

/// Plain-data view of a placement, with the quaternion in `(w, x, y, z)` order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacementRecord {
    /// Object name.
    pub name: String,
    /// World position.
    pub position: [f64; 3],
    /// World orientation, `[w, x, y, z]`.
    pub quat: [f64; 4],
    /// Whether the object was hidden.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hidden: bool,
}

/// Insertion-ordered mapping from object name to its placement.
///
/// A name appears at most once.
#[derive(Debug, Clone, Default)]
pub struct PlacementTable {
    entries: Vec<PlacedEntry>,
    index: HashMap<String, usize>,
}

impl PlacementTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if an entry for `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the entry for `name`.
    pub fn get(&self, name: &str) -> Option<&PlacedEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Returns the entry for `name`, or an error listing the valid names.
    pub fn resolve(&self, name: &str) -> Result<&PlacedEntry> {
        self.get(name).ok_or_else(|| Error::InvalidReference {
            name: name.to_string(),
            valid: self.names().map(str::to_string).collect(),
        })
    }

    /// Inserts an entry. Fails if the name is already present.
    pub fn insert(&mut self, entry: PlacedEntry) -> Result<()> {
        let name = entry.name().to_string();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateObject(name));
        }
        self.index.insert(name, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Merges every entry of `other`, in its order.
    pub fn extend(&mut self, other: PlacementTable) -> Result<()> {
        for entry in other.entries {
            self.insert(entry)?;
        }
        Ok(())
    }

    /// Returns a table holding only the entries whose name satisfies `keep`.
    pub fn filtered<F>(&self, mut keep: F) -> PlacementTable
    where
        F: FnMut(&str) -> bool,
    {
        let mut out = PlacementTable::new();
        for entry in self.entries.iter().filter(|e| keep(e.name())) {
            out.index.insert(entry.name().to_string(), out.entries.len());
            out.entries.push(entry.clone());
        }
        out
    }

    /// Marks every entry hidden.
    pub fn mark_hidden(&mut self) {
        for entry in &mut self.entries {
            entry.hidden = true;
        }
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PlacedEntry> {
        self.entries.iter()
    }

    /// Iterates names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(PlacedEntry::name)
    }

    /// Snapshots of every entry.
    pub fn records(&self) -> Vec<PlacementRecord> {
        self.entries.iter().map(PlacedEntry::record).collect()
    }
}

impl<'a> IntoIterator for &'a PlacementTable {
    type Item = &'a PlacedEntry;
    type IntoIter = std::slice::Iter<'a, PlacedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
