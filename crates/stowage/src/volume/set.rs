//! The resolved volume set of a container.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::entity::{Volume, VolumeSource};

/// A resolved mount point as persisted in container state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    /// Real host path backing the mount point.
    pub host_path: PathBuf,
    /// Whether the container may write through the mount.
    pub read_write: bool,
    /// Whether the host path was supplied by the user.
    #[serde(default)]
    pub bind_mount: bool,
}

/// One initialized volume, ready to be folded into a [`VolumeSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeDelta {
    /// Cleaned in-container path.
    pub container_path: PathBuf,
    /// Resolved record for the path.
    pub record: VolumeRecord,
}

/// Mapping from in-container path to resolved host path and mode.
///
/// Populated once when a container is created and consulted on every
/// start. A path is never overwritten once present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeSet {
    volumes: BTreeMap<PathBuf, VolumeRecord>,
}

impl VolumeSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mount points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether the set has no mount points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Whether `container_path` is already claimed.
    #[must_use]
    pub fn contains(&self, container_path: &Path) -> bool {
        self.volumes.contains_key(container_path)
    }

    /// Record for `container_path`.
    #[must_use]
    pub fn get(&self, container_path: &Path) -> Option<&VolumeRecord> {
        self.volumes.get(container_path)
    }

    /// Host path backing `container_path`.
    #[must_use]
    pub fn host_path(&self, container_path: &Path) -> Option<&Path> {
        self.get(container_path).map(|r| r.host_path.as_path())
    }

    /// Recorded mode of `container_path`.
    #[must_use]
    pub fn is_read_write(&self, container_path: &Path) -> Option<bool> {
        self.get(container_path).map(|r| r.read_write)
    }

    /// Fold a delta into the set. The first writer of a path wins; returns
    /// `false` when the path was already present.
    pub fn apply(&mut self, delta: VolumeDelta) -> bool {
        if self.volumes.contains_key(&delta.container_path) {
            return false;
        }
        self.volumes.insert(delta.container_path, delta.record);
        true
    }

    /// Iterate over `(container_path, record)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &VolumeRecord)> {
        self.volumes.iter().map(|(path, record)| (path.as_path(), record))
    }

    /// Express the set as volumes inherited by another container.
    #[must_use]
    pub fn to_inherited(&self, from_container: &str) -> Vec<Volume> {
        self.volumes
            .iter()
            .map(|(path, record)| Volume {
                container_path: path.clone(),
                read_write: record.read_write,
                source: VolumeSource::Inherited {
                    from_container: from_container.to_string(),
                    host_path: record.host_path.clone(),
                    bind_mount: record.bind_mount,
                },
            })
            .collect()
    }
}
