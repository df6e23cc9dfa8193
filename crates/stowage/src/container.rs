//! Container records and lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stowage_common::StowageResult;

use crate::volume::VolumeSet;

/// Default location of the container's resolv.conf inside its data dir.
const RESOLV_CONF: &str = "resolv.conf";

/// Everything volume resolution needs to know about a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    /// Container ID.
    pub id: String,
    /// Root filesystem of the container on the host.
    pub rootfs: PathBuf,
    /// Resolved volumes, persisted for the container's lifetime.
    #[serde(default)]
    pub volumes: VolumeSet,
    /// `--volumes-from` references.
    #[serde(default)]
    pub volumes_from: Vec<String>,
    /// Bind-mount specifications.
    #[serde(default)]
    pub binds: Vec<String>,
    /// Volumes declared by the image.
    #[serde(default)]
    pub image_volumes: Vec<PathBuf>,
    /// Host file mounted at /etc/resolv.conf.
    pub resolv_conf_path: PathBuf,
    /// Host file mounted at /etc/hostname.
    #[serde(default)]
    pub hostname_path: Option<PathBuf>,
    /// Host file mounted at /etc/hosts.
    #[serde(default)]
    pub hosts_path: Option<PathBuf>,
}

impl ContainerRecord {
    /// Create a record with no volumes, using `<data_dir>/resolv.conf`.
    pub fn new(id: impl Into<String>, rootfs: impl Into<PathBuf>, data_dir: &Path) -> Self {
        Self {
            id: id.into(),
            rootfs: rootfs.into(),
            volumes: VolumeSet::new(),
            volumes_from: Vec::new(),
            binds: Vec::new(),
            image_volumes: Vec::new(),
            resolv_conf_path: data_dir.join(RESOLV_CONF),
            hostname_path: None,
            hosts_path: None,
        }
    }
}

/// Resolves container references.
pub trait ContainerLookup: Send + Sync {
    /// Fetch a container by ID, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the container exists but cannot be read.
    fn get(&self, id: &str) -> StowageResult<Option<ContainerRecord>>;
}

impl ContainerLookup for HashMap<String, ContainerRecord> {
    fn get(&self, id: &str) -> StowageResult<Option<ContainerRecord>> {
        Ok(HashMap::get(self, id).cloned())
    }
}
