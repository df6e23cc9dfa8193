//! Standard filesystem paths for stowage.

use std::path::PathBuf;

use once_cell::sync::Lazy;

/// Default root directory for stowage data.
pub static STOWAGE_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("STOWAGE_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/stowage"))
});

/// Name of the directory holding a managed volume's data.
const VOLUME_DATA_DIR: &str = "_data";

/// Standard paths used by stowage.
#[derive(Debug, Clone)]
pub struct StowagePaths {
    /// Root data directory (default: /var/lib/stowage).
    pub root: PathBuf,
}

impl StowagePaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory for container records.
    #[must_use]
    pub fn containers(&self) -> PathBuf {
        self.root.join("containers")
    }

    /// Directory for a specific container.
    #[must_use]
    pub fn container(&self, id: &str) -> PathBuf {
        self.containers().join(id)
    }

    /// Container record file.
    #[must_use]
    pub fn container_record(&self, id: &str) -> PathBuf {
        self.container(id).join("container.json")
    }

    /// Directory for managed volumes.
    #[must_use]
    pub fn volumes(&self) -> PathBuf {
        self.root.join("volumes")
    }

    /// Data directory of a managed volume.
    #[must_use]
    pub fn volume_data(&self, id: &str) -> PathBuf {
        self.volumes().join(id).join(VOLUME_DATA_DIR)
    }

    /// Create all necessary directories.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.containers())?;
        std::fs::create_dir_all(self.volumes())?;
        Ok(())
    }
}

impl Default for StowagePaths {
    fn default() -> Self {
        Self {
            root: STOWAGE_ROOT.clone(),
        }
    }
}
