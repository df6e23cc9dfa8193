//! Runtime configuration.

use std::path::PathBuf;

use stowage_common::{StowageError, StowagePaths, StowageResult};

use crate::archive::TarCopier;
use crate::storage::DirAllocator;
use crate::store::ContainerStore;

/// Runtime configuration options.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Paths for runtime data.
    pub paths: StowagePaths,
    /// Whether stowage runs without root privileges.
    pub rootless: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            paths: StowagePaths::new(),
            rootless: false,
        }
    }
}

impl RuntimeConfig {
    /// Create a rootless configuration rooted in the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns [`StowageError::Config`] if the home directory is unknown.
    pub fn rootless() -> StowageResult<Self> {
        let home = dirs::home_dir().ok_or_else(|| StowageError::Config {
            message: "cannot determine home directory for rootless mode".to_string(),
        })?;

        Ok(Self {
            paths: StowagePaths::with_root(home.join(".local/share/stowage")),
            rootless: true,
        })
    }

    /// Set the root directory.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths = StowagePaths::with_root(root);
        self
    }

    /// Container store under the configured root.
    #[must_use]
    pub fn container_store(&self) -> ContainerStore {
        ContainerStore::new(self.paths.clone())
    }

    /// Managed volume allocator under the configured root.
    #[must_use]
    pub fn allocator(&self) -> DirAllocator {
        DirAllocator::new(self.paths.clone())
    }

    /// Copier used to seed volumes.
    ///
    /// Ownership is only carried over when running as root outside of
    /// rootless mode.
    #[must_use]
    pub fn copier(&self) -> TarCopier {
        if self.rootless {
            TarCopier::new().preserve_ownerships(false)
        } else {
            TarCopier::new()
        }
    }
}
