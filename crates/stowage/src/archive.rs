//! Copying directory trees into volumes.

use std::io::{Seek, SeekFrom};
use std::path::Path;

use stowage_common::StowageResult;

/// Copies the contents of one directory into another.
pub trait ArchiveCopier: Send + Sync {
    /// Copy everything below `source` into `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if either tree cannot be read or written.
    fn copy_tree(&self, source: &Path, destination: &Path) -> StowageResult<()>;
}

/// Copies trees through a tar stream, keeping modes and symlinks.
#[derive(Debug, Clone, Copy)]
pub struct TarCopier {
    preserve_ownerships: bool,
}

impl TarCopier {
    /// Create a copier that keeps ownership when running as root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            preserve_ownerships: rustix::process::geteuid().is_root(),
        }
    }

    /// Set whether uid and gid are carried over to the copy.
    #[must_use]
    pub const fn preserve_ownerships(mut self, preserve: bool) -> Self {
        self.preserve_ownerships = preserve;
        self
    }

    /// Whether uid and gid are carried over to the copy.
    #[must_use]
    pub const fn preserves_ownerships(&self) -> bool {
        self.preserve_ownerships
    }
}

impl Default for TarCopier {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveCopier for TarCopier {
    fn copy_tree(&self, source: &Path, destination: &Path) -> StowageResult<()> {
        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            preserve_ownerships = self.preserve_ownerships,
            "Copying tree"
        );

        let mut builder = tar::Builder::new(tempfile::tempfile()?);
        builder.follow_symlinks(false);
        builder.append_dir_all(".", source)?;
        let mut staging = builder.into_inner()?;
        staging.seek(SeekFrom::Start(0))?;

        let mut archive = tar::Archive::new(staging);
        archive.set_preserve_permissions(true);
        archive.set_preserve_mtime(true);
        archive.set_preserve_ownerships(self.preserve_ownerships);
        archive.set_overwrite(true);
        archive.unpack(destination)?;

        Ok(())
    }
}
