//! The volume entity and its initializer.
//!
//! Initializing a volume resolves where its data lives on the host,
//! prepares the mount point inside the container root and, for managed
//! read-write volumes, seeds content and ownership once.

use std::fs::{self, DirBuilder, OpenOptions};
use std::io;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use stowage_common::{StowageError, StowageResult};

use super::path::{clean_container_path, resolve_host_symlinks, safe_join};
use super::set::{VolumeDelta, VolumeRecord, VolumeSet};
use crate::archive::ArchiveCopier;
use crate::storage::StorageAllocator;

/// Where a volume's data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeSource {
    /// A host directory or file shared into the container.
    BindMount {
        /// Absolute host path supplied by the user.
        host_path: PathBuf,
    },
    /// Storage allocated and owned by the daemon.
    Managed,
    /// A volume resolved for another container.
    Inherited {
        /// Container the volume was taken from.
        from_container: String,
        /// Host path recorded by that container.
        host_path: PathBuf,
        /// Whether the source container had it as a bind mount.
        bind_mount: bool,
    },
}

/// One mount point requested for a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    /// Path inside the container.
    pub container_path: PathBuf,
    /// Whether the container may write through the mount.
    pub read_write: bool,
    /// Provenance of the volume's data.
    pub source: VolumeSource,
}

impl Volume {
    /// A read-write daemon-managed volume.
    pub fn managed(container_path: impl Into<PathBuf>) -> Self {
        Self {
            container_path: container_path.into(),
            read_write: true,
            source: VolumeSource::Managed,
        }
    }

    /// A bind mount of `host_path`.
    pub fn bind(
        host_path: impl Into<PathBuf>,
        container_path: impl Into<PathBuf>,
        read_write: bool,
    ) -> Self {
        Self {
            container_path: container_path.into(),
            read_write,
            source: VolumeSource::BindMount {
                host_path: host_path.into(),
            },
        }
    }

    /// Override the access mode.
    #[must_use]
    pub fn with_read_write(mut self, read_write: bool) -> Self {
        self.read_write = read_write;
        self
    }

    /// Host path, if already known.
    #[must_use]
    pub fn host_path(&self) -> Option<&Path> {
        match &self.source {
            VolumeSource::BindMount { host_path } | VolumeSource::Inherited { host_path, .. } => {
                Some(host_path.as_path())
            }
            VolumeSource::Managed => None,
        }
    }

    /// Whether the data comes from a user-supplied host path.
    #[must_use]
    pub const fn is_bind_mount(&self) -> bool {
        match &self.source {
            VolumeSource::BindMount { .. } => true,
            VolumeSource::Managed => false,
            VolumeSource::Inherited { bind_mount, .. } => *bind_mount,
        }
    }
}

/// Initializes volumes against one container's root filesystem.
pub struct VolumeInitializer<'a> {
    rootfs: &'a Path,
    allocator: &'a dyn StorageAllocator,
    copier: &'a dyn ArchiveCopier,
}

impl<'a> VolumeInitializer<'a> {
    /// Create an initializer for the container rooted at `rootfs`.
    pub fn new(
        rootfs: &'a Path,
        allocator: &'a dyn StorageAllocator,
        copier: &'a dyn ArchiveCopier,
    ) -> Self {
        Self {
            rootfs,
            allocator,
            copier,
        }
    }

    /// Initialize `volume` for the container.
    ///
    /// Returns `None` when the container path is already present in
    /// `existing`; nothing is touched in that case. Otherwise the returned
    /// delta describes the resolved mount point.
    ///
    /// Side effects on disk (allocated storage, created mount points) are
    /// not rolled back when a later step fails.
    ///
    /// # Errors
    ///
    /// Fails with [`StowageError::StorageAllocation`] when managed storage
    /// cannot be allocated, [`StowageError::Io`] when the host path is
    /// missing, [`StowageError::PathEscape`] when the mount point leaves the
    /// container root and [`StowageError::Permission`] when ownership
    /// cannot be propagated.
    pub fn initialize(
        &self,
        volume: Volume,
        existing: &VolumeSet,
    ) -> StowageResult<Option<VolumeDelta>> {
        let container_path = clean_container_path(&volume.container_path);

        if existing.contains(&container_path) {
            tracing::debug!(
                container_path = %container_path.display(),
                "Volume already initialized, skipping"
            );
            return Ok(None);
        }

        let host_path = match volume.host_path() {
            Some(host_path) => host_path.to_path_buf(),
            None => self.allocate()?,
        };
        let host_path = resolve_host_symlinks(&host_path)?;

        let mount_point = safe_join(self.rootfs, &container_path)?;
        let bind_mount = volume.is_bind_mount();

        let source_is_dir = fs::metadata(&host_path)?.is_dir();
        create_if_not_exists(&mount_point, source_is_dir)?;

        if volume.read_write && !bind_mount {
            self.seed_contents(&host_path, &mount_point)?;
            copy_ownership(&host_path, &mount_point)?;
        }

        tracing::debug!(
            container_path = %container_path.display(),
            host_path = %host_path.display(),
            read_write = volume.read_write,
            bind_mount,
            "Volume initialized"
        );

        Ok(Some(VolumeDelta {
            container_path,
            record: VolumeRecord {
                host_path,
                read_write: volume.read_write,
                bind_mount,
            },
        }))
    }

    fn allocate(&self) -> StowageResult<PathBuf> {
        let id = self
            .allocator
            .allocate()
            .map_err(|e| allocation_error("failed to create volume", e))?;

        let host_path = self.allocator.locate(&id).map_err(|e| {
            allocation_error(&format!("failed to get volume rootfs {id}"), e)
        })?;

        tracing::info!(volume = %id, path = %host_path.display(), "Allocated volume storage");
        Ok(host_path)
    }

    /// Copy the backing storage into an empty mount point, once.
    fn seed_contents(&self, storage: &Path, mount_point: &Path) -> StowageResult<()> {
        if !storage.is_dir() || !mount_point.is_dir() {
            return Ok(());
        }

        if is_empty_dir(storage)? || !is_empty_dir(mount_point)? {
            return Ok(());
        }

        tracing::debug!(
            from = %storage.display(),
            to = %mount_point.display(),
            "Seeding volume contents"
        );
        self.copier.copy_tree(storage, mount_point)
    }
}

fn allocation_error(context: &str, err: StowageError) -> StowageError {
    match err {
        StowageError::StorageAllocation { message } => StowageError::StorageAllocation {
            message: format!("{context}: {message}"),
        },
        other => StowageError::StorageAllocation {
            message: format!("{context}: {other}"),
        },
    }
}

fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Create the mount point as a directory or an empty file, mirroring the
/// source. Existing nodes are left alone.
fn create_if_not_exists(destination: &Path, is_dir: bool) -> StowageResult<()> {
    match fs::symlink_metadata(destination) {
        Ok(_) => return Ok(()),
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
        Err(_) => {}
    }

    if is_dir {
        DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(destination)?;
        return Ok(());
    }

    if let Some(parent) = destination.parent() {
        DirBuilder::new().recursive(true).mode(0o755).create(parent)?;
    }
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .mode(0o755)
        .open(destination)?;

    Ok(())
}

/// Copy owner, group and permission bits of `source` onto `destination`.
fn copy_ownership(source: &Path, destination: &Path) -> StowageResult<()> {
    use rustix::fs::{Gid, Mode, RawMode, Uid, chmod, chown, stat};

    let permission_error = |e: io::Error| StowageError::Permission {
        path: destination.to_path_buf(),
        source: e,
    };

    let st = stat(source).map_err(|e| permission_error(e.into()))?;

    chown(
        destination,
        Some(Uid::from_raw(st.st_uid)),
        Some(Gid::from_raw(st.st_gid)),
    )
    .map_err(|e| permission_error(e.into()))?;
    chmod(destination, Mode::from_raw_mode(st.st_mode as RawMode))
        .map_err(|e| permission_error(e.into()))?;

    Ok(())
}
