//! Backing storage for managed volumes.

use std::path::{Component, Path, PathBuf};

use parking_lot::Mutex;
use stowage_common::{StowageError, StowagePaths, StowageResult};

/// Allocates and locates backing directories for managed volumes.
///
/// Implementations are shared between containers and must be safe to call
/// concurrently.
pub trait StorageAllocator: Send + Sync {
    /// Create a fresh, empty backing directory and return its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be created.
    fn allocate(&self) -> StowageResult<String>;

    /// Host path of the storage identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if no such storage exists.
    fn locate(&self, id: &str) -> StowageResult<PathBuf>;
}

/// Allocates volumes as directories under `<root>/volumes`.
#[derive(Debug)]
pub struct DirAllocator {
    paths: StowagePaths,
    lock: Mutex<()>,
}

impl DirAllocator {
    /// Create an allocator storing volumes under `paths`.
    #[must_use]
    pub fn new(paths: StowagePaths) -> Self {
        Self {
            paths,
            lock: Mutex::new(()),
        }
    }

    fn validate_id(id: &str) -> StowageResult<()> {
        let mut components = Path::new(id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(StowageError::StorageAllocation {
                message: format!("invalid volume id '{id}'"),
            }),
        }
    }
}

impl StorageAllocator for DirAllocator {
    fn allocate(&self) -> StowageResult<String> {
        let _guard = self.lock.lock();

        let id = uuid::Uuid::new_v4().simple().to_string();
        let data = self.paths.volume_data(&id);
        std::fs::create_dir_all(&data).map_err(|e| StowageError::StorageAllocation {
            message: format!("failed to create {}: {e}", data.display()),
        })?;

        tracing::debug!(volume = %id, path = %data.display(), "Created volume directory");
        Ok(id)
    }

    fn locate(&self, id: &str) -> StowageResult<PathBuf> {
        Self::validate_id(id)?;

        let data = self.paths.volume_data(id);
        if !data.is_dir() {
            return Err(StowageError::StorageAllocation {
                message: format!("volume '{id}' not found"),
            });
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn allocates_empty_directories() {
        let temp = tempdir().unwrap();
        let allocator = DirAllocator::new(StowagePaths::with_root(temp.path()));

        let id = allocator.allocate().unwrap();
        let path = allocator.locate(&id).unwrap();
        assert!(path.is_dir());
        assert!(path.starts_with(temp.path().join("volumes")));
        assert_eq!(std::fs::read_dir(&path).unwrap().count(), 0);
    }

    #[test]
    fn unknown_and_malformed_ids_fail() {
        let temp = tempdir().unwrap();
        let allocator = DirAllocator::new(StowagePaths::with_root(temp.path()));

        assert!(matches!(
            allocator.locate("missing"),
            Err(StowageError::StorageAllocation { .. })
        ));
        assert!(allocator.locate("../etc").is_err());
        assert!(allocator.locate("a/b").is_err());
    }

    #[test]
    fn concurrent_allocations_are_distinct() {
        let temp = tempdir().unwrap();
        let allocator = Arc::new(DirAllocator::new(StowagePaths::with_root(temp.path())));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                std::thread::spawn(move || allocator.allocate().unwrap())
            })
            .collect();

        let mut ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }
}
