//! Container record persistence.

use std::path::PathBuf;

use stowage_common::{ContainerId, StowageError, StowagePaths, StowageResult};

use crate::container::{ContainerLookup, ContainerRecord};

/// Stores container records as JSON files, one directory per container.
#[derive(Debug)]
pub struct ContainerStore {
    /// Layout of the data root.
    paths: StowagePaths,
}

impl ContainerStore {
    /// Create a new store over the given data root layout.
    pub const fn new(paths: StowagePaths) -> Self {
        Self { paths }
    }

    /// Directory holding a container's files.
    ///
    /// # Errors
    ///
    /// Returns [`StowageError::InvalidContainerId`] if `container_id` is not
    /// a valid ID.
    pub fn container_dir(&self, container_id: &str) -> StowageResult<PathBuf> {
        let id = ContainerId::new(container_id)?;
        Ok(self.paths.container(id.as_str()))
    }

    /// Path to a container's record file.
    ///
    /// # Errors
    ///
    /// Returns [`StowageError::InvalidContainerId`] if `container_id` is not
    /// a valid ID.
    pub fn record_path(&self, container_id: &str) -> StowageResult<PathBuf> {
        let id = ContainerId::new(container_id)?;
        Ok(self.paths.container_record(id.as_str()))
    }

    /// Save a container record.
    pub fn save(&self, record: &ContainerRecord) -> StowageResult<()> {
        let path = self.record_path(&record.id)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json)?;

        tracing::debug!(
            container_id = %record.id,
            path = %path.display(),
            volumes = record.volumes.len(),
            "Saved container record"
        );

        Ok(())
    }

    /// Load a container record.
    pub fn load(&self, container_id: &str) -> StowageResult<ContainerRecord> {
        let path = self.record_path(container_id)?;

        if !path.exists() {
            return Err(StowageError::ContainerNotFound {
                id: container_id.to_string(),
            });
        }

        let json = std::fs::read_to_string(&path)?;
        let record: ContainerRecord = serde_json::from_str(&json)?;

        tracing::debug!(
            container_id = %container_id,
            path = %path.display(),
            "Loaded container record"
        );

        Ok(record)
    }

    /// Delete a container record and its directory.
    pub fn delete(&self, container_id: &str) -> StowageResult<()> {
        let container_dir = self.container_dir(container_id)?;

        if container_dir.exists() {
            std::fs::remove_dir_all(&container_dir)?;
            tracing::debug!(
                container_id = %container_id,
                path = %container_dir.display(),
                "Deleted container record"
            );
        }

        Ok(())
    }

    /// List stored container IDs.
    pub fn list(&self) -> StowageResult<Vec<String>> {
        let mut containers = Vec::new();

        let state_dir = self.paths.containers();
        if !state_dir.exists() {
            return Ok(containers);
        }

        for entry in std::fs::read_dir(&state_dir)? {
            let entry = entry?;
            if entry.path().join("container.json").is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    containers.push(name.to_string());
                }
            }
        }

        containers.sort();
        Ok(containers)
    }

    /// Check if a container exists.
    pub fn exists(&self, container_id: &str) -> bool {
        self.record_path(container_id).is_ok_and(|path| path.exists())
    }
}

impl ContainerLookup for ContainerStore {
    fn get(&self, id: &str) -> StowageResult<Option<ContainerRecord>> {
        if !self.exists(id) {
            return Ok(None);
        }
        self.load(id).map(Some)
    }
}
