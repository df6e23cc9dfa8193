//! Assembling a container's complete volume set.

use stowage_common::StowageResult;

use super::entity::{Volume, VolumeInitializer};
use super::from::parse_volumes_from_spec;
use super::path::clean_container_path;
use super::set::VolumeSet;
use super::spec::parse_bind_spec;
use crate::archive::ArchiveCopier;
use crate::container::{ContainerLookup, ContainerRecord};
use crate::storage::StorageAllocator;

/// Builds volume sets from inherited volumes, bind mounts and image
/// volumes, in that order of precedence.
pub struct VolumeSetBuilder<'a> {
    lookup: &'a dyn ContainerLookup,
    allocator: &'a dyn StorageAllocator,
    copier: &'a dyn ArchiveCopier,
}

impl<'a> VolumeSetBuilder<'a> {
    /// Create a builder over the given collaborators.
    pub fn new(
        lookup: &'a dyn ContainerLookup,
        allocator: &'a dyn StorageAllocator,
        copier: &'a dyn ArchiveCopier,
    ) -> Self {
        Self {
            lookup,
            allocator,
            copier,
        }
    }

    /// Resolve every volume of `container`, starting from its persisted set.
    ///
    /// Inherited volumes are only applied while the persisted set is still
    /// empty, so rebuilding a prepared container changes nothing. The first
    /// path claimed wins.
    ///
    /// # Errors
    ///
    /// The first failing volume aborts the build. Storage allocated for
    /// earlier volumes is left in place.
    pub fn build(&self, container: &ContainerRecord) -> StowageResult<VolumeSet> {
        let initializer = VolumeInitializer::new(&container.rootfs, self.allocator, self.copier);
        let mut set = container.volumes.clone();

        if set.is_empty() {
            for spec in &container.volumes_from {
                for volume in parse_volumes_from_spec(self.lookup, spec)? {
                    fold(&initializer, &mut set, volume)?;
                }
            }
        }

        for spec in &container.binds {
            fold(&initializer, &mut set, parse_bind_spec(spec)?)?;
        }

        for path in &container.image_volumes {
            if set.contains(&clean_container_path(path)) {
                continue;
            }
            fold(&initializer, &mut set, Volume::managed(path.clone()))?;
        }

        tracing::info!(
            container = %container.id,
            volumes = set.len(),
            "Volume set ready"
        );
        Ok(set)
    }
}

fn fold(
    initializer: &VolumeInitializer<'_>,
    set: &mut VolumeSet,
    volume: Volume,
) -> StowageResult<()> {
    if let Some(delta) = initializer.initialize(volume, set)? {
        set.apply(delta);
    }
    Ok(())
}
