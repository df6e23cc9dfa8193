//! Inheriting volumes from other containers.

use stowage_common::{StowageError, StowageResult};

use super::entity::Volume;
use super::spec::VolumesFromSpec;
use crate::container::ContainerLookup;

/// Resolve a `--volumes-from` specification into the referenced
/// container's volumes.
///
/// The mode suffix, when present, replaces the mode of every inherited
/// volume; otherwise each volume keeps the mode it has in the source
/// container. Nothing is written.
///
/// # Errors
///
/// Returns [`StowageError::InvalidSpec`] for a malformed spec and
/// [`StowageError::ContainerNotFound`] if the container does not exist.
pub fn parse_volumes_from_spec(
    lookup: &dyn ContainerLookup,
    spec: &str,
) -> StowageResult<Vec<Volume>> {
    let spec = VolumesFromSpec::parse(spec)?;

    let source = lookup
        .get(&spec.container_id)?
        .ok_or_else(|| StowageError::ContainerNotFound {
            id: spec.container_id.clone(),
        })?;

    let mut volumes = source.volumes.to_inherited(&source.id);
    if let Some(mode) = spec.mode {
        for volume in &mut volumes {
            volume.read_write = mode.is_read_write();
        }
    }

    tracing::debug!(
        from = %spec.container_id,
        count = volumes.len(),
        mode = ?spec.mode,
        "Resolved volumes-from"
    );
    Ok(volumes)
}
