//! Volume resolution for containers.
//!
//! This module handles:
//! - Parsing bind-mount and volumes-from specifications
//! - Resolving paths safely under a container root
//! - Initializing bind, managed and inherited volumes
//! - Building a container's complete volume set

mod builder;
mod entity;
mod from;
mod path;
mod set;
mod spec;

pub use builder::VolumeSetBuilder;
pub use entity::{Volume, VolumeInitializer, VolumeSource};
pub use from::parse_volumes_from_spec;
pub use path::{clean_container_path, resolve_host_symlinks, safe_join};
pub use set::{VolumeDelta, VolumeRecord, VolumeSet};
pub use spec::{AccessMode, VolumesFromSpec, parse_bind_spec};
