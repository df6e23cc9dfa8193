//! # Stowage
//!
//! Volume resolution for containers: decides where every in-container
//! mount point's data lives on the host, prepares backing storage and
//! mount points, and produces the ordered mount list the execution layer
//! applies.
//!
//! ## Usage
//!
//! ```no_run
//! use stowage::config::RuntimeConfig;
//! use stowage::mount::{SystemFiles, assemble_mounts};
//! use stowage::volume::VolumeSetBuilder;
//!
//! # fn example() -> stowage_common::StowageResult<()> {
//! let config = RuntimeConfig::default();
//! let store = config.container_store();
//! let allocator = config.allocator();
//! let copier = config.copier();
//!
//! let mut container = store.load("web")?;
//! container.volumes = VolumeSetBuilder::new(&store, &allocator, &copier).build(&container)?;
//! store.save(&container)?;
//!
//! let mounts = assemble_mounts(&SystemFiles::from_container(&container), &container.volumes);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod cli;
pub mod config;
pub mod container;
pub mod mount;
pub mod storage;
pub mod store;
pub mod volume;

pub use container::{ContainerLookup, ContainerRecord};
pub use mount::{Mount, Propagation};
pub use volume::{Volume, VolumeSet};
