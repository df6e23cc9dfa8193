//! # stowage-common
//!
//! Shared types for the stowage workspace:
//! - Container ID validation
//! - Standard filesystem paths
//! - Common error types

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod paths;

pub use error::{StowageError, StowageResult};
pub use id::ContainerId;
pub use paths::StowagePaths;
