//! Common error types for stowage.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`StowageError`].
pub type StowageResult<T> = Result<T, StowageError>;

/// Errors raised while resolving and preparing container volumes.
#[derive(Error, Diagnostic, Debug)]
pub enum StowageError {
    /// Malformed bind-mount or volumes-from specification.
    #[error("Invalid volume specification '{spec}': {reason}")]
    #[diagnostic(
        code(stowage::spec::invalid),
        help(
            "Use 'container-path', 'host-path:container-path' or 'host-path:container-path:ro|rw'"
        )
    )]
    InvalidSpec {
        /// The offending specification string.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A volumes-from reference names a container that does not exist.
    #[error("Container {id} not found. Impossible to mount its volumes")]
    #[diagnostic(code(stowage::container::not_found))]
    ContainerNotFound {
        /// The container ID that was not found.
        id: String,
    },

    /// Invalid container ID format.
    #[error("Invalid container ID: {id}")]
    #[diagnostic(
        code(stowage::container::invalid_id),
        help("Container IDs must be alphanumeric with hyphens and underscores, 1-64 characters")
    )]
    InvalidContainerId {
        /// The invalid container ID.
        id: String,
    },

    /// A container path resolves outside of the container root.
    #[error("Path {} escapes container root {}", path.display(), root.display())]
    #[diagnostic(code(stowage::path::escape))]
    PathEscape {
        /// The path that could not be contained.
        path: PathBuf,
        /// The container root.
        root: PathBuf,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(stowage::io))]
    Io(#[from] std::io::Error),

    /// The storage allocator failed to provide a backing directory.
    #[error("Storage allocation failed: {message}")]
    #[diagnostic(code(stowage::storage::allocation))]
    StorageAllocation {
        /// The error message.
        message: String,
    },

    /// Ownership or mode propagation failed.
    #[error("Failed to propagate ownership to {}: {source}", path.display())]
    #[diagnostic(
        code(stowage::permission),
        help("Try running with elevated privileges (sudo)")
    )]
    Permission {
        /// The path whose ownership could not be changed.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(stowage::serialization))]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(stowage::config))]
    Config {
        /// The error message.
        message: String,
    },
}

impl StowageError {
    /// Shorthand for an [`StowageError::InvalidSpec`].
    pub fn invalid_spec(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            spec: spec.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StowageError::ContainerNotFound {
            id: "abc123".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Container abc123 not found. Impossible to mount its volumes"
        );
    }

    #[test]
    fn invalid_spec_names_the_spec() {
        let err = StowageError::invalid_spec("a:b:c:d", "too many fields");
        assert!(err.to_string().contains("a:b:c:d"));
    }

    #[test]
    fn serialization_error_keeps_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StowageError = json_err.into();
        assert!(matches!(err, StowageError::Serialization(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StowageError = io_err.into();
        assert!(matches!(err, StowageError::Io(_)));
    }
}
