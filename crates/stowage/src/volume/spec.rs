//! Parsing of user-supplied bind-mount and volumes-from strings.
//!
//! Both formats are colon separated:
//!
//! - bind mounts: `container-path`, `host-path:container-path` or
//!   `host-path:container-path:mode`
//! - volumes-from: `container-id` or `container-id:mode`
//!
//! where `mode` is `ro` or `rw`. Parsing is pure; nothing here touches the
//! filesystem.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use stowage_common::{StowageError, StowageResult};

use super::entity::Volume;

/// Access mode of a mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Read-only.
    ReadOnly,
    /// Read-write.
    ReadWrite,
}

impl AccessMode {
    /// Whether the container may write through the mount.
    #[must_use]
    pub const fn is_read_write(self) -> bool {
        matches!(self, Self::ReadWrite)
    }

    /// Mode token as it appears in a spec string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "ro",
            Self::ReadWrite => "rw",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = StowageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ro" => Ok(Self::ReadOnly),
            "rw" => Ok(Self::ReadWrite),
            other => Err(StowageError::invalid_spec(
                other,
                "mode must be 'ro' or 'rw'",
            )),
        }
    }
}

/// Parse a bind-mount specification into a [`Volume`].
///
/// A single field names only the container path and yields a managed
/// volume. Two or three fields yield a bind mount whose host path must be
/// absolute.
///
/// # Errors
///
/// Returns [`StowageError::InvalidSpec`] for a wrong field count, an
/// unknown mode token, an empty container path, or a relative host path.
pub fn parse_bind_spec(spec: &str) -> StowageResult<Volume> {
    let fields: Vec<&str> = spec.split(':').collect();

    let (host, container, mode) = match fields.as_slice() {
        [container] => (None, *container, AccessMode::ReadWrite),
        [host, container] => (Some(*host), *container, AccessMode::ReadWrite),
        [host, container, mode] => {
            let mode = mode.parse::<AccessMode>().map_err(|_| {
                StowageError::invalid_spec(spec, format!("invalid mode '{mode}'"))
            })?;
            (Some(*host), *container, mode)
        }
        _ => {
            return Err(StowageError::invalid_spec(
                spec,
                format!("expected 1 to 3 fields, found {}", fields.len()),
            ));
        }
    };

    if container.is_empty() {
        return Err(StowageError::invalid_spec(spec, "container path is empty"));
    }

    let volume = match host {
        None => Volume::managed(container).with_read_write(mode.is_read_write()),
        Some(host) => {
            if !Path::new(host).is_absolute() {
                return Err(StowageError::invalid_spec(
                    spec,
                    format!("cannot bind mount volume: '{host}' volume paths must be absolute"),
                ));
            }
            Volume::bind(host, container, mode.is_read_write())
        }
    };

    tracing::trace!(spec, ?volume, "Parsed bind specification");
    Ok(volume)
}

/// A parsed `--volumes-from` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumesFromSpec {
    /// Container whose volumes are inherited.
    pub container_id: String,
    /// Mode override applied to every inherited volume.
    pub mode: Option<AccessMode>,
}

impl VolumesFromSpec {
    /// Parse `container-id[:mode]`, splitting on the first colon.
    ///
    /// # Errors
    ///
    /// Returns [`StowageError::InvalidSpec`] if the container ID is empty or
    /// the mode token is not `ro` or `rw`.
    pub fn parse(spec: &str) -> StowageResult<Self> {
        let (container_id, mode) = match spec.split_once(':') {
            Some((id, mode)) => (id, Some(mode)),
            None => (spec, None),
        };

        if container_id.is_empty() {
            return Err(StowageError::invalid_spec(
                spec,
                "malformed volumes-from specification",
            ));
        }

        let mode = mode
            .map(|m| {
                m.parse::<AccessMode>().map_err(|_| {
                    StowageError::invalid_spec(spec, format!("invalid mode for volumes-from: {m}"))
                })
            })
            .transpose()?;

        Ok(Self {
            container_id: container_id.to_string(),
            mode,
        })
    }
}

impl FromStr for VolumesFromSpec {
    type Err = StowageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VolumesFromSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Some(mode) => write!(f, "{}:{mode}", self.container_id),
            None => f.write_str(&self.container_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::VolumeSource;
    use proptest::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn container_path_only() {
        let vol = parse_bind_spec("/data").unwrap();
        assert_eq!(vol.container_path, PathBuf::from("/data"));
        assert!(vol.read_write);
        assert_eq!(vol.source, VolumeSource::Managed);
        assert!(!vol.is_bind_mount());
    }

    #[test]
    fn host_and_container_path() {
        let vol = parse_bind_spec("/host/data:/data").unwrap();
        assert_eq!(vol.host_path(), Some(Path::new("/host/data")));
        assert_eq!(vol.container_path, PathBuf::from("/data"));
        assert!(vol.read_write);
        assert!(vol.is_bind_mount());
    }

    #[test]
    fn read_only_bind() {
        let vol = parse_bind_spec("/host/data:/data:ro").unwrap();
        assert_eq!(vol.host_path(), Some(Path::new("/host/data")));
        assert_eq!(vol.container_path, PathBuf::from("/data"));
        assert!(!vol.read_write);
    }

    #[test]
    fn explicit_read_write_bind() {
        let vol = parse_bind_spec("/host/data:/data:rw").unwrap();
        assert!(vol.read_write);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = parse_bind_spec("/host:/data:rx").unwrap_err();
        assert!(matches!(err, StowageError::InvalidSpec { .. }));
    }

    #[test]
    fn rejects_too_many_fields() {
        let err = parse_bind_spec("/a:/b:ro:extra").unwrap_err();
        assert!(matches!(err, StowageError::InvalidSpec { .. }));
    }

    #[test]
    fn rejects_relative_host_path() {
        assert!(matches!(
            parse_bind_spec("host/data:/data"),
            Err(StowageError::InvalidSpec { .. })
        ));
        assert!(matches!(
            parse_bind_spec(":/data"),
            Err(StowageError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn rejects_empty_container_path() {
        assert!(parse_bind_spec("").is_err());
        assert!(parse_bind_spec("/host:").is_err());
    }

    #[test]
    fn volumes_from_without_mode() {
        let spec = VolumesFromSpec::parse("web").unwrap();
        assert_eq!(spec.container_id, "web");
        assert_eq!(spec.mode, None);
        assert_eq!(spec.to_string(), "web");
    }

    #[test]
    fn volumes_from_with_mode() {
        let spec: VolumesFromSpec = "web:ro".parse().unwrap();
        assert_eq!(spec.container_id, "web");
        assert_eq!(spec.mode, Some(AccessMode::ReadOnly));
        assert_eq!(spec.to_string(), "web:ro");
    }

    #[test]
    fn volumes_from_rejects_bad_mode() {
        for spec in ["web:", "web:RO", "web:rw:ro", "web:z"] {
            assert!(
                matches!(
                    VolumesFromSpec::parse(spec),
                    Err(StowageError::InvalidSpec { .. })
                ),
                "{spec} should be rejected"
            );
        }
    }

    #[test]
    fn volumes_from_rejects_empty_id() {
        assert!(VolumesFromSpec::parse("").is_err());
        assert!(VolumesFromSpec::parse(":ro").is_err());
    }

    proptest! {
        #[test]
        fn field_count_above_three_is_rejected(
            fields in prop::collection::vec("/[a-z]{1,8}", 4..8)
        ) {
            let spec = fields.join(":");
            prop_assert!(
                matches!(parse_bind_spec(&spec), Err(StowageError::InvalidSpec { .. })),
                "unexpected result for {}",
                spec
            );
        }

        #[test]
        fn relative_host_paths_are_rejected(
            host in "[a-z][a-z0-9/]{0,12}",
            container in "/[a-z]{1,8}",
        ) {
            let spec = format!("{host}:{container}");
            let rejected = matches!(
                parse_bind_spec(&spec),
                Err(StowageError::InvalidSpec { .. })
            );
            prop_assert!(rejected, "accepted relative host path in {}", spec);
        }

        #[test]
        fn three_field_mode_decides_read_write(
            host in "/[a-z]{1,8}",
            container in "/[a-z]{1,8}",
            rw in any::<bool>(),
        ) {
            let mode = if rw { "rw" } else { "ro" };
            let vol = parse_bind_spec(&format!("{host}:{container}:{mode}")).unwrap();
            prop_assert_eq!(vol.read_write, rw);
            prop_assert_eq!(vol.host_path(), Some(Path::new(&host)));
            prop_assert_eq!(vol.container_path, PathBuf::from(&container));
        }

        #[test]
        fn unknown_volumes_from_modes_are_rejected(mode in "[a-z]{1,4}") {
            prop_assume!(mode != "ro" && mode != "rw");
            let rejected = matches!(
                VolumesFromSpec::parse(&format!("web:{mode}")),
                Err(StowageError::InvalidSpec { .. })
            );
            prop_assert!(rejected, "accepted volumes-from mode {}", mode);
        }
    }
}
