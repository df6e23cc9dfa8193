//! Mount list assembly.
//!
//! The execution layer applies mounts in list order. System files come
//! first; user volumes follow sorted by container path so that a parent
//! mount is always in place before anything nested below it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::container::ContainerRecord;
use crate::volume::{VolumeRecord, VolumeSet};

/// Mount propagation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Propagation {
    /// Mount events propagate both ways.
    Shared,
    /// Mount events propagate from the host only.
    Slave,
    /// No propagation.
    Private,
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shared => "shared",
            Self::Slave => "slave",
            Self::Private => "private",
        })
    }
}

/// A mount for the execution layer to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    /// Host path.
    pub source: PathBuf,
    /// Path inside the container.
    pub destination: PathBuf,
    /// Writable mount.
    pub writable: bool,
    /// Propagation mode.
    pub propagation: Propagation,
}

/// Per-container system files bind-mounted over `/etc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemFiles {
    /// Source of /etc/resolv.conf.
    pub resolv_conf: PathBuf,
    /// Source of /etc/hostname, if configured.
    pub hostname: Option<PathBuf>,
    /// Source of /etc/hosts, if configured.
    pub hosts: Option<PathBuf>,
}

impl SystemFiles {
    /// System files recorded for `container`.
    #[must_use]
    pub fn from_container(container: &ContainerRecord) -> Self {
        Self {
            resolv_conf: container.resolv_conf_path.clone(),
            hostname: container.hostname_path.clone(),
            hosts: container.hosts_path.clone(),
        }
    }
}

/// Build the ordered mount list for a container.
///
/// User mounts are shared so that mounts made later on the host below a
/// volume source show up in the container.
#[must_use]
pub fn assemble_mounts(system: &SystemFiles, volumes: &VolumeSet) -> Vec<Mount> {
    let mut mounts = vec![Mount {
        source: system.resolv_conf.clone(),
        destination: PathBuf::from("/etc/resolv.conf"),
        writable: true,
        propagation: Propagation::Slave,
    }];

    if let Some(hostname) = &system.hostname {
        mounts.push(Mount {
            source: hostname.clone(),
            destination: PathBuf::from("/etc/hostname"),
            writable: true,
            propagation: Propagation::Private,
        });
    }

    if let Some(hosts) = &system.hosts {
        mounts.push(Mount {
            source: hosts.clone(),
            destination: PathBuf::from("/etc/hosts"),
            writable: true,
            propagation: Propagation::Slave,
        });
    }

    mounts.extend(
        sorted_volumes(volumes)
            .into_iter()
            .map(|(path, record)| Mount {
                source: record.host_path.clone(),
                destination: path.to_path_buf(),
                writable: record.read_write,
                propagation: Propagation::Shared,
            }),
    );

    mounts
}

/// Entries of `volumes` in plain byte-wise order of their container paths.
fn sorted_volumes(volumes: &VolumeSet) -> Vec<(&Path, &VolumeRecord)> {
    let mut entries: Vec<_> = volumes.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.as_os_str().cmp(b.as_os_str()));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::VolumeDelta;

    fn set(entries: &[(&str, &str, bool)]) -> VolumeSet {
        let mut set = VolumeSet::new();
        for (path, host, read_write) in entries {
            set.apply(VolumeDelta {
                container_path: PathBuf::from(path),
                record: VolumeRecord {
                    host_path: PathBuf::from(host),
                    read_write: *read_write,
                    bind_mount: false,
                },
            });
        }
        set
    }

    fn system(hostname: bool, hosts: bool) -> SystemFiles {
        SystemFiles {
            resolv_conf: PathBuf::from("/run/c/resolv.conf"),
            hostname: hostname.then(|| PathBuf::from("/run/c/hostname")),
            hosts: hosts.then(|| PathBuf::from("/run/c/hosts")),
        }
    }

    #[test]
    fn volumes_sorted_lexicographically() {
        let volumes = set(&[("/ab", "/v/3", true), ("/a/b", "/v/2", true), ("/a", "/v/1", true)]);
        let mounts = assemble_mounts(&system(false, false), &volumes);

        let destinations: Vec<_> = mounts[1..].iter().map(|m| m.destination.clone()).collect();
        assert_eq!(
            destinations,
            vec![
                PathBuf::from("/a"),
                PathBuf::from("/a/b"),
                PathBuf::from("/ab")
            ]
        );
    }

    #[test]
    fn string_order_not_component_order() {
        let volumes = set(&[("/a/b", "/v/1", true), ("/a-b", "/v/2", true)]);
        let mounts = assemble_mounts(&system(false, false), &volumes);
        assert_eq!(mounts[1].destination, PathBuf::from("/a-b"));
        assert_eq!(mounts[2].destination, PathBuf::from("/a/b"));
    }

    #[test]
    fn system_mounts_come_first() {
        let volumes = set(&[("/data", "/v/1", true)]);
        let mounts = assemble_mounts(&system(true, true), &volumes);

        assert_eq!(mounts.len(), 4);
        assert_eq!(mounts[0].destination, PathBuf::from("/etc/resolv.conf"));
        assert_eq!(mounts[0].propagation, Propagation::Slave);
        assert_eq!(mounts[1].destination, PathBuf::from("/etc/hostname"));
        assert_eq!(mounts[1].propagation, Propagation::Private);
        assert_eq!(mounts[2].destination, PathBuf::from("/etc/hosts"));
        assert_eq!(mounts[2].propagation, Propagation::Slave);
        assert!(mounts[..3].iter().all(|m| m.writable));
        assert_eq!(mounts[3].propagation, Propagation::Shared);
    }

    #[test]
    fn optional_system_files_are_skipped() {
        let mounts = assemble_mounts(&system(false, true), &VolumeSet::new());
        assert_eq!(mounts.len(), 2);
        assert_eq!(mounts[1].destination, PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn writable_follows_recorded_mode() {
        let volumes = set(&[("/data", "/host/data", false)]);
        let mounts = assemble_mounts(&system(false, false), &volumes);

        assert_eq!(mounts[1].source, PathBuf::from("/host/data"));
        assert!(!mounts[1].writable);
    }
}
