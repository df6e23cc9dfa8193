//! Host and container path resolution.
//!
//! Volume targets are joined under an untrusted container root. Every
//! symlink met along the way is resolved inside that root, and any link
//! that would lead outside of it is refused.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

use stowage_common::{StowageError, StowageResult};

/// Maximum number of symlinks followed while resolving a single path.
const MAX_SYMLINK_HOPS: usize = 255;

/// Lexically clean an in-container path.
///
/// The result is absolute, has no `.` or `..` components and no trailing
/// slash. `..` never climbs above `/`.
#[must_use]
pub fn clean_container_path(path: &Path) -> PathBuf {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::ParentDir => {
                parts.pop();
            }
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
        }
    }

    let mut cleaned = PathBuf::from("/");
    cleaned.extend(parts);
    cleaned
}

/// Fully dereference the symlinks of a host path.
///
/// # Errors
///
/// Returns [`StowageError::Io`] if the path (or a link target) does not
/// exist.
pub fn resolve_host_symlinks(path: &Path) -> StowageResult<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| {
        StowageError::Io(io::Error::new(
            e.kind(),
            format!("failed to resolve {}: {e}", path.display()),
        ))
    })
}

/// A component still to be walked, remembering whether it came from a
/// symlink target.
struct Pending {
    part: OsString,
    from_link: bool,
}

fn pending_parts(path: &Path, from_link: bool) -> impl Iterator<Item = Pending> + '_ {
    path.components().filter_map(move |component| match component {
        Component::Normal(part) => Some(Pending {
            part: part.to_os_string(),
            from_link,
        }),
        Component::ParentDir => Some(Pending {
            part: OsString::from(".."),
            from_link,
        }),
        Component::Prefix(_) | Component::RootDir | Component::CurDir => None,
    })
}

/// Join `path` onto `root` so that the result stays inside `root` after
/// following every symlink component.
///
/// `..` components of `path` itself are clamped at the root. Symlink
/// targets are resolved in place: absolute targets are read in the
/// container's namespace and restart from the root, while a relative target
/// that climbs above the root fails with [`StowageError::PathEscape`].
/// Components that do not exist yet are appended as they are.
///
/// # Errors
///
/// Returns [`StowageError::PathEscape`] if containment cannot be
/// guaranteed and [`StowageError::Io`] if the root cannot be resolved or a
/// component cannot be inspected.
pub fn safe_join(root: &Path, path: &Path) -> StowageResult<PathBuf> {
    let root = resolve_host_symlinks(root)?;
    let escape = || StowageError::PathEscape {
        path: path.to_path_buf(),
        root: root.clone(),
    };

    let mut pending: VecDeque<Pending> = pending_parts(path, false).collect();
    let mut resolved = PathBuf::new();
    let mut hops = 0;

    while let Some(Pending { part, from_link }) = pending.pop_front() {
        if part == ".." {
            if !resolved.pop() && from_link {
                return Err(escape());
            }
            continue;
        }

        let candidate = resolved.join(&part);
        let full = root.join(&candidate);

        let metadata = match std::fs::symlink_metadata(&full) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                resolved = candidate;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.file_type().is_symlink() {
            resolved = candidate;
            continue;
        }

        hops += 1;
        if hops > MAX_SYMLINK_HOPS {
            tracing::warn!(path = %path.display(), "Too many levels of symbolic links");
            return Err(escape());
        }

        let target = std::fs::read_link(&full)?;
        let target = if target.is_absolute() {
            resolved = PathBuf::new();
            clean_container_path(&target)
        } else {
            target
        };
        tracing::trace!(link = %full.display(), target = %target.display(), "Following symlink");

        for (index, item) in pending_parts(&target, true).enumerate() {
            pending.insert(index, item);
        }
    }

    Ok(root.join(resolved))
}
