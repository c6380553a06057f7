// Install path ownership
// Operations on the local node run as the user owning the install tree.

use std::ffi::OsString;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use nix::unistd::{Gid, Group, Uid, User, geteuid};
use tracing::debug;

use crate::error::BootstrapError;
use crate::model::Ownership;

/// Trait for filesystem ownership lookups
pub trait OwnershipProbe {
    /// Owner of `path`; names are empty when the id has no account entry
    fn owner_of(&self, path: &Path) -> Result<Ownership, BootstrapError>;
}

/// Ownership probe backed by file metadata and the account database
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOwnership;

impl OwnershipProbe for FsOwnership {
    fn owner_of(&self, path: &Path) -> Result<Ownership, BootstrapError> {
        let metadata = std::fs::metadata(path).map_err(|source| BootstrapError::Filesystem {
            path: path.to_path_buf(),
            source,
        })?;
        let lookup_error = |source| BootstrapError::OwnerLookup {
            path: path.to_path_buf(),
            source,
        };

        let user = User::from_uid(Uid::from_raw(metadata.uid()))
            .map_err(lookup_error)?
            .map(|u| u.name)
            .unwrap_or_default();
        let group = Group::from_gid(Gid::from_raw(metadata.gid()))
            .map_err(lookup_error)?
            .map(|g| g.name)
            .unwrap_or_default();

        Ok(Ownership { user, group })
    }
}

/// Pick the path whose owner counts as the install owner.
///
/// A symlinked install path resolves to its target. A missing path falls back
/// to the side-by-side install `<app_path>_<commit_id>`.
pub fn resolve_install_path(app_path: &Path, commit_id: &str) -> Result<PathBuf, BootstrapError> {
    if app_path.is_symlink() {
        return std::fs::canonicalize(app_path).map_err(|source| BootstrapError::Filesystem {
            path: app_path.to_path_buf(),
            source,
        });
    }
    if app_path.exists() {
        return Ok(app_path.to_path_buf());
    }

    let mut versioned = OsString::from(app_path.as_os_str());
    versioned.push("_");
    versioned.push(commit_id);
    Ok(PathBuf::from(versioned))
}

/// Resolve the (user, group) owning the install tree at `app_path`.
pub fn resolve_owner(
    probe: &dyn OwnershipProbe,
    app_path: &Path,
    commit_id: &str,
) -> Result<Ownership, BootstrapError> {
    let install_path = resolve_install_path(app_path, commit_id)?;
    debug!(path = %install_path.display(), "Resolving install path owner");

    let owner = probe.owner_of(&install_path)?;
    if !owner.is_complete() {
        return Err(BootstrapError::OwnershipUnknown(install_path));
    }
    Ok(owner)
}

/// Name of the effective user running this process, if it has an account entry
pub fn current_user_name() -> Option<String> {
    User::from_uid(geteuid()).ok().flatten().map(|u| u.name)
}
