//! Directory provisioning for broker data: creation, recursive ownership and
//! the `go-rwx` lock-down.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path};

use myqtt_config::RunningUser;
use myqtt_config::defaults::MIN_RUNTIME_DEPTH;
use nix::unistd::{Gid, Group, Uid, User, chown};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

const GROUP_OTHER_BITS: u32 = 0o077;

/// Reject runtime roots too close to `/` for a recursive chown.
///
/// # Errors
///
/// Returns [`FsOpsError::RuntimeRootTooShallow`].
pub fn check_runtime_depth(path: &Path) -> FsOpsResult<()> {
    let depth = path
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .count();
    if depth < MIN_RUNTIME_DEPTH {
        return Err(FsOpsError::RuntimeRootTooShallow {
            path: path.to_path_buf(),
            minimum: MIN_RUNTIME_DEPTH,
        });
    }
    Ok(())
}

/// `mkdir -p`. Returns `true` when the directory was created.
///
/// # Errors
///
/// Returns [`FsOpsError::Permission`] when creation fails.
pub fn ensure_dir(path: &Path) -> FsOpsResult<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path).map_err(|source| FsOpsError::permission("create_dir", path, source))?;
    debug!(path = %path.display(), "directory created");
    Ok(true)
}

fn resolve_owner(spec: &str) -> FsOpsResult<Uid> {
    let trimmed = spec.trim();
    if let Ok(id) = trimmed.parse::<u32>() {
        return Ok(Uid::from_raw(id));
    }
    let user = User::from_name(trimmed)
        .map_err(|source| FsOpsError::UserLookup {
            user: trimmed.to_string(),
            source,
        })?
        .ok_or_else(|| FsOpsError::UnknownUser {
            user: trimmed.to_string(),
        })?;
    Ok(user.uid)
}

fn resolve_group(spec: &str) -> FsOpsResult<Gid> {
    let trimmed = spec.trim();
    if let Ok(id) = trimmed.parse::<u32>() {
        return Ok(Gid::from_raw(id));
    }
    let group = Group::from_name(trimmed)
        .map_err(|source| FsOpsError::GroupLookup {
            group: trimmed.to_string(),
            source,
        })?
        .ok_or_else(|| FsOpsError::UnknownGroup {
            group: trimmed.to_string(),
        })?;
    Ok(group.gid)
}

/// `chown -R user:group path`. Names and numeric ids are both accepted.
///
/// # Errors
///
/// Returns a lookup error for unknown accounts and [`FsOpsError::Permission`]
/// when a chown call fails.
pub fn apply_ownership(path: &Path, owner: &RunningUser) -> FsOpsResult<()> {
    let uid = resolve_owner(&owner.user)?;
    let gid = resolve_group(&owner.group)?;

    for entry in WalkDir::new(path) {
        let entry = entry.map_err(|source| FsOpsError::walkdir("apply_ownership.walk", path, source))?;
        // chown follows links; module links point back into the tree anyway.
        if entry.path_is_symlink() {
            continue;
        }
        let target = entry.path();
        chown(target, Some(uid), Some(gid))
            .map_err(|errno| FsOpsError::permission("chown", target, io::Error::from(errno)))?;
    }
    debug!(path = %path.display(), owner = %owner, "ownership applied");
    Ok(())
}

/// `chmod go-rwx path`, leaving the owner bits untouched.
///
/// # Errors
///
/// Returns [`FsOpsError::Permission`] when the mode cannot be read or set.
pub fn lock_down(path: &Path) -> FsOpsResult<()> {
    let metadata =
        fs::metadata(path).map_err(|source| FsOpsError::permission("stat", path, source))?;
    let mode = metadata.permissions().mode() & !GROUP_OTHER_BITS;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|source| FsOpsError::permission("chmod", path, source))
}

/// Create `path` if needed and hand it to `owner`.
///
/// # Errors
///
/// See [`ensure_dir`] and [`apply_ownership`].
pub fn provision_owned_dir(path: &Path, owner: &RunningUser) -> FsOpsResult<()> {
    if ensure_dir(path)? {
        info!(path = %path.display(), "created directory");
    }
    apply_ownership(path, owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use myqtt_test_support::TempInstall;

    fn owner(install: &TempInstall) -> RunningUser {
        RunningUser {
            user: install.uid().to_string(),
            group: install.gid().to_string(),
        }
    }

    #[test]
    fn shallow_runtime_roots_are_rejected() {
        assert!(check_runtime_depth(Path::new("/var/lib/myqtt")).is_ok());
        assert!(matches!(
            check_runtime_depth(Path::new("/var/myqtt")),
            Err(FsOpsError::RuntimeRootTooShallow { minimum: 3, .. })
        ));
        assert!(check_runtime_depth(Path::new("/")).is_err());
    }

    #[test]
    fn provisions_nested_directories() -> Result<()> {
        let install = TempInstall::new()?;
        let target = install.runtime_root().join("tenant1");

        provision_owned_dir(&target, &owner(&install))?;
        assert!(target.is_dir());
        assert!(!ensure_dir(&target)?);
        Ok(())
    }

    #[test]
    fn lock_down_clears_group_and_other_bits() -> Result<()> {
        let install = TempInstall::new()?;
        let dir = install.root().join("secret");
        fs::create_dir(&dir)?;
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o775))?;

        lock_down(&dir)?;
        let mode = fs::metadata(&dir)?.permissions().mode() & 0o777;
        assert_eq!(mode, 0o700);
        Ok(())
    }

    #[test]
    fn unknown_named_user_is_reported() -> Result<()> {
        let install = TempInstall::new()?;
        let missing = RunningUser {
            user: "myqtt-no-such-user-42".to_string(),
            group: install.gid().to_string(),
        };
        let err = apply_ownership(install.root(), &missing).expect_err("unknown user");
        assert!(matches!(
            err,
            FsOpsError::UnknownUser { .. } | FsOpsError::UserLookup { .. }
        ));
        Ok(())
    }
}
