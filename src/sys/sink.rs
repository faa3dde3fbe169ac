use std::fs::{self as std_fs, Permissions};
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::SinkWriteError;

/// rw------- : the ACL token is readable only by the user that ran the login.
pub const TOKEN_FILE_MODE: u32 = 0o600;

/// Writes `payload` to `path` so that afterwards the file holds exactly those bytes
/// and exactly `mode`, whatever was there before.
///
/// Replace, never mutate: a previous sink file is usually read-only (0444), and
/// reopening it for write fails even for its owner. The old file is unlinked, the
/// token is staged in a fresh sibling file and renamed over the path. Concurrent
/// writers each stage their own file, so they all succeed and the last rename wins.
pub fn write_file_with_perms(path: &Path, payload: &str, mode: u32) -> Result<(), SinkWriteError> {
    // 1. Remove whatever is at the path. A symlink is removed, not followed.
    match std_fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(SinkWriteError::Remove {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    // 2. 🛡️ Stage in the same directory so the rename never crosses a filesystem.
    // The staging file is created O_EXCL under a random name and unlinked on drop.
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".acl-token-")
        .tempfile_in(dir)
        .map_err(|source| SinkWriteError::Create {
            path: path.to_path_buf(),
            source,
        })?;

    fill_and_verify(&mut staged, path, payload, mode)?;

    // 3. Atomic swap. Readers see the old file, no file, or the complete new one.
    staged
        .persist(path)
        .map_err(|e| SinkWriteError::Replace {
            path: path.to_path_buf(),
            source: e.error,
        })?;

    tracing::debug!(path = %path.display(), mode = %format!("{mode:o}"), "token sink written");
    Ok(())
}

fn fill_and_verify(
    staged: &mut NamedTempFile,
    path: &Path,
    payload: &str,
    mode: u32,
) -> Result<(), SinkWriteError> {
    let file = staged.as_file_mut();

    // The create mode is filtered through the process umask; pin it on the handle.
    file.set_permissions(Permissions::from_mode(mode))
        .map_err(|source| SinkWriteError::Permissions {
            path: path.to_path_buf(),
            source,
        })?;

    // Write in one pass and make it durable before it becomes visible.
    let write_err = |source| SinkWriteError::Write {
        path: path.to_path_buf(),
        source,
    };
    file.write_all(payload.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;

    // Success is only reported for a verified mode.
    let actual = file
        .metadata()
        .map_err(|source| SinkWriteError::Permissions {
            path: path.to_path_buf(),
            source,
        })?
        .permissions()
        .mode()
        & 0o7777;
    if actual != mode & 0o7777 {
        return Err(SinkWriteError::ModeMismatch {
            path: path.to_path_buf(),
            expected: mode,
            actual,
        });
    }

    Ok(())
}
