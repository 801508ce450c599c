//! Crash-safe file replacement and backups.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Replace `path` with `data` via a temp file in the same directory.
///
/// The temp file is fsynced and renamed over the target, so readers see
/// either the old contents or the new contents, never a mix. Parent
/// directories are created as needed. On failure the temp file is removed
/// and the target is untouched. When `path` is a symlink the file it points
/// to is replaced and the link itself is kept.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let resolved = resolve_target(path)?;
    let path = resolved.as_path();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;
    let temp_name = format!(
        ".{}.tmp-{}",
        file_name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    );
    let temp_path = path.with_file_name(temp_name);

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        // Keep the permissions of the file being replaced.
        let mode = fs::metadata(path)
            .map(|meta| std::os::unix::fs::PermissionsExt::mode(&meta.permissions()) & 0o7777)
            .unwrap_or(0o644);
        options.mode(mode);
    }

    let write_result = (|| -> std::io::Result<()> {
        let mut temp_file = options.open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    Ok(())
}

/// Follow symlinks for an existing `path`; a missing path is used as given.
fn resolve_target(path: &Path) -> std::io::Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(err) => Err(err),
    }
}

/// Sibling backup path stamped with `at`, at minute resolution.
///
/// `config` loaded at 2026-10-19 14:05 maps to `config.202610191405.bak`.
/// When that name is taken a counter is appended so earlier backups from
/// the same minute survive.
pub fn backup_path(path: &Path, at: DateTime<Local>) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());
    let stamp = at.format("%Y%m%d%H%M");
    let base = path.with_file_name(format!("{file_name}.{stamp}.bak"));
    if !base.exists() {
        return base;
    }
    (1u32..)
        .map(|n| path.with_file_name(format!("{file_name}.{stamp}.bak.{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}

/// Write `contents` to a fresh backup next to `path` and return its location.
///
/// Never overwrites an existing file.
pub fn write_backup(path: &Path, contents: &[u8], at: DateTime<Local>) -> std::io::Result<PathBuf> {
    let backup = backup_path(path, at);
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&backup)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(backup)
}
