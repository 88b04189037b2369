//! Filesystem convenience helpers.
//!
//! All helpers return `hotswap_errors::Error` with the offending path attached.

use hotswap_errors::Error;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Result type for filesystem operations
pub type Result<T> = std::result::Result<T, Error>;

/// Recursively copy `src` into `dst`, overwriting what is already there.
///
/// Existing entries in `dst` that `src` does not mention are left alone, so
/// this doubles as the overlay step of a diff deployment. When a path is a
/// file on one side and a directory on the other, the `src` shape wins.
///
/// # Errors
///
/// Returns an error if reading `src` or writing any entry under `dst` fails.
pub async fn copy_directory(src: &Path, dst: &Path) -> Result<()> {
    create_dir_all(dst).await?;

    let mut entries = fs::read_dir(src)
        .await
        .map_err(|e| Error::io_with_path(&e, src))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(&e, src))?
    {
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        let metadata = fs::metadata(&src_path)
            .await
            .map_err(|e| Error::io_with_path(&e, &src_path))?;
        let existing = fs::symlink_metadata(&dst_path).await.ok();

        if metadata.is_dir() {
            if existing.as_ref().is_some_and(|m| !m.is_dir()) {
                remove_path(&dst_path).await?;
            }
            Box::pin(copy_directory(&src_path, &dst_path)).await?;
        } else {
            if existing.as_ref().is_some_and(std::fs::Metadata::is_dir) {
                remove_path(&dst_path).await?;
            }
            fs::copy(&src_path, &dst_path)
                .await
                .map_err(|e| Error::io_with_path(&e, &dst_path))?;
        }
    }

    Ok(())
}

/// Create a directory with all parent directories
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))
}

/// Check if a path exists
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Remove a file or directory tree. A missing path is not an error.
///
/// # Errors
///
/// Returns an error if the path exists and cannot be removed.
pub async fn remove_path(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io_with_path(&e, path)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io_with_path(&e, path)),
    }
}

/// Ensure a directory exists and is empty
///
/// # Errors
///
/// Returns an error if:
/// - Directory removal fails
/// - Directory creation fails
pub async fn ensure_empty_dir(path: &Path) -> Result<()> {
    remove_path(path).await?;
    create_dir_all(path).await
}

/// Write `contents` to `path` atomically.
///
/// Data goes to a sibling temp file first and is renamed over `path`, so a
/// reader sees either the old file or the new one and never a torn write.
///
/// # Errors
///
/// Returns an error if the temp file cannot be written or renamed.
pub async fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).await?;
    }

    let tmp = temp_sibling(path);
    fs::write(&tmp, contents)
        .await
        .map_err(|e| Error::io_with_path(&e, &tmp))?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(Error::io_with_path(&e, path));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
