//! Whole-tree hashing
//!
//! A tree hash is the hash of a sorted manifest with one `path:hash` line per
//! regular file. Paths use `/` separators so the value is stable across hosts.

use crate::Hash;
use hotswap_errors::Error;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Build the sorted `relative/path:hexhash` manifest for a directory.
///
/// # Errors
/// Returns an error if the directory cannot be walked or a file cannot be read.
pub async fn tree_manifest(root: &Path) -> Result<Vec<String>, Error> {
    let mut lines = Vec::new();
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &dir))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io_with_path(&e, &dir))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Error::io_with_path(&e, &path))?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let hash = Hash::hash_file(&path).await?;
                lines.push(format!("{}:{}", relative_name(root, &path), hash.to_hex()));
            }
        }
    }

    lines.sort_unstable();
    Ok(lines)
}

/// Hash a directory tree.
///
/// # Errors
/// Returns an error if the directory cannot be walked or a file cannot be read.
pub async fn hash_directory(root: &Path) -> Result<Hash, Error> {
    let manifest = tree_manifest(root).await?;
    Ok(Hash::from_data(manifest.join("\n").as_bytes()))
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
