//! Archive extraction

use async_trait::async_trait;
use hotswap_errors::PlatformError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::task;

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Unpack `archive` into `dest`. `dest` is created if missing.
    async fn unzip(&self, archive: &Path, dest: &Path) -> Result<(), PlatformError>;
}

/// Zip archives, the format update packages are served in
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

#[async_trait]
impl Extractor for ZipExtractor {
    async fn unzip(&self, archive: &Path, dest: &Path) -> Result<(), PlatformError> {
        extract_zip(archive.to_path_buf(), dest.to_path_buf()).await
    }
}

async fn extract_zip(archive_path: PathBuf, dest_dir: PathBuf) -> Result<(), PlatformError> {
    task::spawn_blocking(move || {
        let file = File::open(&archive_path).map_err(|e| failed(format!("open archive: {e}")))?;

        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| failed(format!("read zip archive: {e}")))?;

        std::fs::create_dir_all(&dest_dir)
            .map_err(|e| failed(format!("create {}: {e}", dest_dir.display())))?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| failed(format!("read zip entry: {e}")))?;

            // Entries escaping the destination are skipped
            let Some(relative) = entry.enclosed_name() else {
                tracing::warn!(name = entry.name(), "skipping unsafe zip entry");
                continue;
            };
            let outpath = dest_dir.join(relative);

            if entry.is_dir() {
                std::fs::create_dir_all(&outpath)
                    .map_err(|e| failed(format!("create directory: {e}")))?;
                continue;
            }

            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| failed(format!("create parent directory: {e}")))?;
            }
            let mut outfile =
                File::create(&outpath).map_err(|e| failed(format!("create file: {e}")))?;
            std::io::copy(&mut entry, &mut outfile)
                .map_err(|e| failed(format!("extract file: {e}")))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
                }
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| failed(format!("task join error: {e}")))?
}

fn failed(message: String) -> PlatformError {
    PlatformError::ExtractionFailed { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn unzips_nested_entries() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("update.zip");
        write_zip(
            &archive,
            &[("index.js", b"main"), ("assets/img/logo.png", b"png")],
        );

        let dest = temp.path().join("unzipped");
        ZipExtractor.unzip(&archive, &dest).await.unwrap();

        assert_eq!(std::fs::read(dest.join("index.js")).unwrap(), b"main");
        assert_eq!(
            std::fs::read(dest.join("assets/img/logo.png")).unwrap(),
            b"png"
        );
    }

    #[tokio::test]
    async fn non_archive_is_extraction_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("update.zip");
        std::fs::write(&archive, b"<html>not a zip</html>").unwrap();

        let err = ZipExtractor
            .unzip(&archive, &temp.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::ExtractionFailed { .. }));
    }
}
