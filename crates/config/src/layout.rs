//! Fixed on-disk structure under the data root
//!
//! The native side reads these same paths, so none of the file names are
//! configurable. Only the root moves.

use std::path::{Path, PathBuf};

pub const CODEPUSH_DIR: &str = "codepush";
pub const CURRENT_PACKAGE_FILE: &str = "currentPackage.json";
pub const PREVIOUS_PACKAGE_FILE: &str = "oldPackage.json";
pub const DOWNLOAD_DIR: &str = "download";
pub const DOWNLOAD_ARCHIVE_FILE: &str = "update.zip";
pub const UNZIPPED_DIR: &str = "unzipped";
pub const VERSIONS_DIR: &str = "deploy/versions";
pub const HOST_STATE_FILE: &str = "hostState.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    #[must_use]
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            root: data_root.into(),
        }
    }

    #[must_use]
    pub fn data_root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn codepush_dir(&self) -> PathBuf {
        self.root.join(CODEPUSH_DIR)
    }

    #[must_use]
    pub fn current_metadata(&self) -> PathBuf {
        self.codepush_dir().join(CURRENT_PACKAGE_FILE)
    }

    #[must_use]
    pub fn previous_metadata(&self) -> PathBuf {
        self.codepush_dir().join(PREVIOUS_PACKAGE_FILE)
    }

    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        self.codepush_dir().join(DOWNLOAD_DIR)
    }

    #[must_use]
    pub fn download_archive(&self) -> PathBuf {
        self.download_dir().join(DOWNLOAD_ARCHIVE_FILE)
    }

    /// Scratch directory the archive is extracted into
    #[must_use]
    pub fn unzipped_dir(&self) -> PathBuf {
        self.download_dir().join(UNZIPPED_DIR)
    }

    #[must_use]
    pub fn versions_dir(&self) -> PathBuf {
        self.codepush_dir().join(VERSIONS_DIR)
    }

    /// Generation directory for a package hash
    #[must_use]
    pub fn version_dir(&self, package_hash: &str) -> PathBuf {
        self.versions_dir().join(package_hash)
    }

    /// State file of the reference host bridge
    #[must_use]
    pub fn host_state(&self) -> PathBuf {
        self.codepush_dir().join(HOST_STATE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_codepush_dir() {
        let layout = Layout::new("/data");
        assert_eq!(
            layout.current_metadata(),
            PathBuf::from("/data/codepush/currentPackage.json")
        );
        assert_eq!(
            layout.previous_metadata(),
            PathBuf::from("/data/codepush/oldPackage.json")
        );
        assert_eq!(
            layout.download_archive(),
            PathBuf::from("/data/codepush/download/update.zip")
        );
        assert_eq!(
            layout.unzipped_dir(),
            PathBuf::from("/data/codepush/download/unzipped")
        );
        assert_eq!(
            layout.version_dir("abc"),
            PathBuf::from("/data/codepush/deploy/versions/abc")
        );
    }
}
