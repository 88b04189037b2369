#![allow(dead_code)]

use async_trait::async_trait;
use hotswap_config::Layout;
use hotswap_errors::PlatformError;
use hotswap_install::{Collaborators, InstallOrchestrator};
use hotswap_platform::{ConfirmationProbe, NativeBridge, PreInstallVerdict, ZipExtractor};
use hotswap_types::{DownloadedPackage, InstallDefaults, InstallMode, RemotePackage};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    PreInstall(PathBuf),
    Commit {
        generation: PathBuf,
        rollback_timeout: Option<Duration>,
        install_mode: InstallMode,
    },
    Reload,
    NotifyReady,
}

/// Records every call; verdicts and failures are scripted per test
#[derive(Default)]
pub struct FakeBridge {
    pub calls: Mutex<Vec<BridgeCall>>,
    pub reject_with: Mutex<Option<String>>,
    pub fail_commit: Mutex<bool>,
    pub failed_hashes: Mutex<HashSet<String>>,
    pub first_run_hash: Mutex<Option<String>>,
    pub pending_hash: Mutex<Option<String>>,
}

impl FakeBridge {
    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commits(&self) -> Vec<BridgeCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, BridgeCall::Commit { .. }))
            .collect()
    }

    pub fn mark_failed(&self, hash: &str) {
        self.failed_hashes.lock().unwrap().insert(hash.to_string());
    }
}

#[async_trait]
impl NativeBridge for FakeBridge {
    async fn pre_install(&self, generation: &Path) -> Result<PreInstallVerdict, PlatformError> {
        self.calls
            .lock()
            .unwrap()
            .push(BridgeCall::PreInstall(generation.to_path_buf()));
        Ok(match self.reject_with.lock().unwrap().clone() {
            Some(reason) => PreInstallVerdict::Rejected { reason },
            None => PreInstallVerdict::Accepted,
        })
    }

    async fn commit(
        &self,
        generation: &Path,
        rollback_timeout: Option<Duration>,
        install_mode: InstallMode,
    ) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(BridgeCall::Commit {
            generation: generation.to_path_buf(),
            rollback_timeout,
            install_mode,
        });
        if *self.fail_commit.lock().unwrap() {
            return Err(PlatformError::BridgeCallFailed {
                operation: "commit".into(),
                message: "swap refused".into(),
            });
        }
        Ok(())
    }

    async fn reload(&self) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(BridgeCall::Reload);
        Ok(())
    }

    async fn notify_ready(&self) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(BridgeCall::NotifyReady);
        Ok(())
    }
}

#[async_trait]
impl ConfirmationProbe for FakeBridge {
    async fn is_first_run(&self, package_hash: &str) -> bool {
        self.first_run_hash.lock().unwrap().as_deref() == Some(package_hash)
    }

    async fn is_failed_update(&self, package_hash: &str) -> bool {
        self.failed_hashes.lock().unwrap().contains(package_hash)
    }

    async fn is_pending(&self, package_hash: &str) -> bool {
        self.pending_hash.lock().unwrap().as_deref() == Some(package_hash)
    }
}

pub struct Harness {
    pub temp: TempDir,
    pub layout: Layout,
    pub bridge: Arc<FakeBridge>,
    pub orchestrator: InstallOrchestrator,
}

pub fn harness(defaults: InstallDefaults) -> Harness {
    let temp = TempDir::new().unwrap();
    let layout = Layout::new(temp.path().join("data"));
    let bridge = Arc::new(FakeBridge::default());
    let orchestrator = InstallOrchestrator::new(
        &layout,
        Collaborators {
            extractor: Arc::new(ZipExtractor),
            bridge: bridge.clone(),
            probe: bridge.clone(),
        },
        defaults,
    );
    Harness {
        temp,
        layout,
        bridge,
        orchestrator,
    }
}

pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

pub fn remote(hash: &str) -> RemotePackage {
    RemotePackage {
        app_version: "1.0.0".into(),
        deployment_key: "staging-key".into(),
        label: format!("label-{hash}"),
        description: String::new(),
        is_mandatory: false,
        package_hash: hash.into(),
        package_size: 128,
        download_url: format!("https://cdn.example.com/{hash}.zip"),
    }
}

/// Write an archive for `hash` to the download slot
pub fn downloaded(h: &Harness, hash: &str, entries: &[(&str, &[u8])]) -> DownloadedPackage {
    let archive_path = h.layout.download_archive();
    write_zip(&archive_path, entries);
    DownloadedPackage {
        remote: remote(hash),
        archive_path,
    }
}
