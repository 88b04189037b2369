#![allow(dead_code)]

use async_trait::async_trait;
use hotswap_config::Layout;
use hotswap_errors::{Error, NetworkError, PlatformError};
use hotswap_install::{Collaborators, InstallOrchestrator};
use hotswap_net::{UpdateClient, UpdateQuery};
use hotswap_platform::{ConfirmationProbe, NativeBridge, PreInstallVerdict, ZipExtractor};
use hotswap_sync::{SyncCoordinator, UpdatePrompt};
use hotswap_types::{InstallDefaults, InstallMode, RemotePackage, UpdateCheckResponse};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use zip::write::SimpleFileOptions;

pub const APP_VERSION: &str = "1.0.0";

/// Scripted update server
pub struct FakeClient {
    pub response: Mutex<UpdateCheckResponse>,
    /// url -> archive entries
    pub packages: Mutex<HashMap<String, Vec<(String, Vec<u8>)>>>,
    pub archive_path: PathBuf,
    pub queries: Mutex<Vec<UpdateQuery>>,
    pub downloads: Mutex<Vec<String>>,
    /// When set, the update check waits for a permit
    pub gate: Option<Arc<Notify>>,
}

impl FakeClient {
    pub fn offer(&self, hash: &str, is_mandatory: bool, entries: &[(&str, &[u8])]) {
        let url = format!("https://cdn.example.com/{hash}.zip");
        *self.response.lock().unwrap() = UpdateCheckResponse {
            is_available: true,
            app_version: APP_VERSION.into(),
            is_mandatory,
            label: format!("label-{hash}"),
            description: String::new(),
            package_hash: hash.into(),
            package_size: 64,
            download_url: url.clone(),
            update_app_version: false,
        };
        self.packages.lock().unwrap().insert(
            url,
            entries
                .iter()
                .map(|(name, data)| ((*name).to_string(), data.to_vec()))
                .collect(),
        );
    }

    pub fn queries(&self) -> Vec<UpdateQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpdateClient for FakeClient {
    async fn check_for_update(&self, query: &UpdateQuery) -> Result<UpdateCheckResponse, Error> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.response.lock().unwrap().clone())
    }

    async fn download(&self, url: &str) -> Result<PathBuf, Error> {
        self.downloads.lock().unwrap().push(url.to_string());
        if !url.starts_with("https://") {
            return Err(NetworkError::InvalidUrl(url.to_string()).into());
        }
        let entries = self.packages.lock().unwrap().get(url).cloned().ok_or_else(|| {
            NetworkError::DownloadFailed {
                url: url.to_string(),
                message: "HTTP 404".into(),
            }
        })?;
        write_zip(&self.archive_path, &entries);
        Ok(self.archive_path.clone())
    }
}

#[derive(Default)]
pub struct FakeBridge {
    pub commits: Mutex<Vec<InstallMode>>,
    pub reject_with: Mutex<Option<String>>,
    pub failed_hashes: Mutex<HashSet<String>>,
}

#[async_trait]
impl NativeBridge for FakeBridge {
    async fn pre_install(&self, _generation: &Path) -> Result<PreInstallVerdict, PlatformError> {
        Ok(match self.reject_with.lock().unwrap().clone() {
            Some(reason) => PreInstallVerdict::Rejected { reason },
            None => PreInstallVerdict::Accepted,
        })
    }

    async fn commit(
        &self,
        _generation: &Path,
        _rollback_timeout: Option<Duration>,
        install_mode: InstallMode,
    ) -> Result<(), PlatformError> {
        self.commits.lock().unwrap().push(install_mode);
        Ok(())
    }

    async fn reload(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn notify_ready(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}

#[async_trait]
impl ConfirmationProbe for FakeBridge {
    async fn is_first_run(&self, _package_hash: &str) -> bool {
        false
    }

    async fn is_failed_update(&self, package_hash: &str) -> bool {
        self.failed_hashes.lock().unwrap().contains(package_hash)
    }

    async fn is_pending(&self, _package_hash: &str) -> bool {
        false
    }
}

/// Answers every prompt the same way
pub struct FixedPrompt {
    pub accept: bool,
    pub asked: Mutex<Vec<String>>,
}

#[async_trait]
impl UpdatePrompt for FixedPrompt {
    async fn confirm(&self, package: &RemotePackage) -> bool {
        self.asked.lock().unwrap().push(package.package_hash.clone());
        self.accept
    }
}

pub struct Harness {
    pub temp: TempDir,
    pub layout: Layout,
    pub client: Arc<FakeClient>,
    pub bridge: Arc<FakeBridge>,
    pub orchestrator: Arc<InstallOrchestrator>,
}

impl Harness {
    pub fn coordinator(&self) -> SyncCoordinator {
        SyncCoordinator::new(
            self.client.clone(),
            self.orchestrator.clone(),
            APP_VERSION,
            "staging-key",
        )
    }
}

pub fn harness(gate: Option<Arc<Notify>>) -> Harness {
    let temp = TempDir::new().unwrap();
    let layout = Layout::new(temp.path().join("data"));
    let bridge = Arc::new(FakeBridge::default());
    let client = Arc::new(FakeClient {
        response: Mutex::new(UpdateCheckResponse::not_available(APP_VERSION)),
        packages: Mutex::new(HashMap::new()),
        archive_path: layout.download_archive(),
        queries: Mutex::new(Vec::new()),
        downloads: Mutex::new(Vec::new()),
        gate,
    });
    let orchestrator = Arc::new(InstallOrchestrator::new(
        &layout,
        Collaborators {
            extractor: Arc::new(ZipExtractor),
            bridge: bridge.clone(),
            probe: bridge.clone(),
        },
        InstallDefaults::default(),
    ));
    Harness {
        temp,
        layout,
        client,
        bridge,
        orchestrator,
    }
}

pub fn write_zip(path: &Path, entries: &[(String, Vec<u8>)]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, data) in entries {
        zip.start_file(name.as_str(), SimpleFileOptions::default())
            .unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}
