//! Update check and package download

use async_trait::async_trait;
use futures::StreamExt;
use hotswap_errors::{Error, NetworkError};
use hotswap_events::{EventEmitter, EventSender};
use hotswap_types::UpdateCheckResponse;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::client::NetClient;

/// Parameters of one update check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateQuery {
    pub deployment_key: String,
    pub app_version: String,
    /// Hash of what is running now: the current package, or the binary's own content
    pub package_hash: Option<String>,
}

/// Update server collaborator
#[async_trait]
pub trait UpdateClient: Send + Sync {
    /// Ask the server whether a newer package exists.
    async fn check_for_update(&self, query: &UpdateQuery) -> Result<UpdateCheckResponse, Error>;

    /// Fetch a package archive and return where it was stored.
    async fn download(&self, url: &str) -> Result<PathBuf, Error>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCheckEnvelope {
    update_info: UpdateCheckResponse,
}

/// Update client backed by the HTTP update server
#[derive(Debug, Clone)]
pub struct HttpUpdateClient {
    client: NetClient,
    server: Url,
    archive_path: PathBuf,
    tx: Option<EventSender>,
}

impl EventEmitter for HttpUpdateClient {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl HttpUpdateClient {
    /// `archive_path` is where downloads land; an existing file there is replaced.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidUrl` if `server` does not parse.
    pub fn new(
        client: NetClient,
        server: &str,
        archive_path: impl Into<PathBuf>,
    ) -> Result<Self, Error> {
        let server =
            Url::parse(server).map_err(|e| NetworkError::InvalidUrl(format!("{server}: {e}")))?;
        Ok(Self {
            client,
            server,
            archive_path: archive_path.into(),
            tx: None,
        })
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    fn check_url(&self, query: &UpdateQuery) -> Result<Url, NetworkError> {
        let mut url = self.server.clone();
        url.path_segments_mut()
            .map_err(|()| NetworkError::InvalidUrl(self.server.to_string()))?
            .pop_if_empty()
            .push("updateCheck");
        url.query_pairs_mut()
            .append_pair("deploymentKey", &query.deployment_key)
            .append_pair("appVersion", &query.app_version)
            .append_pair("packageHash", query.package_hash.as_deref().unwrap_or_default())
            .append_pair("isCompanion", "false");
        Ok(url)
    }

    async fn stream_to_file(&self, url: &Url, dest: &Path) -> Result<u64, NetworkError> {
        let download_failed = |message: String| NetworkError::DownloadFailed {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .await
            .map_err(|e| download_failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(download_failed(format!("HTTP {}", response.status())));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| download_failed(e.to_string()))?;
        }
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| download_failed(format!("create {}: {e}", dest.display())))?;

        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| download_failed(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| download_failed(e.to_string()))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| download_failed(e.to_string()))?;
        Ok(written)
    }
}

#[async_trait]
impl UpdateClient for HttpUpdateClient {
    async fn check_for_update(&self, query: &UpdateQuery) -> Result<UpdateCheckResponse, Error> {
        let url = self.check_url(query)?;
        tracing::debug!(%url, "checking for update");

        let response = self.client.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::CheckFailed {
                message: format!("server answered HTTP {status}"),
            }
            .into());
        }

        let body = response.bytes().await.map_err(|e| NetworkError::CheckFailed {
            message: e.to_string(),
        })?;
        let envelope: UpdateCheckEnvelope =
            serde_json::from_slice(&body).map_err(|e| NetworkError::MalformedResponse {
                message: e.to_string(),
            })?;
        envelope.update_info.validate()?;
        Ok(envelope.update_info)
    }

    async fn download(&self, url: &str) -> Result<PathBuf, Error> {
        let parsed =
            Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NetworkError::InvalidUrl(url.to_string()).into());
        }

        self.emit_debug(format!("downloading {parsed}"));
        let bytes = match self.stream_to_file(&parsed, &self.archive_path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                let _ = tokio::fs::remove_file(&self.archive_path).await;
                return Err(err.into());
            }
        };
        tracing::debug!(bytes, path = %self.archive_path.display(), "download complete");
        Ok(self.archive_path.clone())
    }
}
