use crate::manifest::{self, CandidateKind};
use hotswap_config::Layout;
use hotswap_errors::{Error, InstallError};
use hotswap_events::{AppEvent, DeployEvent, EventEmitter, EventSender, FailureContext};
use hotswap_platform::fs;
use hotswap_types::{DeploymentKind, PackageMetadata};
use std::path::{Component, Path, PathBuf};

/// A finalized generation directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub path: PathBuf,
    pub kind: DeploymentKind,
    /// Tree the diff was applied on top of
    pub base: Option<PathBuf>,
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct DeploymentEngine {
    versions_dir: PathBuf,
    binary_base: Option<PathBuf>,
    tx: Option<EventSender>,
}

impl EventEmitter for DeploymentEngine {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl DeploymentEngine {
    #[must_use]
    pub fn new(layout: &Layout) -> Self {
        Self {
            versions_dir: layout.versions_dir(),
            binary_base: None,
            tx: None,
        }
    }

    /// Content shipped in the native binary, used as the diff base when no
    /// package is installed yet
    #[must_use]
    pub fn with_binary_base(mut self, base: Option<PathBuf>) -> Self {
        self.binary_base = base;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn generation_dir(&self, package_hash: &str) -> PathBuf {
        self.versions_dir.join(package_hash)
    }

    /// Build the generation directory for `package_hash` from `candidate`.
    ///
    /// Metadata is never touched here. On failure the generation directory may
    /// be left partially populated; it is never promoted.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::DeploymentFailed` if any copy or delete step
    /// fails, if the diff manifest is invalid, or if `package_hash` is the
    /// generation currently installed.
    pub async fn deploy(
        &self,
        candidate: &Path,
        package_hash: &str,
        current: Option<&PackageMetadata>,
    ) -> Result<Deployment, Error> {
        match self.run(candidate, package_hash, current).await {
            Ok(deployment) => {
                self.emit(AppEvent::Deploy(DeployEvent::Completed {
                    package_hash: package_hash.to_string(),
                    kind: deployment.kind,
                    path: deployment.path.clone(),
                }));
                Ok(deployment)
            }
            Err(err) => {
                self.emit(AppEvent::Deploy(DeployEvent::Failed {
                    package_hash: package_hash.to_string(),
                    failure: FailureContext::from_error(&err),
                }));
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        candidate: &Path,
        package_hash: &str,
        current: Option<&PackageMetadata>,
    ) -> Result<Deployment, Error> {
        if package_hash.is_empty() {
            return Err(failed("package hash is empty"));
        }
        if current.is_some_and(|c| c.package_hash == package_hash) {
            return Err(failed(format!(
                "{package_hash} is the installed generation"
            )));
        }

        let target = self.generation_dir(package_hash);
        let kind = manifest::detect(candidate).await?;

        let (base, deletions) = match kind {
            CandidateKind::Clean => (None, Vec::new()),
            CandidateKind::Diff(manifest) => match self.diff_base(current) {
                Some(base) => (Some(base), manifest.deleted_files),
                None => {
                    self.emit_warning_with_context(
                        "diff package with nothing to diff against; deploying it clean",
                        package_hash,
                    );
                    (None, Vec::new())
                }
            },
        };
        let deployment_kind = if base.is_some() {
            DeploymentKind::Diff
        } else {
            DeploymentKind::Clean
        };

        self.emit(AppEvent::Deploy(DeployEvent::Started {
            package_hash: package_hash.to_string(),
            kind: deployment_kind,
        }));
        tracing::debug!(package_hash, kind = %deployment_kind, target = %target.display(), "deploying");

        // Fresh directory; stale content from an abandoned attempt must not leak in
        fs::ensure_empty_dir(&target)
            .await
            .map_err(|e| failed(format!("prepare {}: {e}", target.display())))?;

        if let Some(base) = &base {
            fs::copy_directory(base, &target)
                .await
                .map_err(|e| failed(format!("copy base {}: {e}", base.display())))?;
            self.emit(AppEvent::Deploy(DeployEvent::BaseCopied {
                package_hash: package_hash.to_string(),
                base: base.clone(),
            }));
        }

        fs::copy_directory(candidate, &target)
            .await
            .map_err(|e| failed(format!("copy candidate: {e}")))?;

        let removed = remove_entries(&target, &deletions).await?;
        if !deletions.is_empty() {
            self.emit(AppEvent::Deploy(DeployEvent::FilesRemoved {
                package_hash: package_hash.to_string(),
                count: removed,
            }));
        }

        Ok(Deployment {
            path: target,
            kind: deployment_kind,
            base,
            removed,
        })
    }

    fn diff_base(&self, current: Option<&PackageMetadata>) -> Option<PathBuf> {
        match current {
            Some(current) => Some(current.local_path.clone()),
            None => self.binary_base.clone(),
        }
    }
}

/// Apply the deletion list. Paths already absent are fine.
async fn remove_entries(root: &Path, deletions: &[String]) -> Result<usize, Error> {
    let mut removed = 0;
    for entry in deletions {
        let relative = sanitize(entry)?;
        let path = root.join(relative);
        if fs::exists(&path).await {
            fs::remove_path(&path)
                .await
                .map_err(|e| failed(format!("delete {entry}: {e}")))?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn sanitize(entry: &str) -> Result<PathBuf, Error> {
    let trimmed = entry.trim_start_matches('/');
    let path = Path::new(trimmed);
    let safe = !trimmed.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(path.to_path_buf())
    } else {
        Err(failed(format!("refusing to delete {entry:?} outside the package")))
    }
}

fn failed(message: impl Into<String>) -> Error {
    InstallError::DeploymentFailed {
        message: message.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_leading_slash_and_rejects_parent() {
        assert_eq!(sanitize("/www/a.js").unwrap(), PathBuf::from("www/a.js"));
        assert!(sanitize("../etc/passwd").is_err());
        assert!(sanitize("www/../../x").is_err());
        assert!(sanitize("").is_err());
    }
}
