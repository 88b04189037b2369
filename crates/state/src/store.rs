use hotswap_config::Layout;
use hotswap_errors::{Error, StateError};
use hotswap_events::{AppEvent, EventEmitter, EventSender, StateEvent};
use hotswap_platform::{fs, ConfirmationProbe};
use hotswap_types::PackageMetadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs as tokio_fs;

/// Reads and writes the current and previous package records.
#[derive(Clone)]
pub struct MetadataStore {
    current_path: PathBuf,
    previous_path: PathBuf,
    probe: Option<Arc<dyn ConfirmationProbe>>,
    tx: Option<EventSender>,
}

impl std::fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataStore")
            .field("current_path", &self.current_path)
            .field("previous_path", &self.previous_path)
            .field("has_probe", &self.probe.is_some())
            .finish_non_exhaustive()
    }
}

impl EventEmitter for MetadataStore {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl MetadataStore {
    #[must_use]
    pub fn new(layout: &Layout) -> Self {
        Self {
            current_path: layout.current_metadata(),
            previous_path: layout.previous_metadata(),
            probe: None,
            tx: None,
        }
    }

    /// Fill `isFirstRun`/`failedInstall` from the native layer on every read.
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn ConfirmationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    #[must_use]
    pub fn previous_path(&self) -> &Path {
        &self.previous_path
    }

    /// Read the current record. `None` when nothing has been installed yet.
    ///
    /// # Errors
    ///
    /// Returns `StateError::MetadataCorrupt` if the record exists but does not
    /// parse, or `StateError::MetadataReadFailed` on any other read failure.
    pub async fn read_current(&self) -> Result<Option<PackageMetadata>, Error> {
        self.read_record(&self.current_path).await
    }

    /// Read the previous record. `None` when there is no history.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_current`].
    pub async fn read_previous(&self) -> Result<Option<PackageMetadata>, Error> {
        self.read_record(&self.previous_path).await
    }

    /// Persist `meta` as the current record.
    ///
    /// # Errors
    ///
    /// Returns `StateError::MetadataWriteFailed` if the record cannot be
    /// written. The previous content of the slot is left intact in that case.
    pub async fn write_current(&self, meta: &PackageMetadata) -> Result<(), Error> {
        let mut record = meta.clone();
        // Confirmation flags belong to the native layer
        record.is_first_run = false;
        record.failed_install = false;

        let payload = serde_json::to_vec_pretty(&record)
            .map_err(|e| write_failed(&self.current_path, &e))?;
        fs::atomic_write(&self.current_path, &payload)
            .await
            .map_err(|e| write_failed(&self.current_path, &e))?;

        tracing::debug!(package_hash = %meta.package_hash, "current package record written");
        self.emit(AppEvent::State(StateEvent::CurrentWritten {
            package_hash: meta.package_hash.clone(),
        }));
        Ok(())
    }

    /// Copy the current record into the previous slot.
    ///
    /// A no-op when there is no current record. Calling it twice in a row
    /// leaves the same previous record.
    ///
    /// # Errors
    ///
    /// Returns `StateError::MetadataWriteFailed` if the copy fails.
    pub async fn backup_current_to_previous(&self) -> Result<(), Error> {
        let bytes = match tokio_fs::read(&self.current_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("no current package record to back up");
                return Ok(());
            }
            Err(e) => return Err(read_failed(&self.current_path, &e)),
        };

        fs::atomic_write(&self.previous_path, &bytes)
            .await
            .map_err(|e| write_failed(&self.previous_path, &e))?;

        let package_hash = serde_json::from_slice::<PackageMetadata>(&bytes)
            .map(|meta| meta.package_hash)
            .unwrap_or_default();
        self.emit(AppEvent::State(StateEvent::BackedUp { package_hash }));
        Ok(())
    }

    /// Promote the previous record back to current and empty the previous slot.
    ///
    /// Returns the restored record, or `None` if there was no previous record
    /// (the current slot is left untouched in that case).
    ///
    /// # Errors
    ///
    /// Returns a state error if either slot cannot be read or written.
    pub async fn restore_previous_to_current(&self) -> Result<Option<PackageMetadata>, Error> {
        let Some(previous) = self.read_record(&self.previous_path).await? else {
            return Ok(None);
        };

        self.write_current(&previous).await?;
        fs::remove_path(&self.previous_path)
            .await
            .map_err(|e| write_failed(&self.previous_path, &e))?;

        tracing::info!(package_hash = %previous.package_hash, "previous package restored");
        self.emit(AppEvent::State(StateEvent::Restored {
            package_hash: previous.package_hash.clone(),
        }));
        Ok(Some(previous))
    }

    /// Remove the current record so the binary's own content runs next.
    ///
    /// # Errors
    ///
    /// Returns `StateError::MetadataWriteFailed` if the record cannot be removed.
    pub async fn clear_current(&self) -> Result<(), Error> {
        fs::remove_path(&self.current_path)
            .await
            .map_err(|e| write_failed(&self.current_path, &e))?;
        self.emit(AppEvent::State(StateEvent::CurrentCleared));
        Ok(())
    }

    async fn read_record(&self, path: &Path) -> Result<Option<PackageMetadata>, Error> {
        let bytes = match tokio_fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(read_failed(path, &e)),
        };

        let mut meta: PackageMetadata = match serde_json::from_slice(&bytes) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "package record is corrupt");
                self.emit(AppEvent::State(StateEvent::MetadataCorrupt {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }));
                return Err(StateError::MetadataCorrupt {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
                .into());
            }
        };

        if let Some(probe) = &self.probe {
            meta.is_first_run = probe.is_first_run(&meta.package_hash).await;
            meta.failed_install = probe.is_failed_update(&meta.package_hash).await;
        }
        Ok(Some(meta))
    }
}

fn read_failed(path: &Path, err: &dyn std::fmt::Display) -> Error {
    StateError::MetadataReadFailed {
        path: path.display().to_string(),
        message: err.to_string(),
    }
    .into()
}

fn write_failed(path: &Path, err: &dyn std::fmt::Display) -> Error {
    StateError::MetadataWriteFailed {
        path: path.display().to_string(),
        message: err.to_string(),
    }
    .into()
}
