#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the hotswap update engine
//!
//! This crate provides the records and enums shared by every stage: package
//! metadata as persisted on disk, the server's update-check payload, install
//! options, and the sync status vocabulary.

pub mod install;
pub mod manifest;
pub mod package;
pub mod sync;

pub use install::{InstallDefaults, InstallMode, InstallOptions, InstallPhase, ResolvedInstall};
pub use manifest::{DeploymentKind, DiffManifest, DIFF_MANIFEST_FILE};
pub use package::{DownloadedPackage, PackageMetadata, RemotePackage, UpdateCheckResponse};
pub use sync::{SyncState, SyncStatus};
