#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Host-side collaborators for the hotswap engine.
//!
//! This crate provides:
//! - Filesystem helpers used by the deploy and state stages
//! - The narrow interfaces to the native layer (`NativeBridge`,
//!   `ConfirmationProbe`) and to archive extraction (`Extractor`)
//! - A zip extractor and a file-backed reference host used by the CLI
//!
//! The engine never reaches past these traits; the real binary swap and
//! confirmation timer live behind them.

pub mod bridge;
pub mod extract;
pub mod fs;
pub mod host;

pub use bridge::{ConfirmationProbe, NativeBridge, PreInstallVerdict};
pub use extract::{Extractor, ZipExtractor};
pub use host::{HostBridge, LaunchReport};
