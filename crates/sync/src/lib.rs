#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Sync coordination for hotswap
//!
//! A sync is check, then download, then install, reported as a linear
//! sequence of [`SyncStatus`](hotswap_types::SyncStatus) values. Only one sync
//! runs at a time; a caller arriving while one is in flight gets a single
//! `SYNC_IN_PROGRESS` and nothing else.

mod coordinator;
mod options;
mod prompt;
mod stream;

pub use coordinator::SyncCoordinator;
pub use options::SyncOptions;
pub use prompt::UpdatePrompt;
pub use stream::SyncStream;
