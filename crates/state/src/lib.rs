#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package metadata store for hotswap
//!
//! Two JSON records under the data root describe what is installed: the
//! current package and the one it replaced. Every write is atomic, so a crash
//! at any point leaves either the old record or the new one on disk.

mod store;

pub use store::MetadataStore;
