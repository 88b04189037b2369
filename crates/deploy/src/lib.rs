#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Deployment engine for hotswap
//!
//! Turns an unpacked candidate directory into a finalized generation
//! directory under `deploy/versions/<packageHash>`. A candidate carrying a
//! diff manifest is reconciled against a base tree; anything else is copied
//! as is.

mod engine;
mod manifest;

pub use engine::{Deployment, DeploymentEngine};
pub use manifest::{detect, CandidateKind};
