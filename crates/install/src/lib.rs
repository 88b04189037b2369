#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Install orchestration for hotswap
//!
//! Turns a downloaded archive into the running generation:
//! unzip, deploy, record metadata, native pre-install check, native commit.
//! Every step is fallible and the first failure ends the attempt with the
//! error of the stage that produced it.
//!
//! The orchestrator also owns the post-commit primitives used by the host:
//! the resume gate for `ON_NEXT_RESUME` installs, launch reconciliation
//! (rollback of a failed generation) and the readiness signal.

mod launch;
mod orchestrator;
mod resume;

pub use launch::LaunchState;
pub use orchestrator::{Collaborators, InstallOrchestrator, InstallOutcome};
pub use resume::ResumeOutcome;

pub use hotswap_events::EventSender;
