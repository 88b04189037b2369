//! Output rendering for command results

use crate::error::CliError;
use hotswap_install::LaunchState;
use hotswap_platform::LaunchReport;
use hotswap_types::{PackageMetadata, SyncStatus};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;

/// Result of a command, rendered as text or JSON
pub enum CommandOutput {
    Status {
        current: Option<PackageMetadata>,
        previous: Option<PackageMetadata>,
        active: Option<PathBuf>,
    },
    Sync(SyncStatus),
    Launch {
        report: LaunchReport,
        state: LaunchState,
    },
    Message(String),
}

pub struct OutputRenderer {
    json_mode: bool,
}

impl OutputRenderer {
    pub fn new(json_mode: bool) -> Self {
        Self { json_mode }
    }

    pub fn render(&self, output: &CommandOutput) -> Result<(), CliError> {
        let mut stdout = std::io::stdout().lock();
        if self.json_mode {
            writeln!(stdout, "{}", to_json(output))?;
            return Ok(());
        }

        match output {
            CommandOutput::Status {
                current,
                previous,
                active,
            } => {
                writeln!(stdout, "Current:  {}", describe(current.as_ref()))?;
                writeln!(stdout, "Previous: {}", describe(previous.as_ref()))?;
                match active {
                    Some(path) => writeln!(stdout, "Active:   {}", path.display())?,
                    None => writeln!(stdout, "Active:   binary content")?,
                }
            }
            CommandOutput::Sync(status) => writeln!(stdout, "Sync finished: {status}")?,
            CommandOutput::Launch { report, state } => {
                if let Some(hash) = &report.rolled_back {
                    writeln!(stdout, "Reverted unconfirmed package {hash}")?;
                }
                if let Some(hash) = &report.activated {
                    writeln!(stdout, "Activated staged package {hash}")?;
                }
                writeln!(stdout, "{}", describe_launch(state))?;
            }
            CommandOutput::Message(message) => writeln!(stdout, "{message}")?,
        }
        Ok(())
    }
}

fn describe(package: Option<&PackageMetadata>) -> String {
    match package {
        Some(p) if p.label.is_empty() => p.package_hash.clone(),
        Some(p) => format!("{} ({})", p.label, p.package_hash),
        None => "none".to_string(),
    }
}

fn describe_launch(state: &LaunchState) -> String {
    match state {
        LaunchState::NoPackage => "Running binary content".to_string(),
        LaunchState::FirstRun(p) => format!(
            "First run of {}; run notify-ready once healthy",
            describe(Some(p))
        ),
        LaunchState::Running(p) => format!("Running {}", describe(Some(p))),
        LaunchState::RolledBack { failed, restored } => format!(
            "Rolled back {} to {}",
            describe(Some(failed)),
            restored
                .as_ref()
                .map_or_else(|| "binary content".to_string(), |p| describe(Some(p)))
        ),
    }
}

fn to_json(output: &CommandOutput) -> serde_json::Value {
    match output {
        CommandOutput::Status {
            current,
            previous,
            active,
        } => json!({
            "current": current,
            "previous": previous,
            "active": active,
        }),
        CommandOutput::Sync(status) => json!({ "status": status }),
        CommandOutput::Launch { report, state } => {
            let (kind, package) = match state {
                LaunchState::NoPackage => ("no_package", None),
                LaunchState::FirstRun(p) => ("first_run", Some(p)),
                LaunchState::Running(p) => ("running", Some(p)),
                LaunchState::RolledBack { restored, .. } => ("rolled_back", restored.as_ref()),
            };
            json!({
                "state": kind,
                "package": package,
                "reverted": report.rolled_back,
                "activated": report.activated,
                "active": report.active,
            })
        }
        CommandOutput::Message(message) => json!({ "message": message }),
    }
}
