//! Diff manifest shipped inside differential packages

use serde::{Deserialize, Serialize};

/// File name of the manifest at the root of an extracted package.
pub const DIFF_MANIFEST_FILE: &str = "hotcodepush.json";

/// Presence of this manifest marks a package as a diff against the current
/// generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffManifest {
    /// Paths relative to the package root that must not exist after deploy
    #[serde(default)]
    pub deleted_files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentKind {
    Clean,
    Diff,
}

impl std::fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clean => f.write_str("clean"),
            Self::Diff => f.write_str("diff"),
        }
    }
}
