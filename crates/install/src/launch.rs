use hotswap_types::PackageMetadata;

/// What the host is running after launch reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchState {
    /// No update installed; the binary's own content runs
    NoPackage,
    /// First launch of the current generation; it still has to confirm
    FirstRun(PackageMetadata),
    Running(PackageMetadata),
    /// The current generation failed and was replaced by `restored`
    /// (`None` means the binary's own content)
    RolledBack {
        failed: PackageMetadata,
        restored: Option<PackageMetadata>,
    },
}

impl LaunchState {
    #[must_use]
    pub fn package(&self) -> Option<&PackageMetadata> {
        match self {
            Self::NoPackage => None,
            Self::FirstRun(package) | Self::Running(package) => Some(package),
            Self::RolledBack { restored, .. } => restored.as_ref(),
        }
    }
}
