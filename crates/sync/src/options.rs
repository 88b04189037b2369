use hotswap_types::InstallOptions;

/// Per-call sync options
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Merged over the orchestrator's install defaults
    pub install: InstallOptions,
    /// Overrides the configured deployment key for this sync only
    pub deployment_key: Option<String>,
    /// Ask the [`UpdatePrompt`](crate::UpdatePrompt) before downloading
    pub prompt_user: bool,
}

impl SyncOptions {
    #[must_use]
    pub fn with_install(mut self, install: InstallOptions) -> Self {
        self.install = install;
        self
    }

    #[must_use]
    pub fn with_deployment_key(mut self, key: impl Into<String>) -> Self {
        self.deployment_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt_user: bool) -> Self {
        self.prompt_user = prompt_user;
        self
    }
}
