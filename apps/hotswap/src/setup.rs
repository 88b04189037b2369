//! System setup and component initialization

use crate::error::CliError;
use crate::prompt::TerminalPrompt;
use hotswap_config::{Config, Layout};
use hotswap_events::EventSender;
use hotswap_install::{Collaborators, InstallOrchestrator};
use hotswap_net::{HttpUpdateClient, NetClient, NetConfig};
use hotswap_platform::{fs, HostBridge, ZipExtractor};
use hotswap_sync::SyncCoordinator;
use std::sync::Arc;
use tracing::{debug, info};

/// Engine components wired for this host
pub struct AppSetup {
    config: Config,
    layout: Layout,
    host: Arc<HostBridge>,
    orchestrator: Arc<InstallOrchestrator>,
    event_sender: EventSender,
}

impl AppSetup {
    /// Create the data root and build the orchestrator over the host bridge
    pub async fn initialize(config: Config, event_sender: EventSender) -> Result<Self, CliError> {
        let layout = config.layout();
        info!(data_root = %layout.data_root().display(), "initializing hotswap");

        fs::create_dir_all(&layout.codepush_dir()).await?;

        let host = Arc::new(HostBridge::new(layout.host_state()));
        let orchestrator = InstallOrchestrator::new(
            &layout,
            Collaborators {
                extractor: Arc::new(ZipExtractor),
                bridge: host.clone(),
                probe: host.clone(),
            },
            config.install_defaults(),
        )
        .with_binary_base(config.app.binary_content_dir.clone())
        .with_event_sender(event_sender.clone());

        debug!(defaults = ?orchestrator.defaults(), "install defaults");
        Ok(Self {
            config,
            layout,
            host,
            orchestrator: Arc::new(orchestrator),
            event_sender,
        })
    }

    pub fn host(&self) -> &HostBridge {
        &self.host
    }

    pub fn orchestrator(&self) -> &InstallOrchestrator {
        &self.orchestrator
    }

    /// Build the sync coordinator; needs a configured server and deployment key
    pub fn coordinator(&self) -> Result<Arc<SyncCoordinator>, CliError> {
        let server = self.config.server_url()?;
        let deployment_key = self.config.deployment_key()?;

        let net =
            NetClient::new(&NetConfig::default().with_timeout(self.config.request_timeout()))?;
        let client = HttpUpdateClient::new(net, server, self.layout.download_archive())?
            .with_event_sender(self.event_sender.clone());

        let coordinator = SyncCoordinator::new(
            Arc::new(client),
            self.orchestrator.clone(),
            self.config.app.app_version.clone(),
            deployment_key,
        )
        .with_binary_content_dir(self.config.app.binary_content_dir.clone())
        .with_prompt(Arc::new(TerminalPrompt))
        .with_event_sender(self.event_sender.clone());

        Ok(Arc::new(coordinator))
    }
}
