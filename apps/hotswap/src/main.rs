//! hotswap - over-the-air content updates with automatic rollback
//!
//! CLI host for the update engine. It plays the native side on a desktop
//! host: the reference host bridge keeps the active generation in a state
//! file under the data root.

mod cli;
mod display;
mod error;
mod events;
mod logging;
mod prompt;
mod setup;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::{CommandOutput, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use crate::setup::AppSetup;
use clap::Parser;
use hotswap_config::Config;
use hotswap_errors::Error;
use hotswap_events::EventReceiver;
use hotswap_sync::SyncOptions;
use hotswap_types::InstallOptions;
use std::process;
use std::time::Duration;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if json_mode {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting hotswap v{}", env!("CARGO_PKG_VERSION"));

    // File config (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global);
    config.validate()?;

    let (event_sender, event_receiver) = hotswap_events::channel();
    let setup = AppSetup::initialize(config, event_sender).await?;

    let renderer = OutputRenderer::new(cli.global.json);
    let mut event_handler = EventHandler::new(cli.global.json);

    let output =
        execute_command_with_events(cli.command, &setup, event_receiver, &mut event_handler)
            .await?;
    renderer.render(&output)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    setup: &AppSetup,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<CommandOutput, CliError> {
    let mut command_future = Box::pin(execute_command(command, setup));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(&event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(&event);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, setup: &AppSetup) -> Result<CommandOutput, CliError> {
    match command {
        Commands::Status => {
            let orchestrator = setup.orchestrator();
            let active = setup
                .host()
                .active_generation()
                .await
                .map_err(Error::from)?;
            Ok(CommandOutput::Status {
                current: orchestrator.current_package().await?,
                previous: orchestrator.previous_package().await?,
                active,
            })
        }

        Commands::Sync {
            deployment_key,
            install_mode,
            mandatory_install_mode,
            rollback_timeout_ms,
            prompt,
        } => {
            let mut install = InstallOptions {
                mandatory_install_mode,
                ..InstallOptions::default()
            };
            if let Some(mode) = install_mode {
                install = install.with_install_mode(mode);
            }
            if let Some(ms) = rollback_timeout_ms {
                install = install.with_rollback_timeout(Duration::from_millis(ms));
            }

            let mut options = SyncOptions::default()
                .with_install(install)
                .with_prompt(prompt);
            if let Some(key) = deployment_key {
                options = options.with_deployment_key(key);
            }

            let coordinator = setup.coordinator()?;
            let status = coordinator.sync(options).finish().await?;
            Ok(CommandOutput::Sync(status))
        }

        Commands::Launch => {
            let report = setup.host().launch().await.map_err(Error::from)?;
            let state = setup.orchestrator().reconcile_launch().await?;
            Ok(CommandOutput::Launch { report, state })
        }

        Commands::NotifyReady => {
            setup.orchestrator().notify_application_ready().await?;
            Ok(CommandOutput::Message("Running package confirmed".to_string()))
        }

        Commands::Restart => {
            setup.orchestrator().restart_application().await?;
            Ok(CommandOutput::Message("Reloaded into the pending package".to_string()))
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) {
    if let Some(data_root) = &global.data_root {
        config.paths.data_root = Some(data_root.clone());
    }
}

/// Initialize tracing; `RUST_LOG` always wins over the built-in filters
fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "debug,hotswap=debug"
    } else {
        "warn,hotswap=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        // Keep stdout clean for the JSON result
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}
