//! TokenGate daemon — entry point for running the verification service.

mod config;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;

use tokengate_connectors::{HttpAssetProvider, RestPlatformApi, WebhookNotifier};
use tokengate_engine::{
    NotificationChannel, OutcomeNote, ProviderError, ReverificationSweeper,
    RoleAssignmentTracker, VerificationOrchestrator,
};
use tokengate_rpc::{RpcServer, RpcState};
use tokengate_store::{
    AssignmentStore, MemoryAssignmentStore, MemoryNonceStore, MemoryRuleStore, RuleStore,
};
use tokengate_store_lmdb::LmdbEnvironment;
use tokengate_types::{ChallengeContext, SubjectId};

use config::DaemonConfig;
use shutdown::ShutdownController;

#[derive(Parser)]
#[command(name = "tokengate-daemon", about = "TokenGate verification service daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port for the HTTP API.
    #[arg(long, env = "TOKENGATE_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Data directory for persistent storage.
    #[arg(long, env = "TOKENGATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Seconds between reverification sweeps.
    #[arg(long, env = "TOKENGATE_SWEEP_INTERVAL_SECS")]
    sweep_interval_secs: Option<u64>,

    /// Run with in-memory stores only.
    #[arg(long, env = "TOKENGATE_EPHEMERAL")]
    ephemeral: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "TOKENGATE_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the service.
    Serve,
}

/// Fallback notifier when no webhook is configured: outcomes land in the
/// logs and nowhere else.
struct LogNotifier;

#[async_trait]
impl NotificationChannel for LogNotifier {
    async fn notify(
        &self,
        subject: &SubjectId,
        _context: &ChallengeContext,
        note: &OutcomeNote,
    ) -> Result<(), ProviderError> {
        tracing::info!(subject = %subject, ?note, "verification outcome");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config: Option<DaemonConfig> = if let Some(ref config_path) = cli.config {
        match DaemonConfig::from_toml_file(config_path) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                eprintln!(
                    "failed to load config file {}: {e}; using defaults",
                    config_path.display()
                );
                None
            }
        }
    } else {
        None
    };

    let mut config = file_config.unwrap_or_default();
    if let Some(port) = cli.rpc_port {
        config.rpc_port = port;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(interval) = cli.sweep_interval_secs {
        config.sweep_interval_secs = interval;
    }
    config.ephemeral = config.ephemeral || cli.ephemeral;
    config.log_level = cli.log_level;

    tokengate_utils::init_tracing_with_level(&config.log_level);

    match cli.command {
        Command::Serve => serve(config).await,
    }
}

async fn serve(config: DaemonConfig) -> anyhow::Result<()> {
    tracing::info!(
        rpc_port = config.rpc_port,
        ephemeral = config.ephemeral,
        sweep_every = %tokengate_utils::format_duration(config.sweep_interval_secs),
        "starting TokenGate daemon"
    );

    // Storage. Nonces are in-memory by design (they die with the process);
    // rules and assignments persist unless running ephemeral.
    let params = config.engine_params();
    let nonce_store = Arc::new(MemoryNonceStore::new(params.nonce_capacity));

    let (rule_store, assignment_store): (Arc<dyn RuleStore>, Arc<dyn AssignmentStore>) =
        if config.ephemeral {
            (
                Arc::new(MemoryRuleStore::new()),
                Arc::new(MemoryAssignmentStore::new()),
            )
        } else {
            let env = LmdbEnvironment::open(&config.data_dir)?;
            (Arc::new(env.rule_store()), Arc::new(env.assignment_store()))
        };

    // External collaborators.
    let assets = Arc::new(HttpAssetProvider::new(
        config.asset_provider_url.clone(),
        config.asset_api_key.clone(),
    ));
    let platform = Arc::new(RestPlatformApi::new(
        config.platform_api_url.clone(),
        config.platform_token.clone(),
    ));
    let notifier: Arc<dyn NotificationChannel> = match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(LogNotifier),
    };

    let orchestrator = Arc::new(VerificationOrchestrator::new(
        &params,
        nonce_store,
        rule_store.clone(),
        RoleAssignmentTracker::new(assignment_store.clone()),
        assets.clone(),
        platform.clone(),
        notifier,
    ));

    let sweeper = ReverificationSweeper::new(
        rule_store,
        RoleAssignmentTracker::new(assignment_store),
        assets,
        platform,
    );

    let shutdown = Arc::new(ShutdownController::new());

    // Signal handler.
    let signal_controller = Arc::clone(&shutdown);
    tokio::spawn(async move {
        signal_controller.wait_for_signal().await;
    });

    // Reverification sweep loop.
    let mut sweep_shutdown_rx = shutdown.subscribe();
    let sweep_interval = config.sweep_interval_secs;
    let sweep_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval.max(1)));
        // The first tick fires immediately; skip it so a restart storm
        // doesn't hammer the asset provider.
        interval.tick().await;
        loop {
            tokio::select! {
                _ = sweep_shutdown_rx.recv() => {
                    tracing::info!("reverification sweep loop shutting down");
                    break;
                }
                _ = interval.tick() => {
                    sweeper.run_once().await;
                }
            }
        }
    });

    // HTTP API, foreground until shutdown.
    let server = RpcServer::new(config.rpc_port, Arc::new(RpcState::new(orchestrator)));
    let mut server_shutdown_rx = shutdown.subscribe();
    tokio::select! {
        result = server.start() => result?,
        _ = server_shutdown_rx.recv() => {
            tracing::info!("rpc server shutting down");
        }
    }

    shutdown.shutdown();
    let _ = sweep_handle.await;
    tracing::info!("TokenGate daemon exited cleanly");
    Ok(())
}
