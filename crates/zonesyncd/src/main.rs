// # zonesyncd - zone mirror daemon and CLI
//
// Thin integration layer: reads configuration, installs logging, wires the
// Route 53 provider and a record store into `ZoneSyncEngine`, then runs one
// subcommand. All reconciliation and mutation logic lives in zonesync-core.
//
// ## Configuration
//
// Every flag falls back to an environment variable:
//
// ### Provider
// - `ZONESYNC_AWS_ACCESS_KEY_ID`: AWS access key id
// - `ZONESYNC_AWS_SECRET_ACCESS_KEY`: AWS secret access key
// - `ZONESYNC_AWS_SESSION_TOKEN`: session token (optional)
// - `ZONESYNC_ENDPOINT`: Route 53 endpoint override (optional)
//
// ### Record Store
// - `ZONESYNC_STORE_TYPE`: file or memory
// - `ZONESYNC_STORE_PATH`: path to the store file (for file store)
//
// ### Engine
// - `ZONESYNC_PROVIDER_TIMEOUT_SECS`: bound on a single provider call
// - `ZONESYNC_SYNC_INTERVAL_SECS`: interval between passes in daemon mode
// - `ZONESYNC_ACTOR`: actor recorded on created rows
// - `ZONESYNC_CHANGE_COMMENT`: comment attached to change batches
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export ZONESYNC_AWS_ACCESS_KEY_ID=AKIA...
// export ZONESYNC_AWS_SECRET_ACCESS_KEY=...
// export ZONESYNC_STORE_PATH=/var/lib/zonesync/state.json
//
// zonesyncd daemon
// zonesyncd create-record 1 www.example.com. A 192.0.2.1 --ttl 300
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::config::DEFAULT_CHANGE_COMMENT;
use zonesync_core::model::{RecordKind, StateFilter};
use zonesync_core::{
    EngineConfig, EngineEvent, ProviderConfig, ProviderRegistry, RecordInput, RecordStore,
    StoreConfig, ZoneProvider, ZoneSyncConfig, ZoneSyncEngine,
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Time allowed for the engine to stop after a shutdown signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum ZoneSyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<ZoneSyncExitCode> for ExitCode {
    fn from(code: ZoneSyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser)]
#[command(name = "zonesyncd")]
#[command(about = "Mirror Route 53 hosted zones into a local record store", long_about = None)]
#[command(version)]
struct Cli {
    /// AWS access key id
    #[arg(long, env = "ZONESYNC_AWS_ACCESS_KEY_ID", hide_env_values = true)]
    access_key_id: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "ZONESYNC_AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    /// AWS session token for temporary credentials
    #[arg(long, env = "ZONESYNC_AWS_SESSION_TOKEN", hide_env_values = true)]
    session_token: Option<String>,

    /// Route 53 endpoint override
    #[arg(long, env = "ZONESYNC_ENDPOINT")]
    endpoint: Option<String>,

    /// Record store type (file, memory)
    #[arg(long, env = "ZONESYNC_STORE_TYPE", default_value = "file")]
    store_type: String,

    /// Path to the record store file
    #[arg(
        long,
        env = "ZONESYNC_STORE_PATH",
        default_value = "/var/lib/zonesync/state.json"
    )]
    store_path: String,

    /// Upper bound on a single provider call, in seconds
    #[arg(long, env = "ZONESYNC_PROVIDER_TIMEOUT_SECS", default_value_t = 30)]
    provider_timeout_secs: u64,

    /// Interval between reconciliation passes in daemon mode, in seconds
    #[arg(long, env = "ZONESYNC_SYNC_INTERVAL_SECS", default_value_t = 300)]
    sync_interval_secs: u64,

    /// Actor recorded on rows this invocation creates
    #[arg(long, env = "ZONESYNC_ACTOR", default_value = "zonesync")]
    actor: String,

    /// Comment attached to every submitted change batch
    #[arg(long, env = "ZONESYNC_CHANGE_COMMENT", default_value = DEFAULT_CHANGE_COMMENT)]
    change_comment: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ZONESYNC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass over every provider zone
    Sync,

    /// Reconcile periodically until SIGINT/SIGTERM
    Daemon,

    /// List active zones in the record store
    ListZones,

    /// List active records of a zone
    ListRecords {
        /// Local zone id
        zone_id: u64,
    },

    /// Create a hosted zone
    CreateZone {
        /// Zone name (e.g. example.com)
        name: String,
    },

    /// Delete a hosted zone
    DeleteZone {
        /// Local zone id
        zone_id: u64,
    },

    /// Create a record set
    CreateRecord {
        /// Local zone id
        zone_id: u64,

        /// Record name (e.g. www.example.com.)
        name: String,

        /// Record type (A, AAAA, CNAME, MX, NS, PTR, SOA, SPF, SRV, TXT)
        kind: RecordKind,

        /// One or more record values
        #[arg(required = true)]
        values: Vec<String>,

        /// TTL in seconds (default: engine default TTL)
        #[arg(long)]
        ttl: Option<u32>,
    },

    /// Delete a record set
    DeleteRecord {
        /// Local record id
        record_id: u64,
    },

    /// Show the propagation status of a recorded change
    ChangeStatus {
        /// Local change id
        change_id: u64,
    },
}

impl Cli {
    /// Build the library configuration from flags and environment
    fn to_config(&self) -> Result<ZoneSyncConfig> {
        let store = match self.store_type.as_str() {
            "file" => StoreConfig::File {
                path: self.store_path.clone(),
            },
            "memory" => StoreConfig::Memory,
            other => anyhow::bail!(
                "ZONESYNC_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                other
            ),
        };

        Ok(ZoneSyncConfig {
            provider: ProviderConfig::Route53 {
                access_key_id: self.access_key_id.clone().unwrap_or_default(),
                secret_access_key: self.secret_access_key.clone().unwrap_or_default(),
                session_token: self.session_token.clone().filter(|t| !t.is_empty()),
                endpoint: self.endpoint.clone().filter(|e| !e.is_empty()),
            },
            store,
            engine: EngineConfig {
                provider_timeout_secs: self.provider_timeout_secs,
                change_comment: self.change_comment.clone(),
                sync_interval_secs: self.sync_interval_secs,
                sync_actor: self.actor.clone(),
                ..EngineConfig::default()
            },
        })
    }

    /// Validate what the library configuration cannot check
    fn validate(&self) -> Result<()> {
        self.level()?;

        if self.actor.is_empty() {
            anyhow::bail!("ZONESYNC_ACTOR cannot be empty");
        }

        if !(1..=300).contains(&self.provider_timeout_secs) {
            anyhow::bail!(
                "ZONESYNC_PROVIDER_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.provider_timeout_secs
            );
        }

        if self.store_type == "file"
            && let Some(parent) = std::path::Path::new(&self.store_path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            anyhow::bail!(
                "ZONESYNC_STORE_PATH parent directory does not exist: {}. \
                Create it first: sudo mkdir -p {}",
                parent.display(),
                parent.display()
            );
        }

        if let Some(endpoint) = &self.endpoint
            && endpoint.starts_with("http://")
        {
            eprintln!(
                "WARNING: ZONESYNC_ENDPOINT uses HTTP (not HTTPS). \
                Only use this against a local test endpoint."
            );
        }

        Ok(())
    }

    fn level(&self) -> Result<Level> {
        Ok(match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        })
    }
}

// ============================================================
// Main Entry Point
// ============================================================

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return if e.use_stderr() {
                ZoneSyncExitCode::ConfigError.into()
            } else {
                ZoneSyncExitCode::CleanShutdown.into()
            };
        }
    };

    let config = match cli.validate().and_then(|()| cli.to_config()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZoneSyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ZoneSyncExitCode::ConfigError.into();
    }

    let log_level = cli.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZoneSyncExitCode::ConfigError.into();
    }

    debug!(provider = ?config.provider, store = ?config.store, "Configuration loaded");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZoneSyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run(cli, config).await {
            Ok(()) => ZoneSyncExitCode::CleanShutdown,
            Err(e) => {
                error!("{:#}", e);
                exit_code_for(&e)
            }
        }
    });

    result.into()
}

/// Configuration problems found at startup still exit with 1
fn exit_code_for(err: &anyhow::Error) -> ZoneSyncExitCode {
    match err.downcast_ref::<zonesync_core::Error>() {
        Some(zonesync_core::Error::Config(_)) => ZoneSyncExitCode::ConfigError,
        _ => ZoneSyncExitCode::RuntimeError,
    }
}

async fn build_engine(
    config: ZoneSyncConfig,
) -> Result<(ZoneSyncEngine, mpsc::Receiver<EngineEvent>)> {
    let registry = ProviderRegistry::with_builtin_stores();

    #[cfg(feature = "route53")]
    zonesync_provider_route53::register(&registry);

    let provider = registry.create_provider(&config.provider)?;
    let store = registry.create_record_store(&config.store).await?;

    info!(
        provider = provider.provider_name(),
        store = config.store.type_name(),
        "Components initialized"
    );

    Ok(ZoneSyncEngine::new(
        Arc::from(provider),
        Arc::from(store),
        config.engine,
    )?)
}

async fn run(cli: Cli, config: ZoneSyncConfig) -> Result<()> {
    let (engine, events) = build_engine(config).await?;
    let actor = cli.actor.as_str();
    tokio::spawn(log_events(events));

    match cli.command {
        Commands::Sync => {
            let report = engine.sync_once().await?;
            for zone in &report.synced {
                println!(
                    "{:<6} {:<24} {:<40} {} record set(s)",
                    zone.zone_id, zone.provider_id, zone.name, zone.inserted
                );
            }
            for failure in &report.failed {
                println!("FAILED {:<24} {:<40} {}", failure.provider_id, failure.name, failure.error);
            }
            if !report.is_clean() {
                anyhow::bail!("{} zone(s) failed to sync", report.failed.len());
            }
        }

        // The engine flushes the store itself when it stops
        Commands::Daemon => return run_daemon(engine).await,

        Commands::ListZones => {
            let zones = engine.store().list_zones(StateFilter::Active).await?;

            println!("\n{:<6} {:<24} {:<40} {:<16}", "ID", "PROVIDER ID", "NAME", "CREATED BY");
            println!("{}", "-".repeat(90));
            for zone in &zones {
                println!(
                    "{:<6} {:<24} {:<40} {:<16}",
                    zone.id, zone.provider_id, zone.name, zone.created_by
                );
            }
            info!("Listed {} zone(s)", zones.len());
        }

        Commands::ListRecords { zone_id } => {
            let records = engine
                .store()
                .list_records(zone_id, StateFilter::Active)
                .await?;

            println!("\n{:<6} {:<6} {:<8} {:<40} {:<40}", "ID", "TYPE", "TTL", "NAME", "VALUES");
            println!("{}", "-".repeat(100));
            for record in &records {
                println!(
                    "{:<6} {:<6} {:<8} {:<40} {}",
                    record.id,
                    record.kind,
                    record.ttl,
                    record.name,
                    record.value_strings().join(" | ")
                );
            }
            info!("Listed {} record(s)", records.len());
        }

        Commands::CreateZone { name } => {
            let created = engine.workflow().create_zone(&name, actor).await?;
            let nameservers = engine.workflow().nameservers(created.row.id).await?;

            println!(
                "Created zone {} ({}) as {}",
                created.row.id, created.row.provider_id, created.row.name
            );
            println!("Change: {} ({})", created.change.id, created.change.change_id);
            for ns in nameservers {
                println!("  NS {}", ns);
            }
        }

        Commands::DeleteZone { zone_id } => {
            warn!("Deleting zone {}", zone_id);
            engine.workflow().delete_zone(zone_id).await?;
            println!("Deleted zone {}", zone_id);
        }

        Commands::CreateRecord {
            zone_id,
            name,
            kind,
            values,
            ttl,
        } => {
            let created = engine
                .workflow()
                .create_record(
                    RecordInput {
                        zone_id,
                        name,
                        kind,
                        ttl,
                        values,
                    },
                    actor,
                )
                .await?;

            println!(
                "Created record {} {} {} {}",
                created.row.id, created.row.kind, created.row.ttl, created.row.name
            );
            println!("Change: {} ({})", created.change.id, created.change.change_id);
        }

        Commands::DeleteRecord { record_id } => {
            warn!("Deleting record {}", record_id);
            let change = engine.workflow().delete_record(record_id).await?;
            println!("Deleted record {}", record_id);
            println!("Change: {} ({})", change.id, change.change_id);
        }

        Commands::ChangeStatus { change_id } => {
            let status = engine.tracker().status_by_id(change_id).await?;
            println!("{}", status);
        }
    }

    engine.store().flush().await.context("Failed to flush record store")?;
    Ok(())
}

/// Run the periodic engine until a shutdown signal arrives
async fn run_daemon(engine: ZoneSyncEngine) -> Result<()> {
    let shutdown = shutdown_signal()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let mut engine_task = tokio::spawn(async move { engine.run_with_shutdown(shutdown_rx).await });

    info!("Daemon started");

    tokio::select! {
        result = &mut engine_task => {
            // Engine stopped on its own
            return result.context("Engine task failed")?.map_err(Into::into);
        }
        signal = shutdown => {
            info!("Received shutdown signal: {}", signal);
        }
    }

    let _ = shutdown_tx.send(());

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, engine_task).await {
        Ok(result) => {
            result.context("Engine task failed")??;
            info!("Daemon stopped");
            Ok(())
        }
        Err(_) => Err(anyhow::anyhow!(
            "Shutdown timeout after {:?}",
            SHUTDOWN_TIMEOUT
        )),
    }
}

/// Forward engine events to the log
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        match &event {
            EngineEvent::SyncFailed { .. } | EngineEvent::SyncInconsistent { .. } => {
                warn!(?event, "Engine event")
            }
            _ => debug!(?event, "Engine event"),
        }
    }
}

/// Install SIGTERM and SIGINT handlers
///
/// Handlers are installed before returning so a setup failure is reported
/// at startup rather than at shutdown.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Fallback for non-Unix platforms: SIGINT only
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!("Failed to wait for CTRL-C: {}", e);
                std::future::pending::<&'static str>().await
            }
        }
    })
}
