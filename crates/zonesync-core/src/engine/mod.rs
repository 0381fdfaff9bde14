//! Core zonesync engine
//!
//! The ZoneSyncEngine wires one provider and one record store into the
//! three components that act on them:
//! - [`Reconciler`]: rebuilds local rows from provider state
//! - [`MutationWorkflow`]: creates and deletes zones and records
//! - [`ChangeTracker`]: polls the status of recorded changes
//!
//! ## Architecture
//!
//! ```text
//!                        ┌────────────────┐
//!                        │ ZoneSyncEngine │── interval ──► sync_all
//!                        └────────────────┘
//!                                │
//!         ┌──────────────────────┼──────────────────────┐
//!         ▼                      ▼                      ▼
//! ┌──────────────┐      ┌──────────────────┐     ┌───────────────┐
//! │  Reconciler  │─────►│ MutationWorkflow │     │ ChangeTracker │
//! └──────────────┘      └──────────────────┘     └───────────────┘
//!         │                      │                      │
//!         └──────────┬───────────┴──────────┬───────────┘
//!                    ▼                      ▼
//!            ┌──────────────┐       ┌──────────────┐
//!            │ ZoneProvider │       │ RecordStore  │
//!            │ (timed)      │       │              │
//!            └──────────────┘       └──────────────┘
//! ```
//!
//! All components share one set of [`ZoneLocks`] and one event channel.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::events::{EngineEvent, EventSink};
use crate::locks::ZoneLocks;
use crate::reconciler::{Reconciler, SyncReport};
use crate::timed::TimedProvider;
use crate::tracker::ChangeTracker;
use crate::traits::{RecordStore, ZoneProvider};
use crate::workflow::MutationWorkflow;

/// Core zonesync engine
///
/// ## Lifecycle
///
/// 1. Create with [`ZoneSyncEngine::new()`]
/// 2. Use the components directly for one-shot operations, or
/// 3. Start periodic reconciliation with [`ZoneSyncEngine::run()`]
/// 4. The loop runs until a shutdown signal is received, then flushes the store
///
/// A failed pass is logged and retried on the next tick. The engine never
/// retries a provider call on its own.
pub struct ZoneSyncEngine {
    store: Arc<dyn RecordStore>,
    reconciler: Reconciler,
    workflow: MutationWorkflow,
    tracker: ChangeTracker,
    config: EngineConfig,
    events: EventSink,
}

impl ZoneSyncEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `provider`: Zone provider implementation
    /// - `store`: Record store implementation
    /// - `config`: Engine settings
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        provider: Arc<dyn ZoneProvider>,
        store: Arc<dyn RecordStore>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (events, rx) = EventSink::channel(config.event_channel_capacity);
        let provider = TimedProvider::new(provider, Duration::from_secs(config.provider_timeout_secs));
        let locks = ZoneLocks::new();

        let workflow = MutationWorkflow::new(
            provider.clone(),
            store.clone(),
            locks.clone(),
            events.clone(),
            config.change_comment.clone(),
            config.default_ttl,
        );
        let reconciler = Reconciler::new(
            provider.clone(),
            store.clone(),
            workflow.clone(),
            locks,
            events.clone(),
        );
        let tracker = ChangeTracker::new(provider, store.clone());

        let engine = Self {
            store,
            reconciler,
            workflow,
            tracker,
            config,
            events,
        };

        Ok((engine, rx))
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn workflow(&self) -> &MutationWorkflow {
        &self.workflow
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one reconciliation pass as the configured sync actor
    pub async fn sync_once(&self) -> Result<SyncReport> {
        let report = self.reconciler.sync_all(&self.config.sync_actor).await?;
        self.store.flush().await?;
        Ok(report)
    }

    /// Run periodic reconciliation until SIGINT
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run periodic reconciliation until `shutdown_rx` fires
    ///
    /// The daemon wires its own signal handling into `shutdown_rx`; tests
    /// use it to stop the loop deterministically.
    pub async fn run_with_shutdown(&self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_internal(Some(shutdown_rx)).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let interval_secs = self.config.sync_interval_secs;
        self.events.emit(EngineEvent::Started { interval_secs });
        info!("Reconciling every {}s", interval_secs);

        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        let shutdown = async {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                Some(_) = ticks.next() => {
                    match self.sync_once().await {
                        Ok(report) if report.is_clean() => {}
                        Ok(report) => {
                            warn!("{} zone(s) failed to sync, retrying next interval", report.failed.len());
                        }
                        Err(e) => {
                            error!("Reconciliation pass failed: {}", e);
                        }
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.events.emit(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        self.store.flush().await?;
        info!("Record store flushed, engine stopped");

        Ok(())
    }
}
