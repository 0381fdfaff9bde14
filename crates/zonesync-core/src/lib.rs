// # zonesync-core
//
// Core library for mirroring hosted DNS zones into a local store.
//
// ## Architecture Overview
//
// - **ZoneProvider**: Trait for a hosted DNS provider's zone and record API
// - **RecordStore**: Trait for the local durable mirror of zones, records and changes
// - **Reconciler**: Rebuilds local rows from provider state
// - **MutationWorkflow**: Creates and deletes zones and records through the provider
// - **ChangeTracker**: Polls the propagation status of recorded changes
// - **ZoneSyncEngine**: Wires the components together and runs periodic reconciliation
// - **ProviderRegistry**: Plugin-based registry for providers and stores
//
// ## Design Principles
//
// 1. **Provider first**: A local row is only written for a mutation the provider confirmed
// 2. **Soft deletion**: Retired rows stay in the store for audit
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod locks;
pub mod model;
pub mod reconciler;
pub mod registry;
pub mod state;
pub mod timed;
pub mod tracker;
pub mod traits;
pub mod workflow;

// Re-export core types for convenience
pub use config::{EngineConfig, ProviderConfig, StoreConfig, ZoneSyncConfig};
pub use engine::ZoneSyncEngine;
pub use error::{Error, Result};
pub use events::{EngineEvent, EventSink};
pub use locks::ZoneLocks;
pub use reconciler::{Reconciler, SyncReport, ZoneSyncFailure, ZoneSyncSummary};
pub use registry::ProviderRegistry;
pub use state::{FileRecordStore, MemoryRecordStore};
pub use timed::TimedProvider;
pub use tracker::ChangeTracker;
pub use traits::{RecordStore, ZoneProvider};
pub use workflow::{MutationWorkflow, RecordInput, Tracked};
