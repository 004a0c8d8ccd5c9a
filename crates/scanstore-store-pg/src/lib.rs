//! Postgres implementation of the scanstore indexer and matcher stores.
//!
//! [`PgStore`] implements `IndexerStore`, `MatcherStore`, and
//! `AffectedManifestResolver` from `scanstore-store-traits` against two
//! Postgres schemas (`indexer`, `matcher`) standing in for spec.md's "two
//! logical databases". See `store.rs` for the trait impls and the
//! per-module files (`artifact_writer`, `manifest_graph`, `deletion`,
//! `report`, `update_ops`, `affected_resolver`, `gc`) for the operations
//! themselves.

pub mod advisory_lock;
mod affected_resolver;
mod artifact_writer;
mod convert;
mod deletion;
mod error_map;
mod gc;
mod manifest_graph;
mod models;
mod report;
mod scanner_registry;
mod schema;
mod store;
mod update_ops;

pub mod config;
pub mod metrics;
pub mod migrations;
pub mod pool;

pub use advisory_lock::SessionLock;
pub use config::PgStoreConfig;
pub use metrics::StoreMetrics;
pub use migrations::run_migrations;
pub use pool::{new_pg_connection_pool, PgPool};
pub use store::PgStore;
