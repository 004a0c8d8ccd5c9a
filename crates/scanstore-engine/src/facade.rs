use std::sync::Arc;

use prometheus::Registry;
use scanstore_store_pg::{PgStore, PgStoreConfig};
use scanstore_store_traits::{AffectedManifestResolver, IndexerStore, MatcherStore, StoreResult};

/// Wires a [`PgStoreConfig`] into a running `PgStore` and exposes it
/// through the three trait surfaces spec.md names: the indexer store, the
/// matcher store, and the cross-schema affected-manifest resolver. Callers
/// that only need one surface (e.g. a scanner-facing service that never
/// touches vulnerabilities) can depend on the narrower trait and pass this
/// façade's `Arc` straight through.
#[derive(Clone)]
pub struct ScanStore {
    inner: Arc<PgStore>,
}

impl ScanStore {
    /// Opens the underlying Postgres pool, running migrations first when
    /// `config.run_migrations_on_open` is set, and registers the store's
    /// metrics into `registry`.
    pub async fn open(config: &PgStoreConfig, registry: &Registry) -> StoreResult<Self> {
        let inner = PgStore::open(config, registry).await?;
        Ok(Self { inner: Arc::new(inner) })
    }

    pub fn indexer_store(&self) -> Arc<dyn IndexerStore> {
        self.inner.clone() as Arc<dyn IndexerStore>
    }

    pub fn matcher_store(&self) -> Arc<dyn MatcherStore> {
        self.inner.clone() as Arc<dyn MatcherStore>
    }

    pub fn affected_manifest_resolver(&self) -> Arc<dyn AffectedManifestResolver> {
        self.inner.clone() as Arc<dyn AffectedManifestResolver>
    }
}
