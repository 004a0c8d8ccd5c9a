use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::AsyncPgConnection;
use prometheus::Registry;
use uuid::Uuid;

use scanstore_store_traits::{
    AffectedManifestResolver, Digest, Distribution, EnrichmentRecord, IndexCounts, IndexFile,
    IndexReport, IndexerStore, Manifest, Matcher, MatcherStore, Package, Repository, Scanner,
    ScannerId, ScannerKind, StoreResult, UpdateOperation, Vulnerability,
};

use crate::config::PgStoreConfig;
use crate::error_map::map_pool_err;
use crate::metrics::StoreMetrics;
use crate::migrations::run_migrations;
use crate::models::indexer::ScannerRow;
use crate::pool::{new_pg_connection_pool, PgPool};
use crate::scanner_registry::kind_from_str;
use crate::{affected_resolver, artifact_writer, deletion, gc, manifest_graph, report, scanner_registry, update_ops};

type ScannerCacheKey = (String, String, ScannerKind);

/// The Postgres-backed implementation of both `IndexerStore` and
/// `MatcherStore`, plus the cross-schema `AffectedManifestResolver`. Named
/// and shaped after `PgIndexerStore` in the teacher's `sui-indexer` crate: a
/// pool, a metrics handle, and a small in-process cache.
pub struct PgStore {
    pool: PgPool,
    metrics: StoreMetrics,
    scanner_cache: RwLock<HashMap<ScannerCacheKey, i32>>,
}

impl PgStore {
    /// Opens a connection pool against `config.database_url`, running
    /// pending migrations first when `config.run_migrations_on_open` is set.
    pub async fn open(config: &PgStoreConfig, registry: &Registry) -> StoreResult<Self> {
        if config.run_migrations_on_open {
            run_migrations(&config.database_url).await?;
        }
        let pool = new_pg_connection_pool(config).await?;
        Ok(Self {
            pool,
            metrics: StoreMetrics::new(registry),
            scanner_cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    pub(crate) async fn connection(
        &self,
    ) -> StoreResult<PooledConnection<'_, AsyncPgConnection>> {
        self.pool.get().await.map_err(|e| map_pool_err("connection", e))
    }

    pub(crate) fn cached_scanner_id(&self, key: &ScannerCacheKey) -> Option<ScannerId> {
        self.scanner_cache
            .read()
            .expect("scanner cache lock poisoned")
            .get(key)
            .map(|id| ScannerId(*id as i64))
    }

    pub(crate) fn cache_scanner_rows(&self, rows: &[ScannerRow]) {
        let mut cache = self.scanner_cache.write().expect("scanner cache lock poisoned");
        for row in rows {
            if let Some(kind) = kind_from_str(&row.kind) {
                cache.insert((row.name.clone(), row.version.clone(), kind), row.id);
            }
        }
    }
}

#[async_trait]
impl IndexerStore for PgStore {
    async fn register_scanners(&self, scanners: &[Scanner]) -> StoreResult<()> {
        self.metrics
            .observe("register_scanners", scanner_registry::register_scanners(self, scanners))
            .await
    }

    async fn select_scanner_ids(&self, scanners: &[Scanner]) -> StoreResult<Vec<ScannerId>> {
        self.metrics
            .observe("select_scanner_ids", scanner_registry::select_scanner_ids(self, scanners))
            .await
    }

    async fn index_packages(
        &self,
        packages: &[Package],
        layer: &Digest,
        scanner: ScannerId,
    ) -> StoreResult<IndexCounts> {
        self.metrics
            .observe("index_packages", artifact_writer::index_packages(self, packages, layer, scanner))
            .await
    }

    async fn index_distributions(
        &self,
        distributions: &[Distribution],
        layer: &Digest,
        scanner: ScannerId,
    ) -> StoreResult<IndexCounts> {
        self.metrics
            .observe(
                "index_distributions",
                artifact_writer::index_distributions(self, distributions, layer, scanner),
            )
            .await
    }

    async fn index_repositories(
        &self,
        repositories: &[Repository],
        layer: &Digest,
        scanner: ScannerId,
    ) -> StoreResult<IndexCounts> {
        self.metrics
            .observe(
                "index_repositories",
                artifact_writer::index_repositories(self, repositories, layer, scanner),
            )
            .await
    }

    async fn index_files(
        &self,
        files: &[IndexFile],
        layer: &Digest,
        scanner: ScannerId,
    ) -> StoreResult<IndexCounts> {
        self.metrics
            .observe("index_files", artifact_writer::index_files(self, files, layer, scanner))
            .await
    }

    async fn persist_manifest(&self, manifest: &Manifest) -> StoreResult<()> {
        self.metrics
            .observe("persist_manifest", manifest_graph::persist_manifest(self, manifest))
            .await
    }

    async fn index_manifest(&self, report: &IndexReport) -> StoreResult<()> {
        self.metrics
            .observe("index_manifest", manifest_graph::index_manifest(self, report))
            .await
    }

    async fn manifest_scanned(&self, manifest: &Digest, scanners: &[ScannerId]) -> StoreResult<bool> {
        self.metrics
            .observe("manifest_scanned", manifest_graph::manifest_scanned(self, manifest, scanners))
            .await
    }

    async fn set_index_finished(&self, report: &IndexReport, scanners: &[ScannerId]) -> StoreResult<()> {
        self.metrics
            .observe(
                "set_index_finished",
                manifest_graph::set_index_finished(self, report, scanners),
            )
            .await
    }

    async fn delete_manifests(&self, digests: &[Digest]) -> StoreResult<Vec<Digest>> {
        self.metrics
            .observe("delete_manifests", deletion::delete_manifests(self, digests))
            .await
    }

    async fn set_index_report(&self, report_: &IndexReport) -> StoreResult<()> {
        self.metrics
            .observe("set_index_report", report::set_index_report(self, report_))
            .await
    }

    async fn index_report(&self, digest: &Digest) -> StoreResult<Option<IndexReport>> {
        self.metrics
            .observe("index_report", report::index_report(self, digest))
            .await
    }

    async fn packages_by_layer(&self, layer: &Digest, scanners: &[ScannerId]) -> StoreResult<Vec<Package>> {
        self.metrics
            .observe("packages_by_layer", artifact_writer::packages_by_layer(self, layer, scanners))
            .await
    }
}

#[async_trait]
impl MatcherStore for PgStore {
    async fn update_vulnerabilities(
        &self,
        updater: &str,
        fingerprint: &str,
        vulns: Vec<Vulnerability>,
    ) -> StoreResult<Uuid> {
        self.metrics
            .observe(
                "update_vulnerabilities",
                update_ops::update_vulnerabilities(self, updater, fingerprint, vulns),
            )
            .await
    }

    async fn delta_update_vulnerabilities(
        &self,
        updater: &str,
        fingerprint: &str,
        adds: Vec<Vulnerability>,
        deletions: Vec<String>,
    ) -> StoreResult<Uuid> {
        self.metrics
            .observe(
                "delta_update_vulnerabilities",
                update_ops::delta_update_vulnerabilities(self, updater, fingerprint, adds, deletions),
            )
            .await
    }

    async fn update_enrichments(
        &self,
        updater: &str,
        fingerprint: &str,
        records: Vec<EnrichmentRecord>,
    ) -> StoreResult<Uuid> {
        self.metrics
            .observe(
                "update_enrichments",
                update_ops::update_enrichments(self, updater, fingerprint, records),
            )
            .await
    }

    async fn get_enrichment(&self, updater: &str, tags: &[String]) -> StoreResult<Vec<EnrichmentRecord>> {
        self.metrics
            .observe("get_enrichment", update_ops::get_enrichment(self, updater, tags))
            .await
    }

    async fn vulnerabilities_by_package(&self, package_name: &str) -> StoreResult<Vec<Vulnerability>> {
        self.metrics
            .observe(
                "vulnerabilities_by_package",
                update_ops::vulnerabilities_by_package(self, package_name),
            )
            .await
    }

    async fn latest_update_operations(&self) -> StoreResult<Vec<UpdateOperation>> {
        self.metrics
            .observe("latest_update_operations", update_ops::latest_update_operations(self))
            .await
    }

    async fn gc(&self, keep: u32) -> StoreResult<u64> {
        self.metrics.observe("gc", gc::gc(self, keep)).await
    }
}

#[async_trait]
impl AffectedManifestResolver for PgStore {
    async fn affected_manifests(&self, vuln: &Vulnerability, matcher: &dyn Matcher) -> StoreResult<Vec<Digest>> {
        self.metrics
            .observe("affected_manifests", affected_resolver::affected_manifests(self, vuln, matcher))
            .await
    }
}
