use async_trait::async_trait;

use crate::digest::Digest;
use crate::distribution::Distribution;
use crate::error::StoreResult;
use crate::file::IndexFile;
use crate::manifest::{IndexReport, Manifest};
use crate::package::Package;
use crate::repository::Repository;
use crate::scanner::{Scanner, ScannerId};

/// Outcome of an `Index*` call: how many artifacts were written and how
/// many were skipped because of an empty `name` (the precondition spec.md
/// §4.2 calls out for packages, applied uniformly to every artifact kind).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndexCounts {
    pub written: usize,
    pub skipped_empty_name: usize,
}

/// The content-addressed, layer-scoped repository of scan artifacts plus
/// the per-manifest index. Scanner-driven and layer-scoped writes; see
/// `MatcherStore` for the feed-driven, operation-scoped counterpart.
#[async_trait]
pub trait IndexerStore: Send + Sync {
    /// Idempotent insert; on conflict by `(name, version, kind)` does
    /// nothing.
    async fn register_scanners(&self, scanners: &[Scanner]) -> StoreResult<()>;

    /// Returns integer ids in the same order as `scanners`. A lookup of an
    /// unregistered scanner is a precondition error.
    async fn select_scanner_ids(&self, scanners: &[Scanner]) -> StoreResult<Vec<ScannerId>>;

    async fn index_packages(
        &self,
        packages: &[Package],
        layer: &Digest,
        scanner: ScannerId,
    ) -> StoreResult<IndexCounts>;

    async fn index_distributions(
        &self,
        distributions: &[Distribution],
        layer: &Digest,
        scanner: ScannerId,
    ) -> StoreResult<IndexCounts>;

    async fn index_repositories(
        &self,
        repositories: &[Repository],
        layer: &Digest,
        scanner: ScannerId,
    ) -> StoreResult<IndexCounts>;

    async fn index_files(
        &self,
        files: &[IndexFile],
        layer: &Digest,
        scanner: ScannerId,
    ) -> StoreResult<IndexCounts>;

    /// `PackagesByLayer(layer, scanners)`: every package any of `scanners`
    /// reported for `layer`, each with its `source` back-pointer resolved.
    async fn packages_by_layer(&self, layer: &Digest, scanners: &[ScannerId]) -> StoreResult<Vec<Package>>;

    /// Inserts the manifest row (on conflict do nothing), then each layer
    /// in order with its `manifest_layer` position.
    async fn persist_manifest(&self, manifest: &Manifest) -> StoreResult<()>;

    /// Derives `(package|source, dist?, repo?, manifest)` tuples from the
    /// report and batch-inserts them into the manifest index, on conflict
    /// doing nothing. Rejects an empty manifest digest as a precondition
    /// error.
    async fn index_manifest(&self, report: &IndexReport) -> StoreResult<()>;

    /// True iff the set of scanner ids observed for `manifest` is a
    /// superset of `scanners`.
    async fn manifest_scanned(&self, manifest: &Digest, scanners: &[ScannerId]) -> StoreResult<bool>;

    /// In one transaction, records that `scanners` have scanned `manifest`
    /// and upserts the report JSON.
    async fn set_index_finished(
        &self,
        report: &IndexReport,
        scanners: &[ScannerId],
    ) -> StoreResult<()>;

    /// Deletes each manifest in its own transaction, cascading orphan
    /// layers. Missing digests are silently skipped. Returns the subset
    /// actually deleted; a manifest locked by another in-flight deletion is
    /// excluded from the result, not an error.
    async fn delete_manifests(&self, digests: &[Digest]) -> StoreResult<Vec<Digest>>;

    /// Upserts the JSON report blob keyed by manifest digest.
    async fn set_index_report(&self, report: &IndexReport) -> StoreResult<()>;

    /// Fetches the report for `digest`. `Ok(None)` (not an error) when
    /// absent.
    async fn index_report(&self, digest: &Digest) -> StoreResult<Option<IndexReport>>;
}
