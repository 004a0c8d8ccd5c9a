use async_trait::async_trait;
use uuid::Uuid;

use crate::enrichment::EnrichmentRecord;
use crate::error::StoreResult;
use crate::update_operation::UpdateOperation;
use crate::vulnerability::Vulnerability;

/// The versioned, append-only store of vulnerabilities and enrichment
/// records, organized around update operations. Feed-driven and
/// operation-scoped writes; see `IndexerStore` for the scanner-driven,
/// layer-scoped counterpart.
#[async_trait]
pub trait MatcherStore: Send + Sync {
    /// Full-snapshot import: opens a new `vulnerability` update operation,
    /// inserts every entry (skipping empty package names), associates each
    /// with the new operation, commits, and refreshes
    /// `latest_update_operations`. Returns the operation's external
    /// reference. An empty `vulns` is allowed and yields a no-op operation.
    async fn update_vulnerabilities(
        &self,
        updater: &str,
        fingerprint: &str,
        vulns: Vec<Vulnerability>,
    ) -> StoreResult<Uuid>;

    /// Delta import: carries forward every vulnerability associated with
    /// the updater's most recent prior operation whose name is absent from
    /// both `adds` and `deletions`, then inserts `adds` as in full-snapshot
    /// mode.
    async fn delta_update_vulnerabilities(
        &self,
        updater: &str,
        fingerprint: &str,
        adds: Vec<Vulnerability>,
        deletions: Vec<String>,
    ) -> StoreResult<Uuid>;

    /// Mirror of `update_vulnerabilities` for enrichment records, using the
    /// enrichment-specific content hash.
    async fn update_enrichments(
        &self,
        updater: &str,
        fingerprint: &str,
        records: Vec<EnrichmentRecord>,
    ) -> StoreResult<Uuid>;

    /// Records from the latest enrichment operation for `updater` whose
    /// tag array intersects `tags`.
    async fn get_enrichment(&self, updater: &str, tags: &[String]) -> StoreResult<Vec<EnrichmentRecord>>;

    /// Every vulnerability reachable from a `latest_update_operations` row
    /// (any updater) whose package name equals `package_name`. This is the
    /// reader half of `update_vulnerabilities`/`delta_update_vulnerabilities`:
    /// only vulnerabilities associated with the newest operation per
    /// `(updater, kind)` are visible, so a superseded operation's
    /// vulnerabilities disappear from this view the moment a later one
    /// commits and the view refreshes.
    async fn vulnerabilities_by_package(&self, package_name: &str) -> StoreResult<Vec<Vulnerability>>;

    /// The materialized `latest_update_operations` view: one row per
    /// `(updater, kind)`, the greatest id.
    async fn latest_update_operations(&self) -> StoreResult<Vec<UpdateOperation>>;

    /// Throttled garbage collection: prunes update operations beyond
    /// `keep` per updater (up to `GC_THROTTLE` per call), then deletes
    /// vulnerabilities/enrichments left with no remaining association.
    /// Returns the count of operations still eligible for deletion; callers
    /// invoke this repeatedly until it returns zero.
    async fn gc(&self, keep: u32) -> StoreResult<u64>;
}
