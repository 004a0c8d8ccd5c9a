use async_trait::async_trait;

use crate::digest::Digest;
use crate::error::StoreResult;
use crate::matcher::Matcher;
use crate::vulnerability::Vulnerability;

/// The sole component that reads from both the indexer store and the
/// matcher store in one query: given a vulnerability, enumerates candidate
/// packages, applies the matcher's predicate, and returns the manifests
/// affected.
#[async_trait]
pub trait AffectedManifestResolver: Send + Sync {
    /// Resolves the manifests `vuln` affects. Returns an empty set when
    /// the vulnerability's distribution and repository (if present) resolve
    /// to no indexed row at all — the engine knows of no indexed manifest
    /// this vulnerability could apply to.
    async fn affected_manifests(
        &self,
        vuln: &Vulnerability,
        matcher: &dyn Matcher,
    ) -> StoreResult<Vec<Digest>>;
}
