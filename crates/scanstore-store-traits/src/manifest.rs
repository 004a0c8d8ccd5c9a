use serde_json::Value;

use crate::digest::Digest;
use crate::distribution::Distribution;
use crate::package::Package;
use crate::repository::Repository;

/// An opaque, content-addressed layer. No content is stored here; this is
/// just the identity a scan artifact is bound to.
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    pub digest: Digest,
}

/// A manifest: a content-addressed identity owning an ordered list of
/// layers.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Manifest {
    pub digest: Digest,
    pub layers: Vec<Layer>,
}

/// Lifecycle state of a manifest's index report.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum IndexState {
    Scanning,
    IndexFinished,
    IndexError,
}

impl IndexState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexState::Scanning => "scanning",
            IndexState::IndexFinished => "index_finished",
            IndexState::IndexError => "index_error",
        }
    }
}

/// The per-manifest summary of every artifact found, suitable for
/// downstream matching. Coexists with the normalized manifest index; this
/// is the opaque form, the index is the queryable form.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexReport {
    pub manifest: Digest,
    pub state: IndexState,
    pub contents: Value,
}

/// A row of the normalized manifest index: `(manifest, package, dist?,
/// repo?)`. Both `distribution` and `repository` may be absent.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ManifestIndexKey {
    pub package_id: i64,
    pub distribution_id: Option<i64>,
    pub repository_id: Option<i64>,
}

/// One candidate artifact tuple resolved by a scanner for a manifest: the
/// package found, the distribution/repository context it was found in, if
/// any. `IndexManifest` re-resolves each of these to the row ids the
/// artifact writer already upserted, rather than re-deriving them from raw
/// scanner output, so this is the shape `IndexReport::contents` carries.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexRecordCandidate {
    pub package: Package,
    pub distribution: Option<Distribution>,
    pub repository: Option<Repository>,
}

impl IndexReport {
    /// Parses `contents` as the list of candidate tuples `IndexManifest`
    /// derives the manifest index from. A report with no `"candidates"` key,
    /// or one that is not a JSON array of the expected shape, yields an
    /// empty list rather than an error: the opaque contents blob may carry
    /// other fields a future scanner version adds.
    pub fn candidates(&self) -> Vec<IndexRecordCandidate> {
        self.contents
            .get("candidates")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}
