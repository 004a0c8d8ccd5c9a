//! Domain types, error taxonomy, and storage trait interfaces shared by the
//! indexer store and the matcher store. No I/O lives here; `scanstore-store-pg`
//! provides the Postgres implementation of these traits.

pub mod affected;
pub mod digest;
pub mod distribution;
pub mod enrichment;
pub mod error;
pub mod file;
pub mod indexer_store;
pub mod manifest;
pub mod matcher;
pub mod matcher_store;
pub mod package;
pub mod repository;
pub mod scanner;
pub mod update_operation;
pub mod version;
pub mod vulnerability;

pub use affected::AffectedManifestResolver;
pub use digest::Digest;
pub use distribution::Distribution;
pub use enrichment::EnrichmentRecord;
pub use error::{StoreError, StoreResult};
pub use file::{FileKind, IndexFile};
pub use indexer_store::{IndexCounts, IndexerStore};
pub use manifest::{IndexRecordCandidate, IndexReport, IndexState, Layer, Manifest, ManifestIndexKey};
pub use matcher::{IndexRecord, Matcher};
pub use matcher_store::MatcherStore;
pub use package::{Package, PackageKind};
pub use repository::Repository;
pub use scanner::{Scanner, ScannerId, ScannerKind};
pub use update_operation::{UpdateKind, UpdateOperation};
pub use version::{Range, Version};
pub use vulnerability::{ArchOperation, NormalizedSeverity, Vulnerability};
