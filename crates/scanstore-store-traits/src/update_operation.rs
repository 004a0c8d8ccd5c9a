use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum UpdateKind {
    Vulnerability,
    Enrichment,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::Vulnerability => "vulnerability",
            UpdateKind::Enrichment => "enrichment",
        }
    }
}

/// One atomic feed import: the unit of version tracking and GC. IDs are
/// monotonic and DB-assigned; `reference` is the externally-facing handle.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UpdateOperation {
    pub id: i64,
    pub reference: Uuid,
    pub updater: String,
    pub kind: UpdateKind,
    pub fingerprint: String,
    pub date: DateTime<Utc>,
}
