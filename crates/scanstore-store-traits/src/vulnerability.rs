use chrono::{DateTime, Utc};
use md5::{Digest as Md5DigestTrait, Md5};

use crate::distribution::Distribution;
use crate::repository::Repository;
use crate::version::Range;

/// How a vulnerability's architecture constraint composes with a candidate
/// package's architecture at match time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ArchOperation {
    /// No architecture constraint.
    Any,
    /// Vulnerable only on this exact architecture.
    Equals,
    /// Vulnerable on every architecture except this one.
    NotEquals,
    /// The vulnerability applies to the pattern-matched subset of
    /// architectures the updater encoded (e.g. a glob over `patch`).
    PatternMatch,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NormalizedSeverity {
    Unknown,
    Negligible,
    Low,
    Medium,
    High,
    Critical,
}

/// A known vulnerability, as reported by a feed updater. `content_hash`
/// deduplicates revisions of the same logical vulnerability across update
/// operations.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vulnerability {
    pub name: String,
    pub updater: String,
    pub description: String,
    pub issued: DateTime<Utc>,
    pub severity: String,
    pub normalized_severity: NormalizedSeverity,
    pub package_name: String,
    pub distribution: Option<Distribution>,
    pub repository: Option<Repository>,
    pub fixed_in_version: Option<String>,
    pub arch_operation: ArchOperation,
    pub arch: Option<String>,
    pub vulnerable_range: Range,
}

impl Vulnerability {
    pub fn has_empty_package_name(&self) -> bool {
        self.package_name.is_empty()
    }

    /// MD5 over a canonical field concatenation including `kind || lower ||
    /// upper` for the vulnerable range, per the data model's content-hash
    /// rule. Deterministic: two `Vulnerability` values with identical
    /// identifying fields always hash the same way, independent of which
    /// update operation carries them.
    pub fn content_hash(&self) -> [u8; 16] {
        let mut hasher = Md5::new();
        hasher.update(self.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.updater.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.package_name.as_bytes());
        hasher.update([0u8]);
        if let Some(d) = &self.distribution {
            hasher.update(d.did.as_bytes());
            hasher.update(d.version_id.as_bytes());
        }
        hasher.update([0u8]);
        if let Some(r) = &self.repository {
            hasher.update(r.name.as_bytes());
        }
        hasher.update([0u8]);
        if let Some(fixed) = &self.fixed_in_version {
            hasher.update(fixed.as_bytes());
        }
        hasher.update([0u8]);

        let range_kind = self.vulnerable_range.kind().unwrap_or("");
        hasher.update(range_kind.as_bytes());
        if let Some(lower) = &self.vulnerable_range.lower {
            for c in lower.components {
                hasher.update(c.to_be_bytes());
            }
        }
        if let Some(upper) = &self.vulnerable_range.upper {
            for c in upper.components {
                hasher.update(c.to_be_bytes());
            }
        }

        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn base() -> Vulnerability {
        Vulnerability {
            name: "CVE-2024-0001".into(),
            updater: "test-updater".into(),
            description: "desc".into(),
            issued: Utc::now(),
            severity: "High".into(),
            normalized_severity: NormalizedSeverity::High,
            package_name: "openssl".into(),
            distribution: None,
            repository: None,
            fixed_in_version: None,
            arch_operation: ArchOperation::Any,
            arch: None,
            vulnerable_range: Range::empty(),
        }
    }

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(base().content_hash(), base().content_hash());
    }

    #[test]
    fn content_hash_depends_on_range_bounds() {
        let mut a = base();
        let mut b = base();
        a.vulnerable_range = Range::new(Some(Version::new("rpm", [0; 10])), None);
        b.vulnerable_range = Range::new(
            Some(Version::new("rpm", [0, 0, 0, 0, 0, 0, 0, 0, 0, 1])),
            None,
        );
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn content_hash_ignores_description_and_issued_date() {
        let mut a = base();
        let mut b = base();
        a.description = "one description".into();
        b.description = "an entirely different description".into();
        b.issued = a.issued + chrono::Duration::days(400);
        assert_eq!(a.content_hash(), b.content_hash());
    }
}
