use md5::{Digest as Md5DigestTrait, Md5};

/// An enrichment record: opaque `data` keyed by a sorted set of `tags`, plus
/// the updater that produced it. Enrichments ride the same update-operation
/// lifecycle as vulnerabilities but have no notion of package/distribution
/// targeting — callers look them up by tag.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnrichmentRecord {
    pub updater: String,
    pub tags: Vec<String>,
    pub data: Vec<u8>,
}

impl EnrichmentRecord {
    /// Tags sorted and deduplicated; the canonical form used both for
    /// storage and for hashing.
    pub fn sorted_tags(&self) -> Vec<String> {
        let mut tags = self.tags.clone();
        tags.sort();
        tags.dedup();
        tags
    }

    /// MD5 over sorted, NUL-terminated tags followed by `data`.
    pub fn content_hash(&self) -> [u8; 16] {
        let mut hasher = Md5::new();
        for tag in self.sorted_tags() {
            hasher.update(tag.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(&self.data);
        hasher.finalize().into()
    }

    /// Whether this record's tag set intersects `query_tags` (a non-empty
    /// intersection in any order counts as a match).
    pub fn matches_any_tag(&self, query_tags: &[String]) -> bool {
        self.tags.iter().any(|t| query_tags.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_order_independent() {
        let a = EnrichmentRecord {
            updater: "u".into(),
            tags: vec!["b".into(), "a".into()],
            data: b"payload".to_vec(),
        };
        let b = EnrichmentRecord {
            updater: "u".into(),
            tags: vec!["a".into(), "b".into()],
            data: b"payload".to_vec(),
        };
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn content_hash_depends_on_data() {
        let a = EnrichmentRecord {
            updater: "u".into(),
            tags: vec!["a".into()],
            data: b"one".to_vec(),
        };
        let b = EnrichmentRecord {
            updater: "u".into(),
            tags: vec!["a".into()],
            data: b"two".to_vec(),
        };
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn matches_any_tag_requires_nonempty_intersection() {
        let r = EnrichmentRecord {
            updater: "u".into(),
            tags: vec!["cve".into(), "nvd".into()],
            data: vec![],
        };
        assert!(r.matches_any_tag(&["nvd".to_string(), "other".to_string()]));
        assert!(!r.matches_any_tag(&["unrelated".to_string()]));
    }
}
