//! `UpdateEnrichments` / `GetEnrichment`: only the latest operation's
//! records are visible, and lookup is by non-empty tag intersection.

mod common;

use scanstore_store_traits::{EnrichmentRecord, MatcherStore};

fn unique_updater(prefix: &str) -> String {
    format!("{prefix}-{}", std::process::id())
}

fn record(updater: &str, tags: &[&str], data: &[u8]) -> EnrichmentRecord {
    EnrichmentRecord {
        updater: updater.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        data: data.to_vec(),
    }
}

#[tokio::test]
async fn get_enrichment_returns_only_tag_intersecting_records_from_the_latest_operation() {
    let Some(store) = common::test_store().await else {
        return;
    };
    let updater = unique_updater("enrich-latest");

    store
        .update_enrichments(&updater, "fp-1", vec![record(&updater, &["nvd", "cve"], b"first")])
        .await
        .expect("first update_enrichments");

    store
        .update_enrichments(&updater, "fp-2", vec![record(&updater, &["osv"], b"second")])
        .await
        .expect("second update_enrichments");

    // Only the second operation is visible now; querying for tags that
    // only the first operation's record carried must return nothing.
    let stale = store.get_enrichment(&updater, &["nvd".to_string()]).await.expect("get_enrichment");
    assert!(stale.is_empty());

    let current = store.get_enrichment(&updater, &["osv".to_string()]).await.expect("get_enrichment");
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].data, b"second");
}

#[tokio::test]
async fn get_enrichment_requires_nonempty_tag_intersection() {
    let Some(store) = common::test_store().await else {
        return;
    };
    let updater = unique_updater("enrich-intersect");

    store
        .update_enrichments(
            &updater,
            "fp-1",
            vec![record(&updater, &["alpha", "beta"], b"payload")],
        )
        .await
        .expect("update_enrichments");

    let hit = store.get_enrichment(&updater, &["beta".to_string(), "unrelated".to_string()]).await.unwrap();
    assert_eq!(hit.len(), 1);

    let miss = store.get_enrichment(&updater, &["unrelated".to_string()]).await.unwrap();
    assert!(miss.is_empty());
}

#[tokio::test]
async fn unknown_updater_returns_empty_rather_than_an_error() {
    let Some(store) = common::test_store().await else {
        return;
    };

    let result = store
        .get_enrichment("updater-that-has-never-run", &["anything".to_string()])
        .await
        .expect("get_enrichment on an unknown updater must not error");
    assert!(result.is_empty());
}
