//! Exercises scenario 2 of spec.md §8 (shared-layer deletion) plus the
//! index-report and manifest-index round trip.

mod common;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use scanstore_store_traits::{
    Digest, IndexRecordCandidate, IndexReport, IndexState, IndexerStore, Layer, Manifest, Package, PackageKind,
    Scanner, ScannerKind,
};

fn digest(hex_tail: &str) -> Digest {
    format!("sha256:{hex_tail:0>64}").parse().unwrap()
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    count: i64,
}

async fn layer_row_count(digest: &Digest) -> i64 {
    let Some(mut conn) = common::raw_connection().await else {
        return 0;
    };
    let rows: Vec<CountRow> = diesel::sql_query("SELECT count(*) AS count FROM indexer.layer WHERE digest = $1")
        .bind::<diesel::sql_types::Text, _>(digest.canonical())
        .load(&mut conn)
        .await
        .expect("raw layer count query");
    rows[0].count
}

fn pkg(name: &str) -> Package {
    Package {
        name: name.to_string(),
        kind: PackageKind::Binary,
        version: "1.0".to_string(),
        normalized_version: None,
        module: String::new(),
        arch: "x86_64".to_string(),
        source: None,
    }
}

#[tokio::test]
async fn deleting_manifests_only_removes_orphaned_shared_layers() {
    let Some(store) = common::test_store().await else {
        return;
    };

    let base_layer = digest("1111");
    let unique_a = digest("2222");
    let unique_b = digest("3333");
    let unique_c = digest("4444");

    let manifest_a = digest("aaa1");
    let manifest_b = digest("aaa2");
    let manifest_c = digest("aaa3");

    for (m, unique) in [(&manifest_a, &unique_a), (&manifest_b, &unique_b), (&manifest_c, &unique_c)] {
        store
            .persist_manifest(&Manifest {
                digest: m.clone(),
                layers: vec![Layer { digest: base_layer.clone() }, Layer { digest: unique.clone() }],
            })
            .await
            .unwrap();
    }

    let deleted = store
        .delete_manifests(&[manifest_a.clone(), manifest_b.clone()])
        .await
        .expect("delete_manifests");
    assert_eq!(deleted.len(), 2);
    assert!(deleted.contains(&manifest_a));
    assert!(deleted.contains(&manifest_b));

    assert_eq!(layer_row_count(&base_layer).await, 1, "manifest_c still references base_layer");
    assert_eq!(layer_row_count(&unique_a).await, 0, "unique_a was only referenced by deleted manifest_a");
    assert_eq!(layer_row_count(&unique_b).await, 0, "unique_b was only referenced by deleted manifest_b");

    // manifest_c still references base_layer, so it must survive; deleting
    // manifest_c in turn should finally remove it.
    let deleted_last = store.delete_manifests(&[manifest_c.clone()]).await.expect("delete last manifest");
    assert_eq!(deleted_last, vec![manifest_c]);
    assert_eq!(layer_row_count(&base_layer).await, 0, "base_layer is now orphaned");
}

#[tokio::test]
async fn deleting_an_unknown_digest_is_a_silent_no_op() {
    let Some(store) = common::test_store().await else {
        return;
    };

    let unknown = digest("deadbeef");
    let deleted = store.delete_manifests(&[unknown]).await.expect("delete_manifests");
    assert!(deleted.is_empty());
}

#[tokio::test]
async fn index_report_round_trips_and_populates_the_manifest_index() {
    let Some(store) = common::test_store().await else {
        return;
    };

    let manifest_digest = digest("5555");
    let layer_digest = digest("6666");

    store
        .persist_manifest(&Manifest {
            digest: manifest_digest.clone(),
            layers: vec![Layer { digest: layer_digest.clone() }],
        })
        .await
        .unwrap();

    assert!(store.index_report(&manifest_digest).await.unwrap().is_none());

    let scanner = Scanner {
        name: "report-test-scanner".to_string(),
        version: "1.0.0".to_string(),
        kind: ScannerKind::Package,
    };
    store.register_scanners(&[scanner.clone()]).await.unwrap();
    let scanner_id = store.select_scanner_ids(&[scanner]).await.unwrap()[0];
    store.index_packages(&[pkg("gzip")], &layer_digest, scanner_id).await.unwrap();

    let contents = serde_json::json!({
        "candidates": [IndexRecordCandidate {
            package: pkg("gzip"),
            distribution: None,
            repository: None,
        }],
    });
    let report = IndexReport {
        manifest: manifest_digest.clone(),
        state: IndexState::IndexFinished,
        contents,
    };

    store.set_index_report(&report).await.expect("set_index_report");
    let fetched = store.index_report(&manifest_digest).await.unwrap();
    assert_eq!(fetched, Some(report.clone()));

    store.index_manifest(&report).await.expect("index_manifest");
    // Calling it twice must not error or duplicate (on-conflict do-nothing).
    store.index_manifest(&report).await.expect("index_manifest is idempotent");
}

#[tokio::test]
async fn index_manifest_rejects_empty_digest() {
    let Some(store) = common::test_store().await else {
        return;
    };

    let report = IndexReport {
        manifest: Digest::new(String::new(), Vec::new()),
        state: IndexState::Scanning,
        contents: serde_json::json!({"candidates": []}),
    };
    let err = store.index_manifest(&report).await.unwrap_err();
    assert!(matches!(err, scanstore_store_traits::StoreError::Precondition { .. }));
}
