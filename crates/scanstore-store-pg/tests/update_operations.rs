//! Exercises scenarios 3, 4 and 6 of spec.md §8: full-snapshot visibility
//! through `latest_update_operations`, delta carry-forward, and GC
//! throttling to quiescence.

mod common;

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use scanstore_store_traits::{
    ArchOperation, MatcherStore, NormalizedSeverity, Range, UpdateKind, Vulnerability,
};

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    count: i64,
}

async fn vuln_row_count(updater: &str, name: &str) -> i64 {
    let Some(mut conn) = common::raw_connection().await else {
        return 0;
    };
    let rows: Vec<CountRow> = diesel::sql_query(
        "SELECT count(*) AS count FROM matcher.vuln WHERE updater = $1 AND name = $2",
    )
    .bind::<diesel::sql_types::Text, _>(updater)
    .bind::<diesel::sql_types::Text, _>(name)
    .load(&mut conn)
    .await
    .expect("raw vuln count query");
    rows[0].count
}

fn vuln(name: &str, updater: &str, package_name: &str) -> Vulnerability {
    Vulnerability {
        name: name.to_string(),
        updater: updater.to_string(),
        description: "desc".to_string(),
        issued: Utc::now(),
        severity: "High".to_string(),
        normalized_severity: NormalizedSeverity::High,
        package_name: package_name.to_string(),
        distribution: None,
        repository: None,
        fixed_in_version: None,
        arch_operation: ArchOperation::Any,
        arch: None,
        vulnerable_range: Range::empty(),
    }
}

fn unique_updater(prefix: &str) -> String {
    // Tests share a single database; give every test its own updater name
    // so full-snapshot and delta runs never interfere with each other's
    // `latest_update_operations` row.
    format!("{prefix}-{}", std::process::id())
}

#[tokio::test]
async fn only_the_latest_full_snapshot_operation_is_visible() {
    let Some(store) = common::test_store().await else {
        return;
    };
    let updater = unique_updater("full-snapshot");

    let first_ref = store
        .update_vulnerabilities(&updater, "fp-1", vec![vuln("CVE-1", &updater, "vi")])
        .await
        .expect("first update_vulnerabilities");

    let second_ref = store
        .update_vulnerabilities(&updater, "fp-2", vec![vuln("CVE-2", &updater, "vim")])
        .await
        .expect("second update_vulnerabilities");

    assert_ne!(first_ref, second_ref);

    let latest = store.latest_update_operations().await.expect("latest_update_operations");
    let row = latest
        .iter()
        .find(|op| op.updater == updater && op.kind == UpdateKind::Vulnerability)
        .expect("a latest row for this updater");
    assert_eq!(row.reference, second_ref, "only the most recent operation should be the visible one");
}

#[tokio::test]
async fn delta_update_carries_forward_untouched_vulnerabilities() {
    let Some(store) = common::test_store().await else {
        return;
    };
    let updater = unique_updater("delta-carry");

    store
        .update_vulnerabilities(
            &updater,
            "fp-base",
            vec![vuln("CVE-0", &updater, "jq"), vuln("CVE-3", &updater, "grep")],
        )
        .await
        .expect("seed full snapshot");

    store
        .delta_update_vulnerabilities(
            &updater,
            "fp-delta",
            vec![vuln("CVE-2", &updater, "vim")],
            vec!["CVE-0".to_string()],
        )
        .await
        .expect("delta_update_vulnerabilities");

    assert_eq!(vuln_row_count(&updater, "CVE-0").await, 1, "CVE-0 row exists before gc");
    assert_eq!(vuln_row_count(&updater, "CVE-3").await, 1);
    assert_eq!(vuln_row_count(&updater, "CVE-2").await, 1);

    // Run GC with a large keep window so the operations themselves aren't
    // touched, only orphaned vulnerabilities are reaped. CVE-0 had its only
    // association dropped by the delta's `deletions`, so it has no
    // remaining `uo_vuln` row and must be gone after gc; CVE-3 (carried
    // forward) and CVE-2 (freshly added) both still have one and must
    // survive.
    let remaining = store.gc(1_000_000).await.expect("gc");
    assert_eq!(remaining, 0);

    assert_eq!(vuln_row_count(&updater, "CVE-0").await, 0, "orphaned CVE-0 must be reaped");
    assert_eq!(vuln_row_count(&updater, "CVE-3").await, 1, "carried-forward CVE-3 must survive");
    assert_eq!(vuln_row_count(&updater, "CVE-2").await, 1, "freshly added CVE-2 must survive");

    let remaining_again = store.gc(1_000_000).await.expect("second gc");
    assert_eq!(remaining_again, 0);
}

#[tokio::test]
async fn only_the_latest_operations_vulnerabilities_are_readable_by_package() {
    let Some(store) = common::test_store().await else {
        return;
    };
    let updater = unique_updater("read-by-package");

    store
        .update_vulnerabilities(&updater, "fp-1", vec![vuln("CVE-1", &updater, "vi")])
        .await
        .expect("first update_vulnerabilities");

    store
        .update_vulnerabilities(&updater, "fp-2", vec![vuln("CVE-2", &updater, "vim")])
        .await
        .expect("second update_vulnerabilities");

    // The first operation is superseded: its "vi" vulnerability must no
    // longer be readable, even though the row itself still exists (it only
    // becomes an orphan, and gc-eligible, once nothing references it).
    let vi_hits = store.vulnerabilities_by_package("vi").await.expect("vulnerabilities_by_package vi");
    assert!(
        vi_hits.iter().all(|v| v.updater != updater),
        "a superseded operation's vulnerabilities must not be visible"
    );

    let vim_hits = store.vulnerabilities_by_package("vim").await.expect("vulnerabilities_by_package vim");
    assert!(
        vim_hits.iter().any(|v| v.updater == updater && v.name == "CVE-2"),
        "the latest operation's vulnerabilities must be visible"
    );
}

#[tokio::test]
async fn empty_full_snapshot_is_a_no_op_operation() {
    let Some(store) = common::test_store().await else {
        return;
    };
    let updater = unique_updater("empty-snapshot");

    let reference = store
        .update_vulnerabilities(&updater, "fp-empty", Vec::new())
        .await
        .expect("empty update_vulnerabilities must succeed");

    let latest = store.latest_update_operations().await.unwrap();
    let row = latest.iter().find(|op| op.updater == updater && op.kind == UpdateKind::Vulnerability);
    assert_eq!(row.map(|r| r.reference), Some(reference));
}

#[tokio::test]
async fn gc_throttles_and_converges_to_a_stable_keep_window() {
    let Some(store) = common::test_store().await else {
        return;
    };
    let updater = unique_updater("gc-throttle");

    for i in 0..60 {
        store
            .update_vulnerabilities(&updater, &format!("fp-{i}"), vec![vuln(&format!("CVE-{i}"), &updater, "pkg")])
            .await
            .expect("seed update");
    }

    // keep=5, GC_THROTTLE=50: first call should report 60 - 5 - 50 = 5
    // still-eligible operations beyond the throttle.
    let first = store.gc(5).await.expect("first gc call");
    assert_eq!(first, 5);

    let second = store.gc(5).await.expect("second gc call");
    assert_eq!(second, 0);
}
