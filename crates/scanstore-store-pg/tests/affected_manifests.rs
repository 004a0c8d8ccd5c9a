//! Exercises scenario 5 of spec.md §8: the NULL-safe manifest-index join
//! that distinguishes "no distribution" from "a different distribution".

mod common;

use chrono::Utc;
use scanstore_store_traits::{
    AffectedManifestResolver, ArchOperation, Digest, Distribution, IndexRecord, IndexRecordCandidate, IndexReport,
    IndexState, IndexerStore, Layer, Manifest, Matcher, NormalizedSeverity, Package, PackageKind, Range, Scanner,
    ScannerKind, Vulnerability,
};

fn digest(hex_tail: &str) -> Digest {
    format!("sha256:{hex_tail:0>64}").parse().unwrap()
}

fn debian(version: &str) -> Distribution {
    Distribution {
        did: "debian".to_string(),
        name: "Debian GNU/Linux".to_string(),
        version: version.to_string(),
        version_id: version.to_string(),
        version_code_name: String::new(),
        pretty_name: format!("Debian GNU/Linux {version}"),
        arch: "amd64".to_string(),
        cpe: format!("cpe:/o:debian:debian_linux:{version}"),
    }
}

fn gzip() -> Package {
    Package {
        name: "gzip".to_string(),
        kind: PackageKind::Binary,
        version: "1.10-4".to_string(),
        normalized_version: None,
        module: String::new(),
        arch: "amd64".to_string(),
        source: None,
    }
}

/// Matches every candidate unconditionally: this test is about the store's
/// NULL-safe manifest-index join, not version-filtering logic.
struct AlwaysVulnerable;

impl Matcher for AlwaysVulnerable {
    fn vulnerable(&self, _record: &IndexRecord, _vuln: &Vulnerability) -> bool {
        true
    }
}

fn gzip_vuln(distribution: Option<Distribution>) -> Vulnerability {
    Vulnerability {
        name: "CVE-GZIP-1".to_string(),
        updater: "test-updater".to_string(),
        description: "desc".to_string(),
        issued: Utc::now(),
        severity: "High".to_string(),
        normalized_severity: NormalizedSeverity::High,
        package_name: "gzip".to_string(),
        distribution,
        repository: None,
        fixed_in_version: None,
        arch_operation: ArchOperation::Any,
        arch: None,
        vulnerable_range: Range::empty(),
    }
}

async fn index_gzip_manifest(store: &scanstore_store_pg::PgStore, manifest_digest: &Digest, dist: Distribution) {
    let layer_digest = digest("7777");
    store
        .persist_manifest(&Manifest {
            digest: manifest_digest.clone(),
            layers: vec![Layer { digest: layer_digest.clone() }],
        })
        .await
        .unwrap();

    let scanner = Scanner {
        name: "affected-test-scanner".to_string(),
        version: "1.0.0".to_string(),
        kind: ScannerKind::Package,
    };
    store.register_scanners(&[scanner.clone()]).await.unwrap();
    let scanner_id = store.select_scanner_ids(&[scanner]).await.unwrap()[0];
    store.index_packages(&[gzip()], &layer_digest, scanner_id).await.unwrap();

    let dist_scanner = Scanner {
        name: "affected-test-dist-scanner".to_string(),
        version: "1.0.0".to_string(),
        kind: ScannerKind::Distribution,
    };
    store.register_scanners(&[dist_scanner.clone()]).await.unwrap();
    let dist_scanner_id = store.select_scanner_ids(&[dist_scanner]).await.unwrap()[0];
    store
        .index_distributions(&[dist.clone()], &layer_digest, dist_scanner_id)
        .await
        .unwrap();

    let report = IndexReport {
        manifest: manifest_digest.clone(),
        state: IndexState::IndexFinished,
        contents: serde_json::json!({
            "candidates": [IndexRecordCandidate {
                package: gzip(),
                distribution: Some(dist),
                repository: None,
            }],
        }),
    };
    store.index_manifest(&report).await.unwrap();
}

#[tokio::test]
async fn affected_manifests_matches_exact_distribution_only() {
    let Some(store) = common::test_store().await else {
        return;
    };

    let debian10_manifest = digest("de610aaaa1");
    let debian9_manifest = digest("de69bbbb1");

    index_gzip_manifest(&store, &debian10_manifest, debian("10")).await;
    index_gzip_manifest(&store, &debian9_manifest, debian("9")).await;

    let vuln = gzip_vuln(Some(debian("10")));
    let affected = store.affected_manifests(&vuln, &AlwaysVulnerable).await.expect("affected_manifests");

    assert!(affected.contains(&debian10_manifest));
    assert!(!affected.contains(&debian9_manifest));
}

#[tokio::test]
async fn affected_manifests_is_empty_when_the_vulnerabilitys_distribution_is_unindexed() {
    let Some(store) = common::test_store().await else {
        return;
    };

    let vuln = gzip_vuln(Some(debian("999-nonexistent")));
    let affected = store.affected_manifests(&vuln, &AlwaysVulnerable).await.expect("affected_manifests");
    assert!(affected.is_empty());
}

#[tokio::test]
async fn affected_manifests_null_distribution_does_not_match_a_manifest_with_one() {
    let Some(store) = common::test_store().await else {
        return;
    };

    let manifest_digest = digest("fadedfee1234");
    index_gzip_manifest(&store, &manifest_digest, debian("11")).await;

    // No distribution on the vulnerability: `specifies_context` is false, so
    // the resolver proceeds with dist_id = None and must NOT match a
    // manifest-index row with a non-NULL dist_id (SQL `NULL = x` is never
    // true; the store's explicit branch must mirror that, not paper over
    // it with an unconditional equality).
    let vuln = gzip_vuln(None);
    let affected = store.affected_manifests(&vuln, &AlwaysVulnerable).await.expect("affected_manifests");
    assert!(!affected.contains(&manifest_digest));
}
