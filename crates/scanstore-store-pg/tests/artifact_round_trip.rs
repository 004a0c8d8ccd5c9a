//! Exercises scenario 1 of spec.md §8: persisting a manifest, registering a
//! scanner, indexing packages, and reading them back by layer.

mod common;

use scanstore_store_traits::{Digest, IndexerStore, Layer, Manifest, Package, PackageKind, Scanner, ScannerKind};

fn pkg(name: &str) -> Package {
    Package {
        name: name.to_string(),
        kind: PackageKind::Binary,
        version: "1.0-1".to_string(),
        normalized_version: None,
        module: String::new(),
        arch: "x86_64".to_string(),
        source: None,
    }
}

#[tokio::test]
async fn ten_packages_round_trip_through_a_single_layer() {
    let Some(store) = common::test_store().await else {
        return;
    };

    let layer_digest: Digest = "sha256:aaaa000000000000000000000000000000000000000000000000000000aa"
        .parse()
        .unwrap();
    let manifest_digest: Digest = "sha256:bbbb000000000000000000000000000000000000000000000000000000bb"
        .parse()
        .unwrap();

    store
        .persist_manifest(&Manifest {
            digest: manifest_digest.clone(),
            layers: vec![Layer {
                digest: layer_digest.clone(),
            }],
        })
        .await
        .expect("persist_manifest");

    let scanner = Scanner {
        name: "dpkg-scanner".to_string(),
        version: "1.0.0".to_string(),
        kind: ScannerKind::Package,
    };
    store.register_scanners(&[scanner.clone()]).await.expect("register_scanners");
    let ids = store.select_scanner_ids(&[scanner]).await.expect("select_scanner_ids");
    let scanner_id = ids[0];

    let packages: Vec<Package> = (0..10).map(|i| pkg(&format!("pkg-{i}"))).collect();
    let counts = store
        .index_packages(&packages, &layer_digest, scanner_id)
        .await
        .expect("index_packages");
    assert_eq!(counts.written, 10);
    assert_eq!(counts.skipped_empty_name, 0);

    let found = store
        .packages_by_layer(&layer_digest, &[scanner_id])
        .await
        .expect("packages_by_layer");
    assert_eq!(found.len(), 10);
    let mut names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    let mut expected: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
    expected.sort();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn repeated_indexing_is_idempotent() {
    let Some(store) = common::test_store().await else {
        return;
    };

    let layer_digest: Digest = "sha256:cccc000000000000000000000000000000000000000000000000000000cc"
        .parse()
        .unwrap();
    let manifest_digest: Digest = "sha256:dddd000000000000000000000000000000000000000000000000000000dd"
        .parse()
        .unwrap();
    store
        .persist_manifest(&Manifest {
            digest: manifest_digest,
            layers: vec![Layer {
                digest: layer_digest.clone(),
            }],
        })
        .await
        .expect("persist_manifest");

    let scanner = Scanner {
        name: "idempotent-scanner".to_string(),
        version: "2.0.0".to_string(),
        kind: ScannerKind::Package,
    };
    store.register_scanners(&[scanner.clone()]).await.expect("register_scanners");
    store.register_scanners(&[scanner.clone()]).await.expect("register_scanners twice");
    let scanner_id = store.select_scanner_ids(&[scanner]).await.unwrap()[0];

    let packages = vec![pkg("curl"), pkg("vim")];
    store.index_packages(&packages, &layer_digest, scanner_id).await.unwrap();
    store.index_packages(&packages, &layer_digest, scanner_id).await.unwrap();

    let found = store.packages_by_layer(&layer_digest, &[scanner_id]).await.unwrap();
    assert_eq!(found.len(), 2, "second index_packages call must not duplicate rows");
}

#[tokio::test]
async fn empty_package_names_are_skipped_and_counted() {
    let Some(store) = common::test_store().await else {
        return;
    };

    let layer_digest: Digest = "sha256:eeee000000000000000000000000000000000000000000000000000000ee"
        .parse()
        .unwrap();
    let manifest_digest: Digest = "sha256:ffff000000000000000000000000000000000000000000000000000000ff"
        .parse()
        .unwrap();
    store
        .persist_manifest(&Manifest {
            digest: manifest_digest,
            layers: vec![Layer {
                digest: layer_digest.clone(),
            }],
        })
        .await
        .unwrap();

    let scanner = Scanner {
        name: "empty-name-scanner".to_string(),
        version: "1.0.0".to_string(),
        kind: ScannerKind::Package,
    };
    store.register_scanners(&[scanner.clone()]).await.unwrap();
    let scanner_id = store.select_scanner_ids(&[scanner]).await.unwrap()[0];

    let packages = vec![pkg("real-package"), pkg("")];
    let counts = store.index_packages(&packages, &layer_digest, scanner_id).await.unwrap();
    assert_eq!(counts.written, 1);
    assert_eq!(counts.skipped_empty_name, 1);
}
