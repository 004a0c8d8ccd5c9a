use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use scanstore_store_traits::{
    Digest, Distribution, IndexCounts, IndexFile, Package, Repository, ScannerId, StoreResult,
};

use crate::convert::package_from_row;
use crate::error_map::map_diesel_err;
use crate::models::indexer::{
    DistRow, FileRow, NewDistRow, NewDistScanArtifactRow, NewFileRow, NewFileScanArtifactRow,
    NewPackageRow, NewPackageScanArtifactRow, NewRepoRow, NewRepoScanArtifactRow, PackageRow,
    RepoRow,
};
use crate::schema::indexer::{
    dist, dist_scanartifact, file, file_scanartifact, layer, package, package_scanartifact, repo,
    repo_scanartifact,
};
use crate::store::PgStore;

async fn layer_id(conn: &mut AsyncPgConnection, digest: &Digest) -> StoreResult<i32> {
    let canonical = digest.canonical();
    layer::table
        .filter(layer::digest.eq(&canonical))
        .select(layer::id)
        .first(conn)
        .await
        .optional()
        .map_err(|e| map_diesel_err("artifact_writer", canonical.clone(), e))?
        .ok_or_else(|| {
            scanstore_store_traits::StoreError::precondition(
                "artifact_writer",
                format!("layer {canonical} has not been persisted via persist_manifest"),
            )
        })
}

pub async fn index_packages(
    store: &PgStore,
    packages: &[Package],
    layer_digest: &Digest,
    scanner: ScannerId,
) -> StoreResult<IndexCounts> {
    let mut counts = IndexCounts::default();
    let (named, skipped): (Vec<&Package>, Vec<&Package>) =
        packages.iter().partition(|p| !p.is_name_empty());
    counts.skipped_empty_name = skipped.len();
    if named.is_empty() {
        return Ok(counts);
    }

    let mut conn = store.connection().await?;
    let scanner_id = scanner.0 as i32;
    let result: StoreResult<usize> = conn
        .transaction(|conn| {
            async move {
                let lid = layer_id(conn, layer_digest).await?;

                // Batch 1: upsert every package row seen, including each
                // package's source row (substituting the zero-source
                // sentinel when absent, so every package row has an
                // associated source row in storage).
                let mut flat = Vec::new();
                for p in &named {
                    flat.push((*p).clone());
                    if let Some(src) = &p.source {
                        flat.push((**src).clone());
                    } else {
                        flat.push(Package::zero_source_sentinel());
                    }
                }
                upsert_packages(conn, &flat).await?;

                // Batch 2: resolve each package/source to its id by
                // semantic key, then upsert the scan-artifact links.
                let mut links = Vec::with_capacity(named.len());
                for p in &named {
                    let package_id = select_package_id(conn, p).await?;
                    let source_id = match &p.source {
                        Some(src) => select_package_id(conn, src).await?,
                        None => select_package_id(conn, &Package::zero_source_sentinel()).await?,
                    };
                    links.push(NewPackageScanArtifactRow {
                        package_id,
                        source_id,
                        layer_id: lid,
                        scanner_id,
                    });
                }

                diesel::insert_into(package_scanartifact::table)
                    .values(&links)
                    .on_conflict((
                        package_scanartifact::package_id,
                        package_scanartifact::source_id,
                        package_scanartifact::layer_id,
                        package_scanartifact::scanner_id,
                    ))
                    .do_nothing()
                    .execute(conn)
                    .await?;

                Ok(named.len())
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| map_diesel_err("index_packages", layer_digest.canonical(), e));

    counts.written = result?;
    Ok(counts)
}

async fn upsert_packages(conn: &mut AsyncPgConnection, packages: &[Package]) -> diesel::QueryResult<()> {
    if packages.is_empty() {
        return Ok(());
    }
    let rows: Vec<NewPackageRow> = packages
        .iter()
        .map(|p| NewPackageRow {
            name: &p.name,
            kind: p.kind.as_str(),
            version: &p.version,
            normalized_version_kind: p
                .normalized_version
                .as_ref()
                .filter(|v| !v.is_empty_kind())
                .map(|v| v.kind.as_str()),
            normalized_version: p
                .normalized_version
                .as_ref()
                .filter(|v| !v.is_empty_kind())
                .map(|v| v.components.to_vec()),
            module: &p.module,
            arch: &p.arch,
        })
        .collect();

    diesel::insert_into(package::table)
        .values(&rows)
        .on_conflict((package::name, package::kind, package::version, package::module, package::arch))
        .do_nothing()
        .execute(conn)
        .await?;
    Ok(())
}

pub(crate) async fn select_package_id(conn: &mut AsyncPgConnection, p: &Package) -> diesel::QueryResult<i32> {
    package::table
        .filter(package::name.eq(&p.name))
        .filter(package::kind.eq(p.kind.as_str()))
        .filter(package::version.eq(&p.version))
        .filter(package::module.eq(&p.module))
        .filter(package::arch.eq(&p.arch))
        .select(PackageRow::as_select())
        .first(conn)
        .await
        .map(|row| row.id)
}

pub async fn index_distributions(
    store: &PgStore,
    distributions: &[Distribution],
    layer_digest: &Digest,
    scanner: ScannerId,
) -> StoreResult<IndexCounts> {
    let mut counts = IndexCounts::default();
    let named: Vec<&Distribution> = distributions.iter().filter(|d| !d.did.is_empty()).collect();
    counts.skipped_empty_name = distributions.len() - named.len();
    if named.is_empty() {
        return Ok(counts);
    }

    let mut conn = store.connection().await?;
    let scanner_id = scanner.0 as i32;
    let result: StoreResult<usize> = conn
        .transaction(|conn| {
            async move {
                let lid = layer_id(conn, layer_digest).await?;

                let rows: Vec<NewDistRow> = named
                    .iter()
                    .map(|d| NewDistRow {
                        did: &d.did,
                        name: &d.name,
                        version: &d.version,
                        version_id: &d.version_id,
                        version_code_name: &d.version_code_name,
                        pretty_name: &d.pretty_name,
                        arch: &d.arch,
                        cpe: &d.cpe,
                    })
                    .collect();
                diesel::insert_into(dist::table)
                    .values(&rows)
                    .on_conflict((
                        dist::did,
                        dist::name,
                        dist::version,
                        dist::version_id,
                        dist::version_code_name,
                        dist::pretty_name,
                        dist::arch,
                        dist::cpe,
                    ))
                    .do_nothing()
                    .execute(conn)
                    .await?;

                let mut links = Vec::with_capacity(named.len());
                for d in &named {
                    let dist_id = select_dist_id(conn, d).await?;
                    links.push(NewDistScanArtifactRow {
                        dist_id,
                        layer_id: lid,
                        scanner_id,
                    });
                }

                diesel::insert_into(dist_scanartifact::table)
                    .values(&links)
                    .on_conflict((
                        dist_scanartifact::dist_id,
                        dist_scanartifact::layer_id,
                        dist_scanartifact::scanner_id,
                    ))
                    .do_nothing()
                    .execute(conn)
                    .await?;

                Ok(named.len())
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| map_diesel_err("index_distributions", layer_digest.canonical(), e));

    counts.written = result?;
    Ok(counts)
}

pub(crate) async fn select_dist_id(conn: &mut AsyncPgConnection, d: &Distribution) -> diesel::QueryResult<i32> {
    dist::table
        .filter(dist::did.eq(&d.did))
        .filter(dist::name.eq(&d.name))
        .filter(dist::version.eq(&d.version))
        .filter(dist::version_id.eq(&d.version_id))
        .filter(dist::version_code_name.eq(&d.version_code_name))
        .filter(dist::pretty_name.eq(&d.pretty_name))
        .filter(dist::arch.eq(&d.arch))
        .filter(dist::cpe.eq(&d.cpe))
        .select(DistRow::as_select())
        .first(conn)
        .await
        .map(|row| row.id)
}

pub(crate) async fn select_repo_id(conn: &mut AsyncPgConnection, r: &Repository) -> diesel::QueryResult<i32> {
    repo::table
        .filter(repo::name.eq(&r.name))
        .filter(repo::key.eq(&r.key))
        .filter(repo::uri.eq(&r.uri))
        .filter(repo::cpe.eq(&r.cpe))
        .select(RepoRow::as_select())
        .first(conn)
        .await
        .map(|row| row.id)
}

pub async fn index_repositories(
    store: &PgStore,
    repositories: &[Repository],
    layer_digest: &Digest,
    scanner: ScannerId,
) -> StoreResult<IndexCounts> {
    let mut counts = IndexCounts::default();
    let named: Vec<&Repository> = repositories.iter().filter(|r| !r.name.is_empty()).collect();
    counts.skipped_empty_name = repositories.len() - named.len();
    if named.is_empty() {
        return Ok(counts);
    }

    let mut conn = store.connection().await?;
    let scanner_id = scanner.0 as i32;
    let result: StoreResult<usize> = conn
        .transaction(|conn| {
            async move {
                let lid = layer_id(conn, layer_digest).await?;

                let rows: Vec<NewRepoRow> = named
                    .iter()
                    .map(|r| NewRepoRow {
                        name: &r.name,
                        key: &r.key,
                        uri: &r.uri,
                        cpe: &r.cpe,
                    })
                    .collect();
                diesel::insert_into(repo::table)
                    .values(&rows)
                    .on_conflict((repo::name, repo::key, repo::uri, repo::cpe))
                    .do_nothing()
                    .execute(conn)
                    .await?;

                let mut links = Vec::with_capacity(named.len());
                for r in &named {
                    let repo_id = select_repo_id(conn, r).await?;
                    links.push(NewRepoScanArtifactRow {
                        repo_id,
                        layer_id: lid,
                        scanner_id,
                    });
                }

                diesel::insert_into(repo_scanartifact::table)
                    .values(&links)
                    .on_conflict((
                        repo_scanartifact::repo_id,
                        repo_scanartifact::layer_id,
                        repo_scanartifact::scanner_id,
                    ))
                    .do_nothing()
                    .execute(conn)
                    .await?;

                Ok(named.len())
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| map_diesel_err("index_repositories", layer_digest.canonical(), e));

    counts.written = result?;
    Ok(counts)
}

pub async fn index_files(
    store: &PgStore,
    files: &[IndexFile],
    layer_digest: &Digest,
    scanner: ScannerId,
) -> StoreResult<IndexCounts> {
    let mut counts = IndexCounts::default();
    let named: Vec<&IndexFile> = files.iter().filter(|f| !f.path.is_empty()).collect();
    counts.skipped_empty_name = files.len() - named.len();
    if named.is_empty() {
        return Ok(counts);
    }

    let mut conn = store.connection().await?;
    let scanner_id = scanner.0 as i32;
    let result: StoreResult<usize> = conn
        .transaction(|conn| {
            async move {
                let lid = layer_id(conn, layer_digest).await?;

                let rows: Vec<NewFileRow> = named
                    .iter()
                    .map(|f| NewFileRow {
                        path: &f.path,
                        kind: f.kind.as_str(),
                    })
                    .collect();
                diesel::insert_into(file::table)
                    .values(&rows)
                    .on_conflict((file::path, file::kind))
                    .do_nothing()
                    .execute(conn)
                    .await?;

                let mut links = Vec::with_capacity(named.len());
                for f in &named {
                    let file_row: FileRow = file::table
                        .filter(file::path.eq(&f.path))
                        .filter(file::kind.eq(f.kind.as_str()))
                        .select(FileRow::as_select())
                        .first(conn)
                        .await?;
                    links.push(NewFileScanArtifactRow {
                        file_id: file_row.id,
                        layer_id: lid,
                        scanner_id,
                    });
                }

                diesel::insert_into(file_scanartifact::table)
                    .values(&links)
                    .on_conflict((
                        file_scanartifact::file_id,
                        file_scanartifact::layer_id,
                        file_scanartifact::scanner_id,
                    ))
                    .do_nothing()
                    .execute(conn)
                    .await?;

                Ok(named.len())
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| map_diesel_err("index_files", layer_digest.canonical(), e));

    counts.written = result?;
    Ok(counts)
}

/// `PackagesByLayer(L, scanners)`: every package any of `scanners` reported
/// for layer `L`, with each package's `source` back-pointer resolved (the
/// zero-source sentinel substituted at write time collapses back to
/// `None` here, so this is the exact inverse of `index_packages`).
pub async fn packages_by_layer(
    store: &PgStore,
    layer_digest: &Digest,
    scanners: &[ScannerId],
) -> StoreResult<Vec<Package>> {
    let mut conn = store.connection().await?;
    let lid = layer_id(&mut conn, layer_digest).await?;
    let scanner_ids: Vec<i32> = scanners.iter().map(|s| s.0 as i32).collect();

    let links: Vec<(i32, i32)> = package_scanartifact::table
        .filter(package_scanartifact::layer_id.eq(lid))
        .filter(package_scanartifact::scanner_id.eq_any(&scanner_ids))
        .select((package_scanartifact::package_id, package_scanartifact::source_id))
        .distinct()
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("packages_by_layer", layer_digest.canonical(), e))?;

    let mut ids: Vec<i32> = links.iter().flat_map(|(p, s)| [*p, *s]).collect();
    ids.sort_unstable();
    ids.dedup();

    let rows: Vec<PackageRow> = package::table
        .filter(package::id.eq_any(&ids))
        .select(PackageRow::as_select())
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("packages_by_layer", layer_digest.canonical(), e))?;

    let by_id: std::collections::HashMap<i32, &PackageRow> = rows.iter().map(|r| (r.id, r)).collect();

    Ok(links
        .iter()
        .filter_map(|(package_id, source_id)| {
            let row = by_id.get(package_id)?;
            let mut pkg = package_from_row(row);
            if let Some(source_row) = by_id.get(source_id) {
                if !is_zero_source_sentinel(source_row) {
                    pkg.source = Some(Box::new(package_from_row(source_row)));
                }
            }
            Some(pkg)
        })
        .collect())
}

fn is_zero_source_sentinel(row: &PackageRow) -> bool {
    row.name.is_empty() && row.version.is_empty() && row.module.is_empty() && row.arch.is_empty()
}
