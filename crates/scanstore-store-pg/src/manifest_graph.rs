use std::collections::HashSet;

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use scanstore_store_traits::{Digest, IndexReport, Manifest, ScannerId, StoreError, StoreResult};
use tracing::instrument;

use crate::artifact_writer::{select_dist_id, select_package_id, select_repo_id};
use crate::error_map::map_diesel_err;
use crate::models::indexer::{
    NewIndexReportRow, NewLayerRow, NewManifestIndexRow, NewManifestLayerRow, NewManifestRow,
    NewScannedManifestRow,
};
use crate::schema::indexer::{indexreport, layer, manifest, manifest_index, manifest_layer, scanned_manifest};
use crate::store::PgStore;

async fn manifest_id(
    conn: &mut AsyncPgConnection,
    digest: &Digest,
    operation: &'static str,
) -> StoreResult<i32> {
    let canonical = digest.canonical();
    manifest::table
        .filter(manifest::digest.eq(&canonical))
        .select(manifest::id)
        .first(conn)
        .await
        .optional()
        .map_err(|e| map_diesel_err(operation, canonical.clone(), e))?
        .ok_or_else(|| {
            StoreError::precondition(operation, format!("manifest {canonical} has not been persisted"))
        })
}

async fn layer_id(conn: &mut AsyncPgConnection, digest: &str) -> diesel::QueryResult<i32> {
    layer::table
        .filter(layer::digest.eq(digest))
        .select(layer::id)
        .first(conn)
        .await
}

#[instrument(skip(store, manifest_in), fields(manifest = %manifest_in.digest))]
pub async fn persist_manifest(store: &PgStore, manifest_in: &Manifest) -> StoreResult<()> {
    let digest = manifest_in.digest.canonical();
    let mut conn = store.connection().await?;

    conn.transaction(|conn| {
        async move {
            diesel::insert_into(manifest::table)
                .values(&NewManifestRow { digest: &digest })
                .on_conflict(manifest::digest)
                .do_nothing()
                .execute(conn)
                .await?;
            let mid = manifest::table
                .filter(manifest::digest.eq(&digest))
                .select(manifest::id)
                .first::<i32>(conn)
                .await?;

            // A squashed image can legally repeat a layer digest; keep only
            // the first occurrence's position so `manifest_layer.index`
            // still reflects the original layer order.
            let mut seen = HashSet::new();
            for (index, l) in manifest_in.layers.iter().enumerate() {
                let ldigest = l.digest.canonical();
                if !seen.insert(ldigest.clone()) {
                    continue;
                }

                diesel::insert_into(layer::table)
                    .values(&NewLayerRow { digest: &ldigest })
                    .on_conflict(layer::digest)
                    .do_nothing()
                    .execute(conn)
                    .await?;
                let lid = layer_id(conn, &ldigest).await?;

                diesel::insert_into(manifest_layer::table)
                    .values(&NewManifestLayerRow {
                        manifest_id: mid,
                        layer_id: lid,
                        index: index as i32,
                    })
                    .on_conflict((manifest_layer::manifest_id, manifest_layer::layer_id))
                    .do_nothing()
                    .execute(conn)
                    .await?;
            }

            Ok(())
        }
        .scope_boxed()
    })
    .await
    .map_err(|e| map_diesel_err("persist_manifest", digest.clone(), e))
}

#[instrument(skip(store, report), fields(manifest = %report.manifest))]
pub async fn index_manifest(store: &PgStore, report: &IndexReport) -> StoreResult<()> {
    let digest = report.manifest.canonical();
    if report.manifest.algorithm().is_empty() {
        return Err(StoreError::precondition("index_manifest", "manifest digest is empty"));
    }

    let candidates = report.candidates();
    if candidates.is_empty() {
        return Ok(());
    }

    let mut conn = store.connection().await?;
    let mid = manifest_id(&mut conn, &report.manifest, "index_manifest").await?;

    conn.transaction(|conn| {
        async move {
            let mut rows = Vec::with_capacity(candidates.len());
            for c in &candidates {
                let package_id = select_package_id(conn, &c.package).await?;
                let dist_id = match &c.distribution {
                    Some(d) => Some(select_dist_id(conn, d).await?),
                    None => None,
                };
                let repo_id = match &c.repository {
                    Some(r) => Some(select_repo_id(conn, r).await?),
                    None => None,
                };
                rows.push(NewManifestIndexRow {
                    manifest_id: mid,
                    package_id,
                    dist_id,
                    repo_id,
                });

                // Emit the source package's own tuple too, so the manifest
                // index can be resolved starting from either the binary
                // package or its source.
                if let Some(src) = &c.package.source {
                    let source_id = select_package_id(conn, src).await?;
                    rows.push(NewManifestIndexRow {
                        manifest_id: mid,
                        package_id: source_id,
                        dist_id,
                        repo_id,
                    });
                }
            }

            // `manifest_index_tuple_key` is an expression index (it
            // coalesces dist_id/repo_id), not a named constraint, so it
            // can't be targeted with `ON CONFLICT ON CONSTRAINT`. A bare
            // `ON CONFLICT DO NOTHING` with no explicit target matches any
            // violated unique index, including this one.
            diesel::insert_into(manifest_index::table)
                .values(&rows)
                .on_conflict_do_nothing()
                .execute(conn)
                .await?;

            Ok(())
        }
        .scope_boxed()
    })
    .await
    .map_err(|e| map_diesel_err("index_manifest", digest, e))
}

#[instrument(skip(store))]
pub async fn manifest_scanned(store: &PgStore, digest: &Digest, scanners: &[ScannerId]) -> StoreResult<bool> {
    let mut conn = store.connection().await?;
    let mid = manifest_id(&mut conn, digest, "manifest_scanned").await?;

    let observed: Vec<i32> = scanned_manifest::table
        .filter(scanned_manifest::manifest_id.eq(mid))
        .select(scanned_manifest::scanner_id)
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("manifest_scanned", digest.canonical(), e))?;

    let observed: HashSet<i64> = observed.into_iter().map(|id| id as i64).collect();
    Ok(scanners.iter().all(|s| observed.contains(&s.0)))
}

#[instrument(skip(store, report))]
pub async fn set_index_finished(store: &PgStore, report: &IndexReport, scanners: &[ScannerId]) -> StoreResult<()> {
    let digest = report.manifest.canonical();
    let mut conn = store.connection().await?;
    let mid = manifest_id(&mut conn, &report.manifest, "set_index_finished").await?;

    conn.transaction(|conn| {
        async move {
            let rows: Vec<NewScannedManifestRow> = scanners
                .iter()
                .map(|s| NewScannedManifestRow {
                    manifest_id: mid,
                    scanner_id: s.0 as i32,
                })
                .collect();
            if !rows.is_empty() {
                diesel::insert_into(scanned_manifest::table)
                    .values(&rows)
                    .on_conflict((scanned_manifest::manifest_id, scanned_manifest::scanner_id))
                    .do_nothing()
                    .execute(conn)
                    .await?;
            }

            diesel::insert_into(indexreport::table)
                .values(&NewIndexReportRow {
                    manifest_id: mid,
                    state: report.state.as_str().to_string(),
                    scan_result: report.contents.clone(),
                })
                .on_conflict(indexreport::manifest_id)
                .do_update()
                .set((
                    indexreport::state.eq(report.state.as_str()),
                    indexreport::scan_result.eq(&report.contents),
                ))
                .execute(conn)
                .await?;

            Ok(())
        }
        .scope_boxed()
    })
    .await
    .map_err(|e| map_diesel_err("set_index_finished", digest, e))
}
