use std::collections::HashSet;

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use scanstore_store_traits::{EnrichmentRecord, StoreResult, UpdateKind, UpdateOperation, Vulnerability};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::convert::{new_vuln_row, vulnerability_from_row};
use crate::error_map::map_diesel_err;
use crate::models::matcher::{
    EnrichmentRow, LatestUpdateOperationRow, NewEnrichmentRow, NewUpdateOperationRow, UoEnrichRow,
    UoVulnRow, UpdateOperationRow, VulnRow,
};
use crate::schema::matcher::{enrichment, latest_update_operations, update_operation, uo_enrich, uo_vuln, vuln};
use crate::store::PgStore;

/// Statements per batch before a flush, within spec.md's "≈1000-2000"
/// window.
const BATCH_SIZE: usize = 1000;

async fn open_operation(
    conn: &mut AsyncPgConnection,
    updater: &str,
    kind: UpdateKind,
    fingerprint: &str,
) -> diesel::QueryResult<UpdateOperationRow> {
    diesel::insert_into(update_operation::table)
        .values(&NewUpdateOperationRow {
            reference: Uuid::new_v4(),
            updater,
            kind: kind.as_str(),
            fingerprint,
        })
        .get_result(conn)
        .await
}

async fn insert_vuln_batch(
    conn: &mut AsyncPgConnection,
    op_id: i64,
    vulns: &[&Vulnerability],
) -> diesel::QueryResult<()> {
    if vulns.is_empty() {
        return Ok(());
    }
    let rows: Vec<_> = vulns.iter().map(|v| new_vuln_row(v)).collect();
    let hashes: Vec<Vec<u8>> = rows.iter().map(|r| r.hash.clone()).collect();

    diesel::insert_into(vuln::table)
        .values(&rows)
        .on_conflict(vuln::hash)
        .do_nothing()
        .execute(conn)
        .await?;

    let ids: Vec<i64> = vuln::table
        .filter(vuln::hash.eq_any(&hashes))
        .select(vuln::id)
        .load(conn)
        .await?;

    let assoc: Vec<UoVulnRow> = ids.into_iter().map(|vuln_id| UoVulnRow { uo: op_id, vuln: vuln_id }).collect();
    diesel::insert_into(uo_vuln::table)
        .values(&assoc)
        .on_conflict((uo_vuln::uo, uo_vuln::vuln))
        .do_nothing()
        .execute(conn)
        .await?;

    Ok(())
}

/// `REFRESH MATERIALIZED VIEW CONCURRENTLY` cannot run inside a transaction
/// block, so this always runs on its own connection after the writing
/// transaction has committed.
async fn refresh_latest_update_operations(store: &PgStore) -> StoreResult<()> {
    let mut conn = store.connection().await?;
    diesel::sql_query("REFRESH MATERIALIZED VIEW CONCURRENTLY matcher.latest_update_operations")
        .execute(&mut conn)
        .await
        .map_err(|e| map_diesel_err("refresh_latest_update_operations", "", e))?;
    Ok(())
}

#[instrument(skip(store, vulns), fields(updater, vuln_count = vulns.len()))]
pub async fn update_vulnerabilities(
    store: &PgStore,
    updater: &str,
    fingerprint: &str,
    vulns: Vec<Vulnerability>,
) -> StoreResult<Uuid> {
    let mut conn = store.connection().await?;

    let op: UpdateOperationRow = conn
        .transaction(|conn| {
            let updater = updater.to_string();
            let fingerprint = fingerprint.to_string();
            async move {
                let op = open_operation(conn, &updater, UpdateKind::Vulnerability, &fingerprint).await?;
                insert_batched(conn, op.id, &vulns).await?;
                Ok(op)
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| map_diesel_err("update_vulnerabilities", updater.to_string(), e))?;

    refresh_latest_update_operations(store).await?;
    Ok(op.reference)
}

async fn insert_batched(
    conn: &mut AsyncPgConnection,
    op_id: i64,
    vulns: &[Vulnerability],
) -> diesel::QueryResult<()> {
    let mut skipped = 0usize;
    for chunk in vulns.chunks(BATCH_SIZE) {
        let named: Vec<&Vulnerability> = chunk.iter().filter(|v| !v.has_empty_package_name()).collect();
        skipped += chunk.len() - named.len();
        insert_vuln_batch(conn, op_id, &named).await?;
    }
    if skipped > 0 {
        warn!(skipped, "vulnerabilities skipped for empty package name");
    }
    Ok(())
}

#[instrument(skip(store, adds, deletions), fields(updater, add_count = adds.len(), deletion_count = deletions.len()))]
pub async fn delta_update_vulnerabilities(
    store: &PgStore,
    updater: &str,
    fingerprint: &str,
    adds: Vec<Vulnerability>,
    deletions: Vec<String>,
) -> StoreResult<Uuid> {
    let mut conn = store.connection().await?;
    let add_names: HashSet<String> = adds.iter().map(|v| v.name.clone()).collect();
    let deleted_names: HashSet<String> = deletions.into_iter().collect();

    let op: UpdateOperationRow = conn
        .transaction(|conn| {
            let updater = updater.to_string();
            let fingerprint = fingerprint.to_string();
            async move {
                let op = open_operation(conn, &updater, UpdateKind::Vulnerability, &fingerprint).await?;

                let prior: Option<i64> = update_operation::table
                    .filter(update_operation::updater.eq(&updater))
                    .filter(update_operation::kind.eq(UpdateKind::Vulnerability.as_str()))
                    .filter(update_operation::id.ne(op.id))
                    .order(update_operation::id.desc())
                    .select(update_operation::id)
                    .first(conn)
                    .await
                    .optional()?;

                if let Some(prior_op) = prior {
                    let carried: Vec<(i64, String)> = uo_vuln::table
                        .inner_join(vuln::table.on(vuln::id.eq(uo_vuln::vuln)))
                        .filter(uo_vuln::uo.eq(prior_op))
                        .select((vuln::id, vuln::name))
                        .load(conn)
                        .await?;

                    let rows: Vec<UoVulnRow> = carried
                        .into_iter()
                        .filter(|(_, name)| !add_names.contains(name) && !deleted_names.contains(name))
                        .map(|(vuln_id, _)| UoVulnRow { uo: op.id, vuln: vuln_id })
                        .collect();

                    if !rows.is_empty() {
                        diesel::insert_into(uo_vuln::table)
                            .values(&rows)
                            .on_conflict((uo_vuln::uo, uo_vuln::vuln))
                            .do_nothing()
                            .execute(conn)
                            .await?;
                    }
                }

                insert_batched(conn, op.id, &adds).await?;
                Ok(op)
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| map_diesel_err("delta_update_vulnerabilities", updater.to_string(), e))?;

    refresh_latest_update_operations(store).await?;
    Ok(op.reference)
}

#[instrument(skip(store, records), fields(updater, record_count = records.len()))]
pub async fn update_enrichments(
    store: &PgStore,
    updater: &str,
    fingerprint: &str,
    records: Vec<EnrichmentRecord>,
) -> StoreResult<Uuid> {
    let mut conn = store.connection().await?;

    let op: UpdateOperationRow = conn
        .transaction(|conn| {
            let updater = updater.to_string();
            let fingerprint = fingerprint.to_string();
            async move {
                let op = open_operation(conn, &updater, UpdateKind::Enrichment, &fingerprint).await?;

                for chunk in records.chunks(BATCH_SIZE) {
                    let rows: Vec<NewEnrichmentRow> = chunk
                        .iter()
                        .map(|r| NewEnrichmentRow {
                            hash_kind: "md5".to_string(),
                            hash: r.content_hash().to_vec(),
                            updater: r.updater.clone(),
                            tags: r.sorted_tags(),
                            data: r.data.clone(),
                        })
                        .collect();
                    if rows.is_empty() {
                        continue;
                    }
                    let hashes: Vec<Vec<u8>> = rows.iter().map(|r| r.hash.clone()).collect();

                    diesel::insert_into(enrichment::table)
                        .values(&rows)
                        .on_conflict(enrichment::hash)
                        .do_nothing()
                        .execute(conn)
                        .await?;

                    let ids: Vec<i64> = enrichment::table
                        .filter(enrichment::hash.eq_any(&hashes))
                        .select(enrichment::id)
                        .load(conn)
                        .await?;

                    let assoc: Vec<UoEnrichRow> = ids
                        .into_iter()
                        .map(|enrich_id| UoEnrichRow {
                            enrich: enrich_id,
                            updater: updater.clone(),
                            uo: op.id,
                            date: chrono::Utc::now(),
                        })
                        .collect();
                    diesel::insert_into(uo_enrich::table)
                        .values(&assoc)
                        .on_conflict((uo_enrich::enrich, uo_enrich::uo))
                        .do_nothing()
                        .execute(conn)
                        .await?;
                }

                Ok(op)
            }
            .scope_boxed()
        })
        .await
        .map_err(|e| map_diesel_err("update_enrichments", updater.to_string(), e))?;

    refresh_latest_update_operations(store).await?;
    Ok(op.reference)
}

#[instrument(skip(store, tags))]
pub async fn get_enrichment(store: &PgStore, updater: &str, tags: &[String]) -> StoreResult<Vec<EnrichmentRecord>> {
    let mut conn = store.connection().await?;

    let latest_op: Option<i64> = latest_update_operations::table
        .filter(latest_update_operations::updater.eq(updater))
        .filter(latest_update_operations::kind.eq(UpdateKind::Enrichment.as_str()))
        .select(latest_update_operations::id)
        .first(&mut conn)
        .await
        .optional()
        .map_err(|e| map_diesel_err("get_enrichment", updater.to_string(), e))?;

    let Some(op_id) = latest_op else {
        return Ok(Vec::new());
    };

    let rows: Vec<EnrichmentRow> = uo_enrich::table
        .inner_join(enrichment::table.on(enrichment::id.eq(uo_enrich::enrich)))
        .filter(uo_enrich::uo.eq(op_id))
        .select(EnrichmentRow::as_select())
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("get_enrichment", updater.to_string(), e))?;

    Ok(rows
        .into_iter()
        .map(|r| EnrichmentRecord {
            updater: r.updater,
            tags: r.tags,
            data: r.data,
        })
        .filter(|r| r.matches_any_tag(tags))
        .collect())
}

/// Reader half of `update_vulnerabilities`/`delta_update_vulnerabilities`:
/// resolves the operations currently visible through
/// `latest_update_operations` (of kind `vulnerability`, any updater), then
/// returns every associated vulnerability whose package name matches.
#[instrument(skip(store))]
pub async fn vulnerabilities_by_package(store: &PgStore, package_name: &str) -> StoreResult<Vec<Vulnerability>> {
    let mut conn = store.connection().await?;

    let op_ids: Vec<i64> = latest_update_operations::table
        .filter(latest_update_operations::kind.eq(UpdateKind::Vulnerability.as_str()))
        .select(latest_update_operations::id)
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("vulnerabilities_by_package", package_name.to_string(), e))?;

    if op_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<VulnRow> = uo_vuln::table
        .inner_join(vuln::table.on(vuln::id.eq(uo_vuln::vuln)))
        .filter(uo_vuln::uo.eq_any(&op_ids))
        .filter(vuln::package_name.eq(package_name))
        .select(VulnRow::as_select())
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("vulnerabilities_by_package", package_name.to_string(), e))?;

    Ok(rows.iter().map(vulnerability_from_row).collect())
}

#[instrument(skip(store))]
pub async fn latest_update_operations(store: &PgStore) -> StoreResult<Vec<UpdateOperation>> {
    let mut conn = store.connection().await?;
    let rows: Vec<LatestUpdateOperationRow> = latest_update_operations::table
        .select(LatestUpdateOperationRow::as_select())
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("latest_update_operations", "", e))?;

    Ok(rows
        .into_iter()
        .map(|r| UpdateOperation {
            id: r.id,
            reference: r.reference,
            updater: r.updater,
            kind: if r.kind == UpdateKind::Enrichment.as_str() {
                UpdateKind::Enrichment
            } else {
                UpdateKind::Vulnerability
            },
            fingerprint: r.fingerprint,
            date: r.date,
        })
        .collect())
}
