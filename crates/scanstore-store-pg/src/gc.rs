use std::collections::HashMap;

use diesel::dsl::{exists, not};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use futures::stream::{self, StreamExt};
use scanstore_store_traits::{StoreError, StoreResult};
use tracing::{debug, instrument};

use crate::error_map::map_diesel_err;
use crate::schema::matcher::{enrichment, uo_enrich, uo_vuln, update_operation, vuln};
use crate::store::PgStore;

/// Operations processed per `gc` call, matching spec.md's `GCThrottle`.
/// Bounds per-call cascade cost; callers invoke `gc` repeatedly until the
/// return value is zero.
const GC_THROTTLE: usize = 50;

/// Throttled garbage collection: identifies every update operation beyond
/// `keep` for its `(updater, kind)` group, deletes the oldest
/// `GC_THROTTLE` of them (cascading their associations), then reaps
/// orphaned vulnerabilities and enrichments per updater with no remaining
/// operation pointing at them. Returns the count still eligible but not
/// yet processed.
#[instrument(skip(store))]
pub async fn gc(store: &PgStore, keep: u32) -> StoreResult<u64> {
    let mut conn = store.connection().await?;

    let rows: Vec<(i64, String, String)> = update_operation::table
        .order((
            update_operation::updater.asc(),
            update_operation::kind.asc(),
            update_operation::id.desc(),
        ))
        .select((update_operation::id, update_operation::updater, update_operation::kind))
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("gc", "listing operations", e))?;

    let mut groups: HashMap<(String, String), Vec<i64>> = HashMap::new();
    for (id, updater, kind) in rows {
        groups.entry((updater, kind)).or_default().push(id);
    }

    // Within a group, rows arrived ordered by date desc (id desc, since ids
    // are strictly increasing with time for a single writer), so the tail
    // past `keep` is exactly the set "beyond the most-recent keep".
    let mut eligible: Vec<i64> = Vec::new();
    for ids in groups.values() {
        if ids.len() as u32 > keep {
            eligible.extend_from_slice(&ids[keep as usize..]);
        }
    }
    eligible.sort_unstable();

    let total_eligible = eligible.len();
    let to_delete: Vec<i64> = eligible.into_iter().take(GC_THROTTLE).collect();

    if !to_delete.is_empty() {
        diesel::delete(update_operation::table.filter(update_operation::id.eq_any(&to_delete)))
            .execute(&mut conn)
            .await
            .map_err(|e| map_diesel_err("gc", "deleting throttled operations", e))?;
        debug!(count = to_delete.len(), "deleted throttled update operations");
    }

    let live_updaters: Vec<String> = update_operation::table
        .select(update_operation::updater)
        .distinct()
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("gc", "listing live updaters", e))?;
    drop(conn);

    let concurrency = num_cpus::get().max(1);
    let results: Vec<StoreResult<()>> = stream::iter(live_updaters)
        .map(|updater| async move { reap_orphans(store, &updater).await })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let errors: Vec<StoreError> = results.into_iter().filter_map(Result::err).collect();
    if !errors.is_empty() {
        return Err(StoreError::internal("gc", "per-updater orphan cleanup", JoinedErrors(errors)));
    }

    Ok((total_eligible - to_delete.len()) as u64)
}

/// Deletes vulnerabilities and enrichments belonging to `updater` with no
/// remaining association row. Runs on its own connection so a slow
/// cleanup for one updater never holds a connection another updater's
/// cleanup needs.
async fn reap_orphans(store: &PgStore, updater: &str) -> StoreResult<()> {
    let mut conn = store.connection().await?;

    diesel::delete(
        vuln::table
            .filter(vuln::updater.eq(updater))
            .filter(not(exists(uo_vuln::table.filter(uo_vuln::vuln.eq(vuln::id))))),
    )
    .execute(&mut conn)
    .await
    .map_err(|e| map_diesel_err("gc", format!("orphan vulnerabilities for {updater}"), e))?;

    diesel::delete(
        enrichment::table
            .filter(enrichment::updater.eq(updater))
            .filter(not(exists(uo_enrich::table.filter(uo_enrich::enrich.eq(enrichment::id))))),
    )
    .execute(&mut conn)
    .await
    .map_err(|e| map_diesel_err("gc", format!("orphan enrichments for {updater}"), e))?;

    Ok(())
}

/// Collects per-updater cleanup failures into a single error, mirroring
/// spec.md's "errors are collected and joined".
#[derive(Debug)]
struct JoinedErrors(Vec<StoreError>);

impl std::fmt::Display for JoinedErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for JoinedErrors {}
