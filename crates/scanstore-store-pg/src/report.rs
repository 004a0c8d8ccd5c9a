use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use scanstore_store_traits::{Digest, IndexReport, IndexState, StoreResult};
use tracing::instrument;

use crate::error_map::map_diesel_err;
use crate::models::indexer::{IndexReportRow, NewIndexReportRow};
use crate::schema::indexer::{indexreport, manifest};
use crate::store::PgStore;

fn index_state_from_str(s: &str) -> IndexState {
    match s {
        "index_finished" => IndexState::IndexFinished,
        "index_error" => IndexState::IndexError,
        _ => IndexState::Scanning,
    }
}

#[instrument(skip(store, report))]
pub async fn set_index_report(store: &PgStore, report: &IndexReport) -> StoreResult<()> {
    let digest = report.manifest.canonical();
    let mut conn = store.connection().await?;

    let mid: i32 = manifest::table
        .filter(manifest::digest.eq(&digest))
        .select(manifest::id)
        .first(&mut conn)
        .await
        .map_err(|e| map_diesel_err("set_index_report", digest.clone(), e))?;

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
        .execute(&mut conn)
        .await
        .map_err(|e| map_diesel_err("set_index_report", digest, e))?;

    Ok(())
}

/// `Ok(None)` (not an error) when absent, as spec'd: report presence is
/// orthogonal to error handling.
#[instrument(skip(store))]
pub async fn index_report(store: &PgStore, digest: &Digest) -> StoreResult<Option<IndexReport>> {
    let canonical = digest.canonical();
    let mut conn = store.connection().await?;

    let row: Option<IndexReportRow> = indexreport::table
        .inner_join(manifest::table.on(manifest::id.eq(indexreport::manifest_id)))
        .filter(manifest::digest.eq(&canonical))
        .select(IndexReportRow::as_select())
        .first(&mut conn)
        .await
        .optional()
        .map_err(|e| map_diesel_err("index_report", canonical, e))?;

    Ok(row.map(|r| IndexReport {
        manifest: digest.clone(),
        state: index_state_from_str(&r.state),
        contents: r.scan_result,
    }))
}
