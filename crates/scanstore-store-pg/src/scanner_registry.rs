use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use scanstore_store_traits::{Scanner, ScannerId, ScannerKind, StoreError, StoreResult};

use crate::error_map::map_diesel_err;
use crate::models::indexer::{NewScannerRow, ScannerRow};
use crate::schema::indexer::scanner as scanner_table;
use crate::store::PgStore;

fn kind_str(kind: ScannerKind) -> &'static str {
    match kind {
        ScannerKind::Package => "package",
        ScannerKind::Distribution => "distribution",
        ScannerKind::Repository => "repository",
        ScannerKind::File => "file",
    }
}

pub(crate) fn kind_from_str(s: &str) -> Option<ScannerKind> {
    Some(match s {
        "package" => ScannerKind::Package,
        "distribution" => ScannerKind::Distribution,
        "repository" => ScannerKind::Repository,
        "file" => ScannerKind::File,
        _ => return None,
    })
}

type CacheKey = (String, String, ScannerKind);

pub async fn register_scanners(store: &PgStore, scanners: &[Scanner]) -> StoreResult<()> {
    if scanners.is_empty() {
        return Ok(());
    }
    let new_rows: Vec<NewScannerRow> = scanners
        .iter()
        .map(|s| NewScannerRow {
            name: &s.name,
            version: &s.version,
            kind: kind_str(s.kind),
        })
        .collect();

    let mut conn = store.connection().await?;
    // `ON CONFLICT DO NOTHING ... RETURNING` returns only the rows that
    // were actually inserted, so a no-op re-registration returns an empty
    // `rows` rather than an error.
    let rows: Vec<ScannerRow> = diesel::insert_into(scanner_table::table)
        .values(&new_rows)
        .on_conflict((scanner_table::name, scanner_table::version, scanner_table::kind))
        .do_nothing()
        .get_results(&mut conn)
        .await
        .map_err(|e| map_diesel_err("register_scanners", "batch insert", e))?;

    store.cache_scanner_rows(&rows);
    Ok(())
}

pub async fn select_scanner_ids(store: &PgStore, scanners: &[Scanner]) -> StoreResult<Vec<ScannerId>> {
    let mut out = Vec::with_capacity(scanners.len());
    let mut misses = Vec::new();
    for (idx, s) in scanners.iter().enumerate() {
        let key: CacheKey = (s.name.clone(), s.version.clone(), s.kind);
        match store.cached_scanner_id(&key) {
            Some(id) => out.push(Some(id)),
            None => {
                out.push(None);
                misses.push((idx, s));
            }
        }
    }

    if !misses.is_empty() {
        let mut conn = store.connection().await?;
        for (idx, s) in misses {
            let kind = kind_str(s.kind);
            let row: Option<ScannerRow> = scanner_table::table
                .filter(scanner_table::name.eq(&s.name))
                .filter(scanner_table::version.eq(&s.version))
                .filter(scanner_table::kind.eq(kind))
                .select(ScannerRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(|e| map_diesel_err("select_scanner_ids", s.name.clone(), e))?;

            let row = row.ok_or_else(|| {
                StoreError::precondition(
                    "select_scanner_ids",
                    format!("scanner not registered: {} {} {:?}", s.name, s.version, s.kind),
                )
            })?;
            store.cache_scanner_rows(std::slice::from_ref(&row));
            out[idx] = Some(ScannerId(row.id as i64));
        }
    }

    Ok(out.into_iter().map(|o| o.expect("filled above")).collect())
}
