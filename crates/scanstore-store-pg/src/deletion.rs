use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use scanstore_store_traits::{Digest, StoreResult};
use tracing::{debug, instrument};

use crate::advisory_lock::try_xact_lock_raw;
use crate::error_map::map_diesel_err;
use crate::schema::indexer::{layer, manifest, manifest_layer};
use crate::store::PgStore;

/// Deletes each digest in its own transaction, so one manifest losing the
/// advisory-lock race never blocks the rest of the batch. Within a
/// transaction: acquire the transaction-scoped advisory lock, delete the
/// manifest row (cascading `manifest_layer`, `manifest_index`,
/// `scanned_manifest`, and `indexreport` rows), then delete each
/// previously-associated layer that no other manifest still references.
#[instrument(skip(store, digests))]
pub async fn delete_manifests(store: &PgStore, digests: &[Digest]) -> StoreResult<Vec<Digest>> {
    let mut deleted = Vec::with_capacity(digests.len());

    for digest in digests {
        let mut conn = store.connection().await?;
        let canonical = digest.canonical();

        let outcome: Result<bool, diesel::result::Error> = conn
            .transaction(|conn| {
                async move {
                    let mid: Option<i32> = manifest::table
                        .filter(manifest::digest.eq(&canonical))
                        .select(manifest::id)
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(mid) = mid else {
                        return Ok(false);
                    };

                    if !try_xact_lock_raw(conn, digest).await? {
                        return Ok(false);
                    }

                    let layer_ids: Vec<i32> = manifest_layer::table
                        .filter(manifest_layer::manifest_id.eq(mid))
                        .select(manifest_layer::layer_id)
                        .load(conn)
                        .await?;

                    diesel::delete(manifest::table.filter(manifest::id.eq(mid)))
                        .execute(conn)
                        .await?;

                    for lid in layer_ids {
                        let still_referenced: bool = diesel::select(exists(
                            manifest_layer::table.filter(manifest_layer::layer_id.eq(lid)),
                        ))
                        .get_result(conn)
                        .await?;
                        if !still_referenced {
                            diesel::delete(layer::table.filter(layer::id.eq(lid)))
                                .execute(conn)
                                .await?;
                        }
                    }

                    Ok(true)
                }
                .scope_boxed()
            })
            .await;

        match outcome {
            Ok(true) => deleted.push(digest.clone()),
            Ok(false) => debug!(digest = %digest, "manifest absent or locked elsewhere, skipping"),
            Err(e) => return Err(map_diesel_err("delete_manifests", canonical, e)),
        }
    }

    Ok(deleted)
}
