use diesel::sql_types::Bool;
use diesel::QueryableByName;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use scanstore_store_traits::{Digest, StoreError, StoreResult};

use crate::error_map::map_diesel_err;

/// A stable 64-bit key derived from a manifest digest, used with
/// Postgres's advisory lock family. `hashtext` is Postgres's own text hash,
/// so two processes hashing the same digest string always agree.
fn lock_key_sql(digest: &Digest) -> String {
    format!("hashtext('{}')::bigint", digest.canonical().replace('\'', "''"))
}

#[derive(QueryableByName)]
struct LockAcquired {
    #[diesel(sql_type = Bool)]
    locked: bool,
}

/// Attempts the transaction-scoped advisory lock `DeleteManifests` takes at
/// the start of each manifest's deletion. Released automatically at
/// commit/rollback. Returns `false` (not an error) when another session
/// already holds the same key, which the deletion engine treats as "in use
/// elsewhere" and skips.
///
/// Returns `diesel::result::Error` rather than `StoreResult` so it composes
/// directly inside a `conn.transaction(..)` callback; callers outside a
/// transaction should map the error themselves.
pub(crate) async fn try_xact_lock_raw(
    conn: &mut AsyncPgConnection,
    digest: &Digest,
) -> diesel::QueryResult<bool> {
    let sql = format!(
        "SELECT pg_try_advisory_xact_lock({}) AS locked",
        lock_key_sql(digest)
    );
    let row: LockAcquired = diesel::sql_query(sql).get_result(conn).await?;
    Ok(row.locked)
}

/// A session-scoped advisory lock guard for long-running operations that
/// must correctly block a concurrent deletion without holding open a
/// transaction. Acquired with `pg_advisory_lock`, released with
/// `pg_advisory_unlock` on drop via [`SessionLock::release`] (async drop
/// is not available, so callers must call `release` explicitly).
pub struct SessionLock {
    key_sql: String,
}

impl SessionLock {
    pub async fn acquire(conn: &mut AsyncPgConnection, digest: &Digest) -> StoreResult<SessionLock> {
        let key_sql = lock_key_sql(digest);
        diesel::sql_query(format!("SELECT pg_advisory_lock({})", key_sql))
            .execute(conn)
            .await
            .map_err(|e| map_diesel_err("session_lock_acquire", digest.canonical(), e))?;
        Ok(SessionLock { key_sql })
    }

    pub async fn release(self, conn: &mut AsyncPgConnection) -> StoreResult<()> {
        diesel::sql_query(format!("SELECT pg_advisory_unlock({})", self.key_sql))
            .execute(conn)
            .await
            .map_err(|e| StoreError::internal("session_lock_release", "advisory unlock", e))?;
        Ok(())
    }
}
