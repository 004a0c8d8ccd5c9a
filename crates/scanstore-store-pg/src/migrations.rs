use diesel::prelude::*;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use scanstore_store_traits::{StoreError, StoreResult};
use tracing::info;

pub const INDEXER_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/indexer");
pub const MATCHER_MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/matcher");

/// Runs every forward-only migration for both logical databases against
/// `database_url`. `diesel_migrations` only drives a synchronous
/// `Connection`, so this wraps a fresh `AsyncPgConnection` in
/// `AsyncConnectionWrapper` and does the actual work on a blocking thread,
/// mirroring `sui-pg-db`'s use of the `async-connection-wrapper` feature.
pub async fn run_migrations(database_url: &str) -> StoreResult<()> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || run_migrations_blocking(&database_url))
        .await
        .map_err(|e| StoreError::internal("run_migrations", "migration task panicked", e))?
}

fn run_migrations_blocking(database_url: &str) -> StoreResult<()> {
    let mut conn: AsyncConnectionWrapper<AsyncPgConnection> = AsyncConnectionWrapper::establish(database_url)
        .map_err(|e| StoreError::internal("run_migrations", "establishing migration connection", e))?;

    info!("applying indexer schema migrations");
    conn.run_pending_migrations(INDEXER_MIGRATIONS)
        .map_err(|e| StoreError::internal("run_migrations", "indexer migrations", AnyhowCompat(e)))?;

    info!("applying matcher schema migrations");
    conn.run_pending_migrations(MATCHER_MIGRATIONS)
        .map_err(|e| StoreError::internal("run_migrations", "matcher migrations", AnyhowCompat(e)))?;

    Ok(())
}

/// `diesel_migrations` returns `Box<dyn std::error::Error + Send + Sync>`
/// already, but the boxed trait object itself isn't `'static` by name in a
/// way that lets us re-box it directly as a typed source; this newtype
/// gives it a concrete type to implement `std::error::Error` on.
#[derive(Debug)]
struct AnyhowCompat(Box<dyn std::error::Error + Send + Sync>);

impl std::fmt::Display for AnyhowCompat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for AnyhowCompat {}
