use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use scanstore_store_traits::{StoreError, StoreResult};
use tracing::info;

use crate::config::PgStoreConfig;

pub type PgPool = Pool<AsyncPgConnection>;

/// Opens a `bb8` pool of `AsyncPgConnection`s per `config`. Named after
/// `new_pg_connection_pool` in the teacher's `sui-indexer` crate.
pub async fn new_pg_connection_pool(config: &PgStoreConfig) -> StoreResult<PgPool> {
    info!(application_name = %config.application_name, "opening Postgres connection pool");
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
    let mut builder = Pool::builder();
    if let Some(size) = config.pool_size {
        builder = builder.max_size(size);
    }
    builder
        .build(manager)
        .await
        .map_err(|e| StoreError::transient("new_pg_connection_pool", e))
}
