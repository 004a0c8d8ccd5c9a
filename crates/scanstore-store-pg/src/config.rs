/// Everything the host injects to open a store: connection string, pool
/// size, application name, and whether to run migrations on open. Loading
/// these values from environment/CLI/file is a host concern and out of
/// scope here.
#[derive(Clone, Debug)]
pub struct PgStoreConfig {
    pub database_url: String,
    /// `None` maps to an effectively unbounded pool (the v5 profile spec.md
    /// §5 describes); `Some(n)` bounds it (the v4 default is 30).
    pub pool_size: Option<u32>,
    pub application_name: String,
    pub run_migrations_on_open: bool,
}

impl PgStoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool_size: Some(30),
            application_name: "scanstore".to_string(),
            run_migrations_on_open: true,
        }
    }
}
