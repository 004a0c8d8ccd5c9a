use diesel::result::{DatabaseErrorKind, Error as DieselError};
use scanstore_store_traits::StoreError;

/// Translates a `diesel` error into the store's error taxonomy. Callers
/// that expect `ErrNoRows` to mean "absent" (spec.md §7's local-recovery
/// exception) should call `.optional()` (or the async-diesel equivalent)
/// *before* reaching this function; by the time an error gets here it is
/// never "not found" in the benign sense.
pub fn map_diesel_err(operation: &'static str, context: impl Into<String>, e: DieselError) -> StoreError {
    match &e {
        DieselError::DatabaseError(kind, _) => match kind {
            DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation => {
                StoreError::internal(operation, context, e)
            }
            DatabaseErrorKind::SerializationFailure
            | DatabaseErrorKind::ReadOnlyTransaction
            | DatabaseErrorKind::ClosedConnection => StoreError::transient(operation, e),
            _ => StoreError::internal(operation, context, e),
        },
        DieselError::NotFound => StoreError::internal(
            operation,
            format!("{}: unexpected NotFound (call .optional() first)", context.into()),
            e,
        ),
        DieselError::BrokenTransactionManager
        | DieselError::AlreadyInTransaction
        | DieselError::NotInTransaction => StoreError::transient(operation, e),
        _ => StoreError::internal(operation, context, e),
    }
}

/// Translates a pool-checkout failure (connection exhaustion, connection
/// refused) into the store's taxonomy; these are always transient.
pub fn map_pool_err<E>(operation: &'static str, e: bb8::RunError<E>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::transient(operation, PoolErrorDisplay(e.to_string()))
}

#[derive(Debug)]
struct PoolErrorDisplay(String);

impl std::fmt::Display for PoolErrorDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for PoolErrorDisplay {}
