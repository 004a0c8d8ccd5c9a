use thiserror::Error;

/// The store's error taxonomy: precondition violations, not-found results
/// that are not errors at the call sites that expect them, transient
/// infrastructure failures a caller should retry, and internal errors that
/// should be impossible on a correct path.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("precondition failed for {operation}: {reason}")]
    Precondition { operation: &'static str, reason: String },

    #[error("{what} not found: {identifier}")]
    NotFound { what: &'static str, identifier: String },

    #[error("transient failure during {operation}: {source}")]
    Transient {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("internal error during {operation} (context: {context}): {source}")]
    Internal {
        operation: &'static str,
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    pub fn precondition(operation: &'static str, reason: impl Into<String>) -> Self {
        StoreError::Precondition {
            operation,
            reason: reason.into(),
        }
    }

    pub fn not_found(what: &'static str, identifier: impl Into<String>) -> Self {
        StoreError::NotFound {
            what,
            identifier: identifier.into(),
        }
    }

    pub fn transient(
        operation: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Transient {
            operation,
            source: Box::new(source),
        }
    }

    pub fn internal(
        operation: &'static str,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Internal {
            operation,
            context: context.into(),
            source: Box::new(source),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
