use thiserror::Error;

/// Result type for hybridsearch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the hybrid search core.
///
/// Every variant maps to one of the five wire codes in `ErrorCode` via
/// [`Error::code`]. Validation and not-found errors are terminal and
/// surfaced directly to the caller; dependency failures are meant to be
/// caught and degraded by the stage that produced them, not propagated
/// through the orchestrator.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid top_k: {0}")]
    InvalidTopK(String),

    #[error("store not found: {0}")]
    StoreNotFound(String),

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    pub fn invalid_filter(msg: impl Into<String>) -> Self {
        Self::InvalidFilter(msg.into())
    }

    pub fn invalid_top_k(msg: impl Into<String>) -> Self {
        Self::InvalidTopK(msg.into())
    }

    pub fn store_not_found(store: impl Into<String>) -> Self {
        Self::StoreNotFound(store.into())
    }

    pub fn dependency_unavailable(msg: impl Into<String>) -> Self {
        Self::DependencyUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// The wire error code a transport adapter should report for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidQuery(_) | Error::InvalidFilter(_) | Error::InvalidTopK(_) => {
                ErrorCode::InvalidQuery
            }
            Error::StoreNotFound(_) => ErrorCode::StoreNotFound,
            Error::DependencyUnavailable(_) => ErrorCode::DependencyUnavailable,
            Error::Cancelled => ErrorCode::Cancelled,
            Error::Internal(_) | Error::Config(_) | Error::WithContext { .. } | Error::Other(_) => {
                ErrorCode::Internal
            }
        }
    }

    /// Whether this error should suppress telemetry recording for the request.
    ///
    /// Validation and not-found errors reject before any stage timer starts,
    /// so there is nothing meaningful to record. Cancellation explicitly must
    /// not emit telemetry per the concurrency model.
    pub fn suppresses_telemetry(&self) -> bool {
        matches!(
            self,
            Error::InvalidQuery(_)
                | Error::InvalidFilter(_)
                | Error::InvalidTopK(_)
                | Error::StoreNotFound(_)
                | Error::Cancelled
        )
    }
}

/// Wire-level error code, uniform across HTTP, WebSocket, and agent-tool transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCode {
    InvalidQuery,
    StoreNotFound,
    DependencyUnavailable,
    Cancelled,
    Internal,
}

/// Extension trait for attaching context to a foreign `Result`.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}
