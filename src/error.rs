use thiserror::Error;

/// Boxed driver error, kept intact so callers can downcast to the driver's own type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for pgpatterns operations
#[derive(Debug, Error)]
pub enum PgPatternsError {
    #[error("Missing configuration: {key} is not set")]
    MissingConfiguration { key: String },

    /// Error raised by the database driver, passed through untouched.
    #[error(transparent)]
    Statement(BoxError),

    #[error("Missing value for named parameter :{0}")]
    MissingParameter(String),

    #[error("Statement has {expected} placeholder(s) but {actual} value(s) were bound")]
    ParameterCount { expected: usize, actual: usize },

    #[error("Cannot convert parameter ${position}: {message}")]
    InvalidParameter { position: usize, message: String },

    #[error("Invalid connection descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

impl PgPatternsError {
    /// Wraps a driver error without translating it.
    pub fn statement<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Statement(Box::new(err))
    }

    /// Returns the driver error if this is a statement error.
    pub fn driver_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Statement(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias for pgpatterns operations
pub type Result<T> = std::result::Result<T, PgPatternsError>;
