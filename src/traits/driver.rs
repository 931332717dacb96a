use async_trait::async_trait;

use crate::error::Result;
use crate::types::{RawQueryResult, SqlValue};

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Opening a connection from a connection descriptor
/// - Converting SqlValue parameters to native types
/// - Executing statements and converting results to RawQueryResult
///
/// Errors raised by the underlying client must be returned as
/// `PgPatternsError::Statement` without being translated.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Open a new connection. Each call returns an independent connection.
    async fn connect(&self, descriptor: &str) -> Result<Box<dyn DriverConnection>>;
}

/// A single open connection.
#[async_trait]
pub trait DriverConnection: Send {
    /// Execute a SQL statement with the given parameters.
    /// Parameters use PostgreSQL-style placeholders ($1, $2, etc.)
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult>;

    /// Release the connection. Called after failed statements too, and may be
    /// called more than once.
    fn close(&mut self);
}
