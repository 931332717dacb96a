use std::sync::Arc;

use crate::connection::{ConnectionTarget, ScopedConnection};
use crate::error::Result;
use crate::registry::Registry;
use crate::traits::DatabaseDriver;
use crate::types::{Params, RawQueryResult, Record};

/// Runs single statements, each on its own short-lived connection.
/// Created from a PgPatternsClient.
///
/// Parameters are written as `:name` in the query and bound by the driver.
pub struct Querier {
    driver: Arc<dyn DatabaseDriver>,
    registry: Arc<Registry>,
    target: ConnectionTarget,
}

impl Querier {
    pub(crate) fn new(
        driver: Arc<dyn DatabaseDriver>,
        registry: Arc<Registry>,
        target: ConnectionTarget,
    ) -> Self {
        Self {
            driver,
            registry,
            target,
        }
    }

    /// Execute a statement, discarding any rows it returns.
    pub async fn execute(&self, query: &str, params: Option<&Params>) -> Result<()> {
        self.run("EXECUTE", query, params).await.map(|_| ())
    }

    /// Execute a query and return its first row, or `None` when it matched nothing.
    pub async fn fetch_one(&self, query: &str, params: Option<&Params>) -> Result<Option<Record>> {
        self.run("FETCH_ONE", query, params)
            .await
            .map(RawQueryResult::into_first_record)
    }

    /// Execute a query and return every row, in the order the database produced them.
    pub async fn fetch_all(&self, query: &str, params: Option<&Params>) -> Result<Vec<Record>> {
        self.run("FETCH_ALL", query, params)
            .await
            .map(RawQueryResult::into_records)
    }

    /// Return every row of `table`.
    ///
    /// The table name is interpolated into the SQL as-is. Only pass trusted
    /// identifiers: an externally supplied name allows SQL injection.
    pub async fn select_all(&self, table: &str) -> Result<Vec<Record>> {
        self.fetch_all(&format!("SELECT * FROM {table};"), None).await
    }

    async fn run(&self, label: &str, query: &str, params: Option<&Params>) -> Result<RawQueryResult> {
        let mut conn =
            ScopedConnection::open(self.driver.as_ref(), &self.registry, &self.target).await?;
        conn.query_named(label, query, params).await
    }
}
