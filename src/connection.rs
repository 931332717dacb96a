use tracing::debug;

use crate::binding::{bind_named, render};
use crate::error::Result;
use crate::registry::{DatabaseVersion, Registry};
use crate::traits::{DatabaseDriver, DriverConnection};
use crate::types::{Params, RawQueryResult, SqlValue};

/// Where a connection descriptor comes from.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum ConnectionTarget {
    /// Resolve through the registry's default version, then its default descriptor.
    #[default]
    Registry,
    /// Resolve the descriptor registered for this version.
    Version(DatabaseVersion),
    /// Use this descriptor and skip the registry.
    Descriptor(String),
}

impl ConnectionTarget {
    pub(crate) fn resolve(&self, registry: &Registry) -> Result<String> {
        match self {
            Self::Registry => registry.get_descriptor(None),
            Self::Version(version) => registry.get_descriptor(Some(version)),
            Self::Descriptor(descriptor) => Ok(descriptor.clone()),
        }
    }
}

/// A connection that lives for one unit of work.
///
/// The underlying driver connection is released when the guard is dropped,
/// whether the work succeeded, failed, or was cancelled.
pub struct ScopedConnection {
    conn: Box<dyn DriverConnection>,
}

impl ScopedConnection {
    /// Resolve the descriptor for `target` and open a connection with it.
    pub(crate) async fn open(
        driver: &dyn DatabaseDriver,
        registry: &Registry,
        target: &ConnectionTarget,
    ) -> Result<Self> {
        let descriptor = target.resolve(registry)?;
        let conn = driver.connect(&descriptor).await?;
        Ok(Self { conn })
    }

    /// Execute a statement with positional (`$n`) parameters.
    pub async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult> {
        self.conn.query(sql, params).await
    }

    /// Execute a statement with `:name` parameters.
    /// Without params the statement is sent exactly as written.
    pub async fn query_named(
        &mut self,
        label: &str,
        sql: &str,
        params: Option<&Params>,
    ) -> Result<RawQueryResult> {
        let (bound_sql, values) = match params {
            Some(params) => bind_named(sql, params)?,
            None => (sql.to_string(), Vec::new()),
        };

        debug!("{} - attempting query:\n{}", label, render(sql, params));
        self.conn.query(&bound_sql, &values).await
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        self.conn.close();
        debug!("Released scoped connection");
    }
}
