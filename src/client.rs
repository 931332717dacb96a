use std::sync::Arc;

use crate::connection::{ConnectionTarget, ScopedConnection};
use crate::drivers::TokioPostgresDriver;
use crate::error::Result;
use crate::querier::Querier;
use crate::registry::{DatabaseVersion, Registry};
use crate::traits::DatabaseDriver;

/// Main entry point for pgpatterns.
/// Knows how to reach the database but holds no connection between calls.
#[derive(Clone)]
pub struct PgPatternsClient {
    driver: Arc<dyn DatabaseDriver>,
    registry: Arc<Registry>,
    target: ConnectionTarget,
}

impl PgPatternsClient {
    /// Create a client that connects with tokio-postgres, resolving descriptors from `registry`.
    ///
    /// # Example
    /// ```ignore
    /// let registry = Arc::new(Registry::from_env());
    /// let client = PgPatternsClient::new(registry);
    /// let rows = client.querier().select_all("users").await?;
    /// ```
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_driver(Arc::new(TokioPostgresDriver::new()), registry)
    }

    /// Create a new client with a custom driver.
    /// Useful for testing or using alternative database drivers.
    pub fn with_driver(driver: Arc<dyn DatabaseDriver>, registry: Arc<Registry>) -> Self {
        Self {
            driver,
            registry,
            target: ConnectionTarget::default(),
        }
    }

    /// Connect with this descriptor instead of resolving one from the registry.
    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.target = ConnectionTarget::Descriptor(descriptor.into());
        self
    }

    /// Connect with the descriptor registered for `version`, ignoring the default version.
    pub fn with_version(mut self, version: impl Into<DatabaseVersion>) -> Self {
        self.target = ConnectionTarget::Version(version.into());
        self
    }

    /// The registry descriptors are resolved from.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The descriptor the next connection would use.
    pub fn descriptor(&self) -> Result<String> {
        self.target.resolve(&self.registry)
    }

    /// Open a connection that is released when the returned guard is dropped.
    pub async fn connect_scoped(&self) -> Result<ScopedConnection> {
        ScopedConnection::open(self.driver.as_ref(), &self.registry, &self.target).await
    }

    /// Create a Querier for executing statements.
    pub fn querier(&self) -> Querier {
        Querier::new(
            Arc::clone(&self.driver),
            Arc::clone(&self.registry),
            self.target.clone(),
        )
    }
}
