//! pgpatterns - Resolve PostgreSQL connection descriptors by environment and
//! run one-shot parameterized statements that return dynamic records.
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use pgpatterns::{DatabaseVersion, Descriptor, Params, PgPatternsClient, Registry};
//!
//! // Register where each environment lives
//! let registry = Arc::new(Registry::new());
//! registry.set_descriptor(
//!     Descriptor::new("postgres", "postgres", "localhost", "app").build(),
//!     Some(DatabaseVersion::Local),
//! );
//! registry.set_default_version(DatabaseVersion::Local);
//!
//! // Every call opens and releases its own connection
//! let querier = PgPatternsClient::new(registry).querier();
//! let record = querier
//!     .fetch_one(
//!         "SELECT * FROM users WHERE id = :id",
//!         Some(&Params::new().bind("id", 1)),
//!     )
//!     .await?;
//!
//! let name = record.and_then(|r| r.get("name").cloned());
//! ```

pub mod descriptor;
pub mod drivers;
pub mod error;
pub mod logging;
pub mod querier;
pub mod registry;
pub mod traits;
pub mod types;

mod binding;
mod client;
mod connection;

// Re-export main types for convenient access
pub use client::PgPatternsClient;
pub use connection::ScopedConnection;
pub use descriptor::{build_descriptor, Descriptor, DEFAULT_ADAPTER, DEFAULT_PORT};
pub use error::{PgPatternsError, Result};
pub use querier::Querier;
pub use registry::{DatabaseVersion, Registry};
pub use traits::{DatabaseDriver, DriverConnection};
pub use types::{Params, RawQueryResult, Record, SqlValue};
