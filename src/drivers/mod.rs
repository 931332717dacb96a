mod pg_types;
mod tokio_postgres;

pub use self::in_memory_test::{
    InMemoryDriverError, InMemoryTestDriver, InMemoryTestResponseBuilder, RecordedQuery,
};
pub use self::tokio_postgres::{TokioPostgresConnection, TokioPostgresDriver};
