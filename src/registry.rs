//! Connection descriptor registry.
//!
//! Holds connection descriptors keyed by an optional database version, plus the
//! version that is used when a caller does not name one. Keys follow the same
//! names as the environment variables that can seed the registry:
//!
//! - `PGPATTERNS_DB_VER`: the default database version
//! - `PGPATTERNS_CONN_STR`: the default connection descriptor
//! - `PGPATTERNS_CONN_STR_{version}`: the descriptor for one version

use std::collections::HashMap;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::descriptor::redact;
use crate::error::{PgPatternsError, Result};

/// Key holding the default database version.
pub const DB_VERSION_KEY: &str = "PGPATTERNS_DB_VER";

/// Key holding the default connection descriptor.
pub const CONN_STR_KEY: &str = "PGPATTERNS_CONN_STR";

/// Prefix shared by every registry key.
pub const KEY_PREFIX: &str = "PGPATTERNS_";

/// Key holding the connection descriptor for a specific version.
pub fn version_key(version: &DatabaseVersion) -> String {
    format!("{CONN_STR_KEY}_{version}")
}

/// Names a database environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatabaseVersion {
    Local,
    Dev,
    Prod,
    Custom(String),
}

impl DatabaseVersion {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local => "LOCAL",
            Self::Dev => "DEV",
            Self::Prod => "PROD",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for DatabaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for DatabaseVersion {
    fn from(value: &str) -> Self {
        match value {
            "LOCAL" => Self::Local,
            "DEV" => Self::Dev,
            "PROD" => Self::Prod,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for DatabaseVersion {
    fn from(value: String) -> Self {
        match value.as_str() {
            "LOCAL" | "DEV" | "PROD" => Self::from(value.as_str()),
            _ => Self::Custom(value),
        }
    }
}

/// In-process store of connection descriptors.
///
/// Shared between callers behind an `Arc`. Reads may run concurrently; writes
/// to the same key are last-write-wins and nothing ties a version write to a
/// descriptor write.
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, String>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with every `PGPATTERNS_*` variable of the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars().filter(|(key, _)| key.starts_with(KEY_PREFIX)))
    }

    /// Create a registry seeded with the given key/value pairs.
    /// Later pairs overwrite earlier ones with the same key.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Set the version used when a lookup does not name one.
    pub fn set_default_version(&self, version: impl Into<DatabaseVersion>) {
        let version = version.into();
        debug!("Registry configured: {}={}", DB_VERSION_KEY, version);
        self.write().insert(DB_VERSION_KEY.to_string(), version.to_string());
    }

    /// The version used when a lookup does not name one, if set.
    pub fn default_version(&self) -> Option<DatabaseVersion> {
        self.read()
            .get(DB_VERSION_KEY)
            .map(|version| DatabaseVersion::from(version.as_str()))
    }

    /// Register a descriptor for a version, or as the default descriptor when no version is given.
    /// Any previous value under the same key is replaced.
    pub fn set_descriptor(&self, descriptor: impl Into<String>, version: Option<DatabaseVersion>) {
        let key = match version {
            Some(version) => version_key(&version),
            None => CONN_STR_KEY.to_string(),
        };
        let descriptor = descriptor.into();
        debug!("Registry configured: {}={}", key, redact(&descriptor));
        self.write().insert(key, descriptor);
    }

    /// Resolve the descriptor to connect with.
    ///
    /// Without an explicit version the default version is used; without either,
    /// the default descriptor. A missing key is reported as `MissingConfiguration`.
    pub fn get_descriptor(&self, version: Option<&DatabaseVersion>) -> Result<String> {
        let entries = self.read();

        let stored_version = match version {
            Some(_) => None,
            None => entries
                .get(DB_VERSION_KEY)
                .map(|version| DatabaseVersion::from(version.as_str())),
        };

        let key = match version.or(stored_version.as_ref()) {
            Some(version) => version_key(version),
            None => CONN_STR_KEY.to_string(),
        };

        entries
            .get(&key)
            .cloned()
            .ok_or(PgPatternsError::MissingConfiguration { key })
    }

    // A poisoned lock still holds a consistent map: every write is a single insert.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
