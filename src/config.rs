//! Store configuration
//!
//! Each setting is resolved with the same precedence:
//! 1. Value set explicitly on `StoreConfig`
//! 2. Environment variable (if set and non-empty)
//! 3. Built-in default

use docrepo_db::{
    DEFAULT_DATABASE, DEFAULT_NAMESPACE, DbError, DbResult, MissingRecord, RepositoryOptions,
};
use std::path::PathBuf;

/// Environment variable for the store endpoint
pub const ENDPOINT_ENV: &str = "DOCREPO_ENDPOINT";
/// Environment variable for the namespace
pub const NAMESPACE_ENV: &str = "DOCREPO_NAMESPACE";
/// Environment variable for the database
pub const DATABASE_ENV: &str = "DOCREPO_DATABASE";
/// Environment variable for the root username
pub const USERNAME_ENV: &str = "DOCREPO_USERNAME";
/// Environment variable for the root password
pub const PASSWORD_ENV: &str = "DOCREPO_PASSWORD";
/// Environment variable for the missing-record policy of updates
pub const MISSING_UPDATE_ENV: &str = "DOCREPO_ON_MISSING_UPDATE";
/// Environment variable for the missing-record policy of deletes
pub const MISSING_DELETE_ENV: &str = "DOCREPO_ON_MISSING_DELETE";

/// Data directory used when the platform has no local data dir
const FALLBACK_DATA_PATH: &str = ".docrepo/data";

/// Connection settings; unset fields fall back to the environment, then defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub endpoint: Option<String>,
    pub namespace: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub missing_on_update: Option<MissingRecord>,
    pub missing_on_delete: Option<MissingRecord>,
}

/// Root credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Fully resolved settings, ready to open a database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<Credentials>,
    pub options: RepositoryOptions,
}

impl StoreConfig {
    /// An empty configuration: everything comes from the environment or defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_missing_on_update(mut self, policy: MissingRecord) -> Self {
        self.missing_on_update = Some(policy);
        self
    }

    pub fn with_missing_on_delete(mut self, policy: MissingRecord) -> Self {
        self.missing_on_delete = Some(policy);
        self
    }

    /// Resolve every setting.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidConfig` if only one of username and password
    /// is available, or if a missing-record policy is neither `error` nor
    /// `ignore`.
    pub fn resolve(&self) -> DbResult<ResolvedConfig> {
        let endpoint = pick(&self.endpoint, ENDPOINT_ENV).unwrap_or_else(default_endpoint);
        let namespace =
            pick(&self.namespace, NAMESPACE_ENV).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let database =
            pick(&self.database, DATABASE_ENV).unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let credentials = match (
            pick(&self.username, USERNAME_ENV),
            pick(&self.password, PASSWORD_ENV),
        ) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            (Some(_), None) => return Err(incomplete_credentials(PASSWORD_ENV)),
            (None, Some(_)) => return Err(incomplete_credentials(USERNAME_ENV)),
        };

        let defaults = RepositoryOptions::default();
        let options = RepositoryOptions {
            missing_on_update: policy(
                self.missing_on_update,
                MISSING_UPDATE_ENV,
                defaults.missing_on_update,
            )?,
            missing_on_delete: policy(
                self.missing_on_delete,
                MISSING_DELETE_ENV,
                defaults.missing_on_delete,
            )?,
        };

        Ok(ResolvedConfig {
            endpoint,
            namespace,
            database,
            credentials,
            options,
        })
    }
}

/// Default endpoint: an embedded SurrealKV store under the user's local data dir.
///
/// Falls back to `.docrepo/data` relative to the current directory.
pub fn default_endpoint() -> String {
    let path = dirs::data_local_dir()
        .map(|dir| dir.join("docrepo").join("data"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_PATH));
    format!("surrealkv://{}", path.display())
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn pick(explicit: &Option<String>, key: &str) -> Option<String> {
    explicit.clone().or_else(|| env_value(key))
}

fn policy(
    explicit: Option<MissingRecord>,
    key: &str,
    default: MissingRecord,
) -> DbResult<MissingRecord> {
    if let Some(policy) = explicit {
        return Ok(policy);
    }
    match env_value(key) {
        Some(raw) => raw.parse().map_err(|reason| DbError::InvalidConfig {
            key: key.to_string(),
            reason,
        }),
        None => Ok(default),
    }
}

fn incomplete_credentials(missing: &str) -> DbError {
    DbError::InvalidConfig {
        key: missing.to_string(),
        reason: "username and password must be set together".to_string(),
    }
}
