use std::path::PathBuf;
use thiserror::Error;

/// Database error types for docrepo
#[derive(Error, Debug)]
pub enum DbError {
    /// Error establishing connection to the document store
    #[error("Failed to connect to document store at {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: Box<surrealdb::Error>,
    },

    /// The store rejected the supplied credentials
    #[error("Failed to authenticate against the document store: {0}")]
    Authentication(#[source] Box<surrealdb::Error>),

    /// Error during schema initialization
    #[error("Failed to initialize database schema: {0}")]
    Schema(#[source] Box<surrealdb::Error>),

    /// Error executing a query (transport or permission failure)
    #[error("Query execution failed")]
    Query(#[source] Box<surrealdb::Error>),

    /// Error with a local store path (invalid or inaccessible)
    #[error("Invalid database path: {path} - {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Error creating the directory for an embedded store
    #[error("Failed to create database directory at {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record required by the operation does not exist
    #[error("Record '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },

    /// Error for invalid input, raised before any store call
    #[error("{message}")]
    ValidationError { message: String },

    /// The store acknowledged a write but returned no record
    #[error("Store returned no record for {operation} on '{collection}'")]
    EmptyResponse {
        collection: String,
        operation: &'static str,
    },

    /// Error for an unusable configuration value
    #[error("Invalid configuration for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },
}

impl From<surrealdb::Error> for DbError {
    fn from(err: surrealdb::Error) -> Self {
        DbError::Query(Box::new(err))
    }
}

impl DbError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        DbError::ValidationError {
            message: message.into(),
        }
    }

    /// Shorthand for a missing record.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Whether this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }

    /// Whether the store aborted this write because a concurrent
    /// transaction touched the same record. The write can be retried.
    pub fn is_conflict(&self) -> bool {
        match self {
            DbError::Query(err) => err.to_string().contains("read or write conflict"),
            _ => false,
        }
    }

    /// Get the full error message including nested SurrealDB error details.
    ///
    /// This is useful for displaying detailed error information to users.
    pub fn full_message(&self) -> String {
        match self {
            DbError::Query(err) => format!("Query execution failed: {}", err),
            other => other.to_string(),
        }
    }
}

/// Result type alias for database operations
pub type DbResult<T> = Result<T, DbError>;
