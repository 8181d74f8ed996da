//! Test infrastructure for integration tests
//!
//! Provides isolated database setup/teardown and a small generic entity for
//! exercising custom collections. Each test gets its own database instance
//! to ensure no shared state.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use docrepo::codec;
use docrepo::{Database, Entity, StoreConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Test context containing an isolated database and, for on-disk stores,
/// its temp directory
pub struct TestContext {
    pub db: Database,
    pub temp_dir: Option<PathBuf>,
}

impl TestContext {
    /// Create a new test context backed by an in-memory store.
    pub async fn new() -> Self {
        let db = docrepo::open(&StoreConfig::new().with_endpoint("mem://"))
            .await
            .unwrap();
        Self { db, temp_dir: None }
    }

    /// Create a new test context backed by an embedded SurrealKV store.
    ///
    /// Each call creates a uniquely named temp directory using process ID,
    /// thread ID, and nanosecond timestamp to guarantee isolation.
    pub async fn on_disk(name: &str) -> Self {
        let temp_dir = std::env::temp_dir().join(format!(
            "docrepo-integration-{}-{}-{:?}-{}",
            name,
            std::process::id(),
            std::thread::current().id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        let config =
            StoreConfig::new().with_endpoint(format!("surrealkv://{}", temp_dir.display()));
        let db = docrepo::open(&config).await.unwrap();

        Self {
            db,
            temp_dir: Some(temp_dir),
        }
    }

    /// Create a test context with a custom config; the endpoint should be `mem://`.
    pub async fn with_config(config: StoreConfig) -> Self {
        let db = docrepo::open(&config).await.unwrap();
        Self { db, temp_dir: None }
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        // Auto-cleanup on drop
        if let Some(temp_dir) = &self.temp_dir {
            let _ = std::fs::remove_dir_all(temp_dir);
        }
    }
}

// =============================================================================
// Custom entity
// =============================================================================

/// Collection used for generic-repository tests
pub const CONTACTS: &str = "contacts";

/// A minimal application entity living outside the built-in collections
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Contact {
    #[serde(deserialize_with = "codec::record_key")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(with = "codec::optional_timestamp", default)]
    pub met_at: Option<DateTime<Utc>>,
    #[serde(with = "codec::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "codec::timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    #[serde(
        with = "codec::optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub met_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Entity for Contact {
    type Draft = NewContact;
    type Patch = ContactUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Build a contact draft with no meeting date.
pub fn new_contact(name: &str, email: &str) -> NewContact {
    NewContact {
        name: name.to_string(),
        email: email.to_string(),
        met_at: None,
    }
}
