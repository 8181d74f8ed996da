//! Database module for docrepo
//!
//! Provides SurrealDB connection management through the `any` engine
//! (in-memory, embedded SurrealKV or a remote server), schema
//! initialization, and typed repositories over document collections.

pub mod codec;
pub mod error;
pub mod models;
pub mod repository;
pub mod schema;

pub use codec::FieldValue;
pub use error::{DbError, DbResult};
pub use models::{
    Client, ClientStatus, ClientType, ClientUpdate, NewClient, NewNotification, NewTeam, NewUser,
    Notification, NotificationKind, NotificationUpdate, Team, TeamSettings, TeamSettingsUpdate,
    TeamUpdate, User, UserRole, UserStatus, UserUpdate,
};
pub use repository::{
    ClientRepository, Entity, Filter, MissingRecord, NotificationRepository, Operator, OrderBy,
    Page, PageRequest, QueryOptions, Repository, RepositoryOptions, SortDirection,
    TeamRepository, UserRepository,
};

use std::path::{Path, PathBuf};
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::debug;

/// Namespace selected by `Database::init`
pub const DEFAULT_NAMESPACE: &str = "docrepo";

/// Database selected by `Database::init`
pub const DEFAULT_DATABASE: &str = "main";

/// Endpoint scheme for the embedded on-disk store
const SURREALKV_SCHEME: &str = "surrealkv://";

/// Database wrapper providing connection management for SurrealDB
pub struct Database {
    /// The underlying SurrealDB client
    client: Surreal<Any>,
    /// Endpoint the client is connected to
    endpoint: String,
    /// Options handed to every repository created from this database
    options: RepositoryOptions,
}

impl Database {
    /// Connect to a document store.
    ///
    /// `endpoint` is any URL understood by the `any` engine, e.g. `mem://`,
    /// `surrealkv://path/to/data` or `ws://localhost:8000`. For `surrealkv://`
    /// endpoints the data directory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidConfig` if the endpoint is empty.
    /// Returns `DbError::InvalidPath` if a `surrealkv://` endpoint has no path.
    /// Returns `DbError::CreateDirectory` if directory creation fails.
    /// Returns `DbError::Connection` if database connection fails.
    pub async fn connect(endpoint: &str) -> DbResult<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(DbError::InvalidConfig {
                key: "endpoint".to_string(),
                reason: "endpoint cannot be empty".to_string(),
            });
        }

        if let Some(path) = endpoint.strip_prefix(SURREALKV_SCHEME) {
            if path.trim().is_empty() {
                return Err(DbError::InvalidPath {
                    path: PathBuf::from(path),
                    reason: "no data directory given".to_string(),
                });
            }
            Self::prepare_path(Path::new(path))?;
        }

        debug!("Connecting to {}", endpoint);
        let client = any::connect(endpoint)
            .await
            .map_err(|e| DbError::Connection {
                endpoint: endpoint.to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            options: RepositoryOptions::default(),
        })
    }

    /// Sign in as a root user.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Authentication` if the store rejects the credentials.
    pub async fn signin(&self, username: &str, password: &str) -> DbResult<()> {
        debug!("Signing in to {} as {}", self.endpoint, username);
        self.client
            .signin(Root { username, password })
            .await
            .map_err(|e| DbError::Authentication(Box::new(e)))?;
        Ok(())
    }

    /// Initialize the database schema in the default namespace and database.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Schema` if schema initialization fails.
    pub async fn init(&self) -> DbResult<()> {
        self.init_in(DEFAULT_NAMESPACE, DEFAULT_DATABASE).await
    }

    /// Select `namespace` / `database` and initialize the schema there.
    pub async fn init_in(&self, namespace: &str, database: &str) -> DbResult<()> {
        self.client
            .use_ns(namespace)
            .use_db(database)
            .await
            .map_err(|e| DbError::Schema(Box::new(e)))?;

        schema::init_schema(&self.client).await?;

        Ok(())
    }

    /// Define an additional collection with store-maintained timestamps.
    pub async fn define_collection(&self, name: &str) -> DbResult<()> {
        schema::define_collection(&self.client, name).await
    }

    /// Replace the options handed to repositories created from now on.
    pub fn with_options(mut self, options: RepositoryOptions) -> Self {
        self.options = options;
        self
    }

    /// Get a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Any> {
        &self.client
    }

    /// The endpoint this database is connected to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn options(&self) -> RepositoryOptions {
        self.options
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.client).with_options(self.options)
    }

    pub fn teams(&self) -> TeamRepository<'_> {
        TeamRepository::new(&self.client).with_options(self.options)
    }

    pub fn clients(&self) -> ClientRepository<'_> {
        ClientRepository::new(&self.client).with_options(self.options)
    }

    pub fn notifications(&self) -> NotificationRepository<'_> {
        NotificationRepository::new(&self.client).with_options(self.options)
    }

    /// A generic repository over any collection.
    ///
    /// Collections outside the built-in set only get `created_at` /
    /// `updated_at` after `define_collection`.
    pub fn collection<T: Entity>(&self, name: &str) -> Repository<'_, T> {
        Repository::new(&self.client, name).with_options(self.options)
    }

    /// Prepare the database path by validating and creating directories.
    fn prepare_path(path: &Path) -> DbResult<PathBuf> {
        let path = path.to_path_buf();

        if path.exists() && !path.is_dir() {
            return Err(DbError::InvalidPath {
                path,
                reason: "exists and is not a directory".to_string(),
            });
        }

        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(|e| DbError::CreateDirectory {
                path: path.clone(),
                source: e,
            })?;
        }

        Ok(path)
    }
}

// Ensure Database is Send + Sync for async compatibility
static_assertions::assert_impl_all!(Database: Send, Sync);


#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn unique_temp_dir(label: &str) -> PathBuf {
        env::temp_dir().join(format!(
            "docrepo-test-{}-{}-{}",
            label,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn test_default_names() {
        assert_eq!(DEFAULT_NAMESPACE, "docrepo");
        assert_eq!(DEFAULT_DATABASE, "main");
    }

    #[tokio::test]
    async fn test_connect_and_init_in_memory() {
        let db = Database::connect("mem://").await;
        assert!(db.is_ok(), "Failed to connect: {:?}", db.err());
        let db = db.unwrap();
        assert_eq!(db.endpoint(), "mem://");

        let init_result = db.init().await;
        assert!(
            init_result.is_ok(),
            "Failed to init: {:?}",
            init_result.err()
        );
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_endpoint() {
        let err = Database::connect("   ").await.err().unwrap();
        assert!(matches!(err, DbError::InvalidConfig { .. }));

        let err = Database::connect("surrealkv://").await.err().unwrap();
        assert!(matches!(err, DbError::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn test_connect_surrealkv_creates_directory() {
        let temp_dir = unique_temp_dir("kv").join("nested").join("data");
        let endpoint = format!("surrealkv://{}", temp_dir.display());

        let db = Database::connect(&endpoint).await;
        assert!(db.is_ok(), "Failed to connect: {:?}", db.err());
        assert!(temp_dir.exists());

        let db = db.unwrap();
        db.init().await.unwrap();
        let id = db
            .users()
            .create(NewUser::new("Ada", "ada@x.com", UserRole::Developer))
            .await
            .unwrap();
        assert!(db.users().exists(&id).await.unwrap());

        drop(db);
        let _ = std::fs::remove_dir_all(temp_dir.parent().unwrap().parent().unwrap());
    }

    #[tokio::test]
    async fn test_init_in_custom_namespace_is_isolated() {
        let db = Database::connect("mem://").await.unwrap();
        db.init_in("tenant_a", "main").await.unwrap();
        db.users()
            .create(NewUser::new("Ada", "ada@x.com", UserRole::Developer))
            .await
            .unwrap();

        db.init_in("tenant_b", "main").await.unwrap();
        assert_eq!(db.users().count(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_signin_with_root_credentials() {
        let db = Database::connect("mem://").await.unwrap();
        db.client()
            .query("DEFINE USER docrepo_admin ON ROOT PASSWORD 'secret' ROLES OWNER")
            .await
            .unwrap()
            .check()
            .unwrap();

        db.signin("docrepo_admin", "secret").await.unwrap();

        let err = db.signin("docrepo_admin", "wrong").await.unwrap_err();
        assert!(matches!(err, DbError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_options_flow_into_repositories() {
        let options = RepositoryOptions {
            missing_on_update: MissingRecord::Ignore,
            missing_on_delete: MissingRecord::Error,
        };
        let db = test_utils::create_test_db().await.unwrap().with_options(options);
        assert_eq!(db.options(), options);
        assert_eq!(db.users().options(), options);
        assert_eq!(db.notifications().options(), options);

        db.users()
            .update("ghost", UserUpdate::new().with_name("x"))
            .await
            .unwrap();
        let err = db.teams().delete("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_define_collection_through_database() {
        let db = test_utils::create_test_db().await.unwrap();
        db.define_collection("invoices").await.unwrap();
        assert!(db.define_collection("bad name").await.is_err());
    }

    #[test]
    fn test_prepare_path_creates_directories() {
        let temp_dir = unique_temp_dir("prepare").join("sub").join("dir");

        let result = Database::prepare_path(&temp_dir);
        assert!(result.is_ok());
        assert!(temp_dir.exists());

        let _ = std::fs::remove_dir_all(temp_dir.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn test_prepare_path_existing_directory() {
        let temp_dir = env::temp_dir();
        let result = Database::prepare_path(&temp_dir);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), temp_dir);
    }

    #[test]
    fn test_prepare_path_rejects_file() {
        let temp_dir = unique_temp_dir("file");
        std::fs::create_dir_all(&temp_dir).unwrap();
        let file = temp_dir.join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let err = Database::prepare_path(&file).unwrap_err();
        assert!(matches!(err, DbError::InvalidPath { .. }));

        let _ = std::fs::remove_dir_all(&temp_dir);
    }
}
