//! Database schema initialization for docrepo
//!
//! Collections are schemaless: entities own their field sets. The schema
//! only pins the store-maintained timestamps and the unique index on user
//! email addresses.

use crate::error::{DbError, DbResult};
use crate::models::{BUILT_IN_COLLECTIONS, USERS};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tracing::debug;

/// SQL statements for schema initialization
mod sql {
    /// Table and timestamp fields; `{c}` is replaced by the collection name.
    ///
    /// `created_at` is set once on create and is read-only afterwards,
    /// `updated_at` is rewritten on every write.
    pub const DEFINE_COLLECTION: &str = r#"
        DEFINE TABLE IF NOT EXISTS {c} SCHEMALESS;

        DEFINE FIELD IF NOT EXISTS created_at ON {c} TYPE datetime
            DEFAULT time::now() READONLY;

        DEFINE FIELD IF NOT EXISTS updated_at ON {c} TYPE datetime
            VALUE time::now();
    "#;

    /// Email addresses identify users
    pub const DEFINE_USER_EMAIL_INDEX: &str = r#"
        DEFINE INDEX IF NOT EXISTS users_email_unique ON users FIELDS email UNIQUE;
    "#;
}

/// Initialize the database schema.
///
/// Defines every built-in collection and the user email index.
///
/// This function is idempotent - it can be called multiple times safely
/// as it uses `IF NOT EXISTS` clauses.
///
/// # Errors
///
/// Returns `DbError::Schema` if any schema definition fails.
pub async fn init_schema(client: &Surreal<Any>) -> DbResult<()> {
    for collection in BUILT_IN_COLLECTIONS {
        define_collection(client, collection).await?;
    }

    debug!("Defining unique email index on {}", USERS);
    client
        .query(sql::DEFINE_USER_EMAIL_INDEX)
        .await
        .and_then(|response| response.check())
        .map_err(|e| DbError::Schema(Box::new(e)))?;

    Ok(())
}

/// Define a collection with store-maintained `created_at` / `updated_at`.
///
/// Use for collections outside the built-in set so records created in
/// them get the same timestamps. Idempotent.
///
/// # Errors
///
/// Returns `DbError::ValidationError` if `name` is not a plain identifier.
/// Returns `DbError::Schema` if the definition fails.
pub async fn define_collection(client: &Surreal<Any>, name: &str) -> DbResult<()> {
    validate_collection_name(name)?;
    debug!("Defining collection {}", name);

    client
        .query(sql::DEFINE_COLLECTION.replace("{c}", name))
        .await
        .and_then(|response| response.check())
        .map_err(|e| DbError::Schema(Box::new(e)))?;

    Ok(())
}

/// Collection names are spliced into DEFINE statements, which take no
/// parameters, so only plain identifiers are accepted.
fn validate_collection_name(name: &str) -> DbResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DbError::validation(format!(
            "Invalid collection name '{}': use letters, digits and underscores",
            name
        )))
    }
}
