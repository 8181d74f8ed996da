//! docrepo: typed repositories over a document store
//!
//! ```rust,ignore
//! let db = docrepo::open(&StoreConfig::new().with_endpoint("mem://")).await?;
//! let id = db.users().create(NewUser::new("Ada", "ada@x.com", UserRole::Developer)).await?;
//! let ada = db.users().find_by_id(&id).await?;
//! ```

pub mod config;
pub mod logging;

pub use config::{Credentials, ResolvedConfig, StoreConfig};
pub use docrepo_db::*;

use tracing::debug;

/// Connect, authenticate and initialize a database from `config`.
///
/// Signs in only when credentials resolve. Repositories created from the
/// returned database use the resolved missing-record policies.
///
/// # Errors
///
/// Returns `DbError::InvalidConfig` for unusable settings, and the
/// connection, authentication or schema error of whichever step fails.
pub async fn open(config: &StoreConfig) -> DbResult<Database> {
    let resolved = config.resolve()?;
    debug!(
        "Opening {} ({}/{})",
        resolved.endpoint, resolved.namespace, resolved.database
    );

    let db = Database::connect(&resolved.endpoint).await?;
    if let Some(credentials) = &resolved.credentials {
        db.signin(&credentials.username, &credentials.password)
            .await?;
    }
    db.init_in(&resolved.namespace, &resolved.database).await?;

    Ok(db.with_options(resolved.options))
}
