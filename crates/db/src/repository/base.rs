//! Generic repository over one document collection
//!
//! Provides a typed CRUD and query API for any `Entity`, encapsulating the
//! SurrealQL needed to talk to the store. Every method is a single remote
//! round-trip; nothing is cached, buffered or retried.

use crate::codec::{self, FieldValue};
use crate::error::{DbError, DbResult};
use crate::repository::filter::{
    Filter, Page, PageRequest, QueryOptions, build_conditions, build_tail, page_options,
    render_field, validate_field,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tracing::{debug, trace};

/// A record type stored in a collection.
///
/// Implementors deserialize straight from a stored document, including the
/// store-assigned `id` (use `codec::record_key`) and any temporal fields
/// (use `codec::timestamp` / `codec::optional_timestamp`). Writes go through
/// the associated `Draft` (every field except `id`) and `Patch` (the subset
/// of fields to change) types.
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    /// Fields supplied on create
    type Draft: Serialize + Send + Sync + 'static;
    /// Partial field set supplied on update; `None` fields must be skipped
    type Patch: Serialize + Send + Sync + 'static;

    /// The store-assigned identifier
    fn id(&self) -> &str;
}

/// What to do when `update` or `delete` targets a record that does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingRecord {
    /// Fail with `DbError::NotFound`
    Error,
    /// Treat the call as a successful no-op
    Ignore,
}

impl MissingRecord {
    /// Returns the configuration spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingRecord::Error => "error",
            MissingRecord::Ignore => "ignore",
        }
    }
}

impl fmt::Display for MissingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MissingRecord {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(MissingRecord::Error),
            "ignore" => Ok(MissingRecord::Ignore),
            other => Err(format!("expected 'error' or 'ignore', got '{}'", other)),
        }
    }
}

/// Per-repository behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryOptions {
    /// Policy for `update` on a missing record
    pub missing_on_update: MissingRecord,
    /// Policy for `delete` on a missing record
    pub missing_on_delete: MissingRecord,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            missing_on_update: MissingRecord::Error,
            missing_on_delete: MissingRecord::Ignore,
        }
    }
}

/// Minimal row carrying only the record key
#[derive(Debug, serde::Deserialize)]
struct IdOnly {
    #[serde(deserialize_with = "codec::record_key")]
    id: String,
}

/// Row for aggregate counts
#[derive(Debug, serde::Deserialize)]
struct CountRow {
    total: usize,
}

/// Typed repository bound to a single collection
pub struct Repository<'a, T> {
    client: &'a Surreal<Any>,
    collection: String,
    options: RepositoryOptions,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Entity> Repository<'a, T> {
    /// Create a repository for `collection` with default options
    pub fn new(client: &'a Surreal<Any>, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
            options: RepositoryOptions::default(),
            _marker: PhantomData,
        }
    }

    /// Replace the repository options
    pub fn with_options(mut self, options: RepositoryOptions) -> Self {
        self.options = options;
        self
    }

    /// The collection this repository is bound to
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The options in effect
    pub fn options(&self) -> RepositoryOptions {
        self.options
    }

    /// Create a record and return its store-generated id.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ValidationError` if the draft serializes an `id`.
    /// Returns `DbError::Query` if the store rejects the write.
    pub async fn create(&self, draft: T::Draft) -> DbResult<String> {
        debug!("Creating record in {}", self.collection);
        codec::ensure_no_identity(&draft)?;

        let mut response = self
            .client
            .query("CREATE type::table($tb) CONTENT $data RETURN id")
            .bind(("tb", self.collection.clone()))
            .bind(("data", draft))
            .await?;
        let created: Option<IdOnly> = response.take(0)?;

        match created {
            Some(row) => {
                debug!("Created {}:{}", self.collection, row.id);
                Ok(row.id)
            }
            None => Err(DbError::EmptyResponse {
                collection: self.collection.clone(),
                operation: "create",
            }),
        }
    }

    /// Get a record by id.
    ///
    /// # Returns
    ///
    /// `Some(T)` if found, `None` otherwise. A missing record is not an error.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<T>> {
        debug!("Fetching {}:{}", self.collection, id);
        validate_id(id)?;

        let record: Option<T> = self
            .client
            .select((self.collection.as_str(), id))
            .await
            .map_err(|e| {
                debug!("Failed to fetch {}:{}: {}", self.collection, id, e);
                DbError::Query(Box::new(e))
            })?;

        if record.is_none() {
            debug!("Record not found: {}:{}", self.collection, id);
        }
        Ok(record)
    }

    /// Check whether a record exists.
    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        validate_id(id)?;
        let row: Option<IdOnly> = self
            .client
            .select((self.collection.as_str(), id))
            .await
            .map_err(|e| DbError::Query(Box::new(e)))?;
        Ok(row.is_some())
    }

    /// Merge the patch into an existing record.
    ///
    /// Only the fields the patch serializes are written; everything else
    /// keeps its stored value. A missing record is handled according to
    /// `RepositoryOptions::missing_on_update`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the record is missing and the policy is `Error`.
    /// Returns `DbError::Query` if the store rejects the write.
    pub async fn update(&self, id: &str, patch: T::Patch) -> DbResult<()> {
        debug!("Updating {}:{}", self.collection, id);
        validate_id(id)?;
        codec::ensure_no_identity(&patch)?;

        let mut response = self
            .client
            .query("UPDATE type::thing($tb, $id) MERGE $patch RETURN id")
            .bind(("tb", self.collection.clone()))
            .bind(("id", id.to_string()))
            .bind(("patch", patch))
            .await?;
        let updated: Option<IdOnly> = response.take(0)?;

        if updated.is_none() {
            return self.missing(id, self.options.missing_on_update);
        }
        debug!("Updated {}:{}", self.collection, id);
        Ok(())
    }

    /// Hard-delete a record.
    ///
    /// A missing record is handled according to
    /// `RepositoryOptions::missing_on_delete` (ignored by default).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!("Deleting {}:{}", self.collection, id);
        validate_id(id)?;

        let mut response = self
            .client
            .query("DELETE type::thing($tb, $id) RETURN BEFORE")
            .bind(("tb", self.collection.clone()))
            .bind(("id", id.to_string()))
            .await?;
        let deleted: Option<IdOnly> = response.take(0)?;

        if deleted.is_none() {
            return self.missing(id, self.options.missing_on_delete);
        }
        debug!("Deleted {}:{}", self.collection, id);
        Ok(())
    }

    /// Fetch every record in the collection.
    ///
    /// There is no pagination: the whole collection is transferred and held
    /// in memory. Prefer `find_page` or `find_where` with a limit for
    /// collections that can grow.
    pub async fn find_all(&self) -> DbResult<Vec<T>> {
        debug!("Fetching all records from {}", self.collection);
        let mut response = self
            .client
            .query("SELECT * FROM type::table($tb)")
            .bind(("tb", self.collection.clone()))
            .await?;
        let records: Vec<T> = response.take(0)?;
        trace!("Fetched {} records from {}", records.len(), self.collection);
        Ok(records)
    }

    /// Fetch records matching every filter, sorted and limited by `options`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ValidationError` for malformed filters or options.
    /// Returns `DbError::Query` if the store rejects the query.
    pub async fn find_where(&self, filters: &[Filter], options: &QueryOptions) -> DbResult<Vec<T>> {
        let conditions = build_conditions(filters)?;
        let tail = build_tail(options)?;
        let query = format!("SELECT * FROM type::table($tb){}{}", conditions.clause, tail);
        debug!("Querying {} with {} filters", self.collection, filters.len());
        trace!("Query: {}", query);

        let mut request = self
            .client
            .query(query)
            .bind(("tb", self.collection.clone()));
        if !conditions.params.is_empty() {
            request = request.bind(conditions.params);
        }
        let mut response = request.await?;
        let records: Vec<T> = response.take(0)?;
        trace!("Matched {} records in {}", records.len(), self.collection);
        Ok(records)
    }

    /// Fetch the first record matching the filters, if any.
    pub async fn find_one(&self, filters: &[Filter]) -> DbResult<Option<T>> {
        let mut records = self
            .find_where(filters, &QueryOptions::new().limit(1))
            .await?;
        Ok(records.pop())
    }

    /// Count records matching every filter.
    pub async fn count(&self, filters: &[Filter]) -> DbResult<usize> {
        let conditions = build_conditions(filters)?;
        let query = format!(
            "SELECT count() AS total FROM type::table($tb){} GROUP ALL",
            conditions.clause
        );
        trace!("Query: {}", query);

        let mut request = self
            .client
            .query(query)
            .bind(("tb", self.collection.clone()));
        if !conditions.params.is_empty() {
            request = request.bind(conditions.params);
        }
        let mut response = request.await?;
        let row: Option<CountRow> = response.take(0)?;
        Ok(row.map_or(0, |r| r.total))
    }

    /// Fetch one page of the filtered set along with its totals.
    ///
    /// Issues two queries (count, then page); records written between them
    /// can make the totals disagree with the items.
    pub async fn find_page(
        &self,
        filters: &[Filter],
        options: &QueryOptions,
        page: PageRequest,
    ) -> DbResult<Page<T>> {
        let page_opts = page_options(options, page)?;
        let total = self.count(filters).await?;
        let items = self.find_where(filters, &page_opts).await?;
        Ok(Page::new(items, page, total))
    }

    /// Delete every record matching the filters and return how many went.
    ///
    /// An empty filter list is rejected rather than clearing the collection.
    pub async fn delete_where(&self, filters: &[Filter]) -> DbResult<usize> {
        if filters.is_empty() {
            return Err(DbError::validation(
                "delete_where needs at least one filter",
            ));
        }
        let conditions = build_conditions(filters)?;
        let query = format!("DELETE type::table($tb){} RETURN BEFORE", conditions.clause);
        debug!("Deleting from {} with {} filters", self.collection, filters.len());
        trace!("Query: {}", query);

        let mut response = self
            .client
            .query(query)
            .bind(("tb", self.collection.clone()))
            .bind(conditions.params)
            .await?;
        let deleted: Vec<IdOnly> = response.take(0)?;
        debug!("Deleted {} records from {}", deleted.len(), self.collection);
        Ok(deleted.len())
    }

    /// Merge the patch into every record matching the filters and return
    /// how many were changed.
    ///
    /// An empty filter list is rejected rather than touching the whole
    /// collection.
    pub async fn update_where(&self, filters: &[Filter], patch: T::Patch) -> DbResult<usize> {
        if filters.is_empty() {
            return Err(DbError::validation(
                "update_where needs at least one filter",
            ));
        }
        codec::ensure_no_identity(&patch)?;
        let conditions = build_conditions(filters)?;
        let query = format!(
            "UPDATE type::table($tb) MERGE $patch{} RETURN id",
            conditions.clause
        );
        debug!("Updating {} with {} filters", self.collection, filters.len());
        trace!("Query: {}", query);

        let mut response = self
            .client
            .query(query)
            .bind(("tb", self.collection.clone()))
            .bind(("patch", patch))
            .bind(conditions.params)
            .await?;
        let updated: Vec<IdOnly> = response.take(0)?;
        debug!("Updated {} records in {}", updated.len(), self.collection);
        Ok(updated.len())
    }

    /// Add `value` to the array `field` unless already present.
    ///
    /// Runs as one store statement, so concurrent calls on the same record
    /// never silently drop each other's value. When two writes collide the
    /// store aborts one of them; that call fails and is not retried here.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the record does not exist.
    /// Returns `DbError::Query` with [`DbError::is_conflict`] set if a
    /// concurrent write won; the caller may retry.
    pub async fn add_to_set(
        &self,
        id: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> DbResult<()> {
        self.apply_set_op(id, field, "array::union", value.into())
            .await
    }

    /// Remove every occurrence of `value` from the array `field`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the record does not exist.
    pub async fn remove_from_set(
        &self,
        id: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> DbResult<()> {
        self.apply_set_op(id, field, "array::complement", value.into())
            .await
    }

    async fn apply_set_op(
        &self,
        id: &str,
        field: &str,
        function: &str,
        value: FieldValue,
    ) -> DbResult<()> {
        validate_id(id)?;
        validate_field(field)?;
        if field == "id" {
            return Err(DbError::validation("The 'id' field cannot be modified"));
        }

        let target = render_field(field);
        let query = format!(
            "UPDATE type::thing($tb, $id) SET {target} = {function}({target} ?? [], [$value]) RETURN id"
        );
        debug!("Applying {} to {}:{}.{}", function, self.collection, id, field);
        trace!("Query: {}", query);

        let mut response = self
            .client
            .query(query)
            .bind(("tb", self.collection.clone()))
            .bind(("id", id.to_string()))
            .bind(("value", value))
            .await?;
        let updated: Option<IdOnly> = response.take(0)?;

        match updated {
            Some(_) => Ok(()),
            None => Err(DbError::not_found(&self.collection, id)),
        }
    }

    fn missing(&self, id: &str, policy: MissingRecord) -> DbResult<()> {
        match policy {
            MissingRecord::Error => Err(DbError::not_found(&self.collection, id)),
            MissingRecord::Ignore => {
                debug!("Ignoring missing record {}:{}", self.collection, id);
                Ok(())
            }
        }
    }
}

fn validate_id(id: &str) -> DbResult<()> {
    if id.trim().is_empty() {
        return Err(DbError::validation("Record id cannot be empty"));
    }
    Ok(())
}
