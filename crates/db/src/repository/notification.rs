//! Notification repository
//!
//! Per-user inboxes over the `notifications` collection. Listings are
//! newest first.

use crate::error::{DbError, DbResult};
use crate::models::{
    NOTIFICATIONS, NewNotification, Notification, NotificationKind, NotificationUpdate,
};
use crate::repository::base::{Repository, RepositoryOptions};
use crate::repository::filter::{Filter, QueryOptions};
use chrono::{DateTime, Duration, Utc};
use std::ops::Deref;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tracing::debug;

/// Repository for `Notification` records
pub struct NotificationRepository<'a> {
    repo: Repository<'a, Notification>,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new NotificationRepository with the given database client
    pub fn new(client: &'a Surreal<Any>) -> Self {
        Self {
            repo: Repository::new(client, NOTIFICATIONS),
        }
    }

    /// Replace the repository options
    pub fn with_options(self, options: RepositoryOptions) -> Self {
        Self {
            repo: self.repo.with_options(options),
        }
    }

    pub async fn get_by_user(&self, user_id: &str) -> DbResult<Vec<Notification>> {
        self.repo
            .find_where(&[Filter::eq("user_id", user_id)], &newest_first())
            .await
    }

    pub async fn get_unread_by_user(&self, user_id: &str) -> DbResult<Vec<Notification>> {
        self.repo
            .find_where(
                &[Filter::eq("user_id", user_id), Filter::eq("is_read", false)],
                &newest_first(),
            )
            .await
    }

    pub async fn get_by_kind(&self, kind: NotificationKind) -> DbResult<Vec<Notification>> {
        self.repo
            .find_where(&[Filter::eq("kind", kind)], &newest_first())
            .await
    }

    pub async fn mark_as_read(&self, id: &str) -> DbResult<()> {
        self.repo
            .update(id, NotificationUpdate::new().with_read(true))
            .await
    }

    /// Mark each id as read, one update per id, stopping at the first error.
    pub async fn mark_many_as_read(&self, ids: &[String]) -> DbResult<()> {
        debug!("Marking {} notifications as read", ids.len());
        for id in ids {
            self.mark_as_read(id).await?;
        }
        Ok(())
    }

    /// Mark every unread notification of `user_id` as read; returns how many changed.
    pub async fn mark_all_as_read_for_user(&self, user_id: &str) -> DbResult<usize> {
        self.repo
            .update_where(
                &[Filter::eq("user_id", user_id), Filter::eq("is_read", false)],
                NotificationUpdate::new().with_read(true),
            )
            .await
    }

    pub async fn unread_count_for_user(&self, user_id: &str) -> DbResult<usize> {
        self.repo
            .count(&[Filter::eq("user_id", user_id), Filter::eq("is_read", false)])
            .await
    }

    /// Create an unread notification for one user and return its id.
    pub async fn create_for_user(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> DbResult<String> {
        self.repo
            .create(NewNotification::new(user_id, title, message, kind))
            .await
    }

    /// Create the same notification for each user, in order.
    ///
    /// Not atomic: on error, notifications created for earlier users remain.
    pub async fn create_for_users(
        &self,
        user_ids: &[String],
        title: &str,
        message: &str,
        kind: NotificationKind,
    ) -> DbResult<Vec<String>> {
        debug!("Fanning out notification to {} users", user_ids.len());
        let mut ids = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            ids.push(self.create_for_user(user_id, title, message, kind).await?);
        }
        Ok(ids)
    }

    /// Delete notifications created before `cutoff`; returns how many went.
    pub async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> DbResult<usize> {
        self.repo
            .delete_where(&[Filter::lt("created_at", cutoff)])
            .await
    }

    /// Delete notifications older than `days` days.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ValidationError` if the cutoff falls outside the
    /// representable date range.
    pub async fn delete_older_than(&self, days: u32) -> DbResult<usize> {
        let cutoff = Duration::try_days(i64::from(days))
            .and_then(|age| Utc::now().checked_sub_signed(age))
            .ok_or_else(|| {
                DbError::validation(format!("Notification age of {} days is out of range", days))
            })?;
        self.delete_created_before(cutoff).await
    }
}

impl<'a> Deref for NotificationRepository<'a> {
    type Target = Repository<'a, Notification>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

fn newest_first() -> QueryOptions {
    QueryOptions::new().descending("created_at")
}
