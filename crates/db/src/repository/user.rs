//! User repository
//!
//! Named lookups over the `users` collection plus team membership and
//! login bookkeeping.

use crate::error::DbResult;
use crate::models::{USERS, User, UserRole, UserStatus, UserUpdate};
use crate::repository::base::{Repository, RepositoryOptions};
use crate::repository::filter::{Filter, QueryOptions};
use chrono::Utc;
use std::ops::Deref;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tracing::debug;

/// Repository for `User` records
pub struct UserRepository<'a> {
    repo: Repository<'a, User>,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database client
    pub fn new(client: &'a Surreal<Any>) -> Self {
        Self {
            repo: Repository::new(client, USERS),
        }
    }

    /// Replace the repository options
    pub fn with_options(self, options: RepositoryOptions) -> Self {
        Self {
            repo: self.repo.with_options(options),
        }
    }

    /// Find the user registered under `email`.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        debug!("Looking up user by email");
        self.repo.find_one(&[Filter::eq("email", email)]).await
    }

    /// Users holding `role`, ordered by name.
    pub async fn get_by_role(&self, role: UserRole) -> DbResult<Vec<User>> {
        self.repo
            .find_where(&[Filter::eq("role", role)], &by_name())
            .await
    }

    /// Users belonging to `company_id`, ordered by name.
    pub async fn get_by_company(&self, company_id: &str) -> DbResult<Vec<User>> {
        self.repo
            .find_where(&[Filter::eq("company_id", company_id)], &by_name())
            .await
    }

    /// Users whose `team_ids` include `team_id`.
    pub async fn get_by_team(&self, team_id: &str) -> DbResult<Vec<User>> {
        self.repo
            .find_where(&[Filter::array_contains("team_ids", team_id)], &by_name())
            .await
    }

    /// Users with status `active`.
    pub async fn get_active_users(&self) -> DbResult<Vec<User>> {
        self.repo
            .find_where(&[Filter::eq("status", UserStatus::Active)], &by_name())
            .await
    }

    /// Stamp `last_login` with the current time.
    pub async fn update_last_login(&self, id: &str) -> DbResult<()> {
        self.repo
            .update(id, UserUpdate::new().with_last_login(Utc::now()))
            .await
    }

    /// Record membership of `team_id` on the user.
    pub async fn add_to_team(&self, user_id: &str, team_id: &str) -> DbResult<()> {
        self.repo.add_to_set(user_id, "team_ids", team_id).await
    }

    pub async fn remove_from_team(&self, user_id: &str, team_id: &str) -> DbResult<()> {
        self.repo.remove_from_set(user_id, "team_ids", team_id).await
    }

    /// Case-insensitive substring match on name and email.
    ///
    /// The store has no text search, so candidates (the company's users, or
    /// every user when `company_id` is `None`) are fetched and matched
    /// locally. Cost grows with the candidate set.
    pub async fn search(&self, term: &str, company_id: Option<&str>) -> DbResult<Vec<User>> {
        let candidates = match company_id {
            Some(company_id) => self.get_by_company(company_id).await?,
            None => self.repo.find_where(&[], &by_name()).await?,
        };

        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(candidates);
        }

        Ok(candidates
            .into_iter()
            .filter(|user| {
                user.name.to_lowercase().contains(&needle)
                    || user.email.to_lowercase().contains(&needle)
            })
            .collect())
    }
}

impl<'a> Deref for UserRepository<'a> {
    type Target = Repository<'a, User>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

fn by_name() -> QueryOptions {
    QueryOptions::new().ascending("name")
}
