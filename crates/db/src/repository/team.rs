//! Team repository
//!
//! Membership and project lists are changed with single-statement set
//! operations, so concurrent additions to the same team never silently
//! lose each other; a colliding write fails with a retryable conflict
//! error instead. Settings are merged client-side (read, overlay, write) and are
//! last-write-wins under concurrency.

use crate::error::{DbError, DbResult};
use crate::models::{TEAMS, Team, TeamSettings, TeamSettingsUpdate, TeamUpdate};
use crate::repository::base::{Repository, RepositoryOptions};
use crate::repository::filter::{Filter, QueryOptions};
use std::ops::Deref;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tracing::debug;

/// Repository for `Team` records
pub struct TeamRepository<'a> {
    repo: Repository<'a, Team>,
}

impl<'a> TeamRepository<'a> {
    /// Create a new TeamRepository with the given database client
    pub fn new(client: &'a Surreal<Any>) -> Self {
        Self {
            repo: Repository::new(client, TEAMS),
        }
    }

    /// Replace the repository options
    pub fn with_options(self, options: RepositoryOptions) -> Self {
        Self {
            repo: self.repo.with_options(options),
        }
    }

    pub async fn get_by_company(&self, company_id: &str) -> DbResult<Vec<Team>> {
        self.repo
            .find_where(&[Filter::eq("company_id", company_id)], &by_name())
            .await
    }

    pub async fn get_by_leader(&self, leader_id: &str) -> DbResult<Vec<Team>> {
        self.repo
            .find_where(&[Filter::eq("leader_id", leader_id)], &by_name())
            .await
    }

    /// Teams whose `member_ids` include `user_id`.
    pub async fn get_by_member(&self, user_id: &str) -> DbResult<Vec<Team>> {
        self.repo
            .find_where(&[Filter::array_contains("member_ids", user_id)], &by_name())
            .await
    }

    pub async fn add_member(&self, team_id: &str, user_id: &str) -> DbResult<()> {
        debug!("Adding member {} to team {}", user_id, team_id);
        self.repo.add_to_set(team_id, "member_ids", user_id).await
    }

    pub async fn remove_member(&self, team_id: &str, user_id: &str) -> DbResult<()> {
        debug!("Removing member {} from team {}", user_id, team_id);
        self.repo.remove_from_set(team_id, "member_ids", user_id).await
    }

    pub async fn add_project(&self, team_id: &str, project_id: &str) -> DbResult<()> {
        self.repo.add_to_set(team_id, "project_ids", project_id).await
    }

    pub async fn remove_project(&self, team_id: &str, project_id: &str) -> DbResult<()> {
        self.repo
            .remove_from_set(team_id, "project_ids", project_id)
            .await
    }

    /// Make `user_id` the team leader and ensure they are a member.
    ///
    /// Two statements; the leader is set first so a missing team fails
    /// before membership is touched.
    pub async fn assign_leader(&self, team_id: &str, user_id: &str) -> DbResult<()> {
        debug!("Assigning {} as leader of team {}", user_id, team_id);
        self.repo
            .update(team_id, TeamUpdate::new().with_leader(user_id))
            .await?;
        self.repo.add_to_set(team_id, "member_ids", user_id).await
    }

    /// Overlay `changes` onto the stored settings and return the result.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the team does not exist; nothing is written.
    pub async fn update_settings(
        &self,
        team_id: &str,
        changes: TeamSettingsUpdate,
    ) -> DbResult<TeamSettings> {
        let team = self
            .repo
            .find_by_id(team_id)
            .await?
            .ok_or_else(|| DbError::not_found(TEAMS, team_id))?;

        let mut settings = team.settings;
        changes.apply_to(&mut settings);

        self.repo
            .update(team_id, TeamUpdate::new().with_settings(settings.clone()))
            .await?;
        Ok(settings)
    }
}

impl<'a> Deref for TeamRepository<'a> {
    type Target = Repository<'a, Team>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

fn by_name() -> QueryOptions {
    QueryOptions::new().ascending("name")
}
