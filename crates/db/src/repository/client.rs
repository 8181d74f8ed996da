//! Client repository

use crate::error::DbResult;
use crate::models::{CLIENTS, Client, ClientStatus, ClientType, ClientUpdate};
use crate::repository::base::{Repository, RepositoryOptions};
use crate::repository::filter::{Filter, QueryOptions};
use std::ops::Deref;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

/// Repository for `Client` records
pub struct ClientRepository<'a> {
    repo: Repository<'a, Client>,
}

impl<'a> ClientRepository<'a> {
    /// Create a new ClientRepository with the given database client
    pub fn new(client: &'a Surreal<Any>) -> Self {
        Self {
            repo: Repository::new(client, CLIENTS),
        }
    }

    /// Replace the repository options
    pub fn with_options(self, options: RepositoryOptions) -> Self {
        Self {
            repo: self.repo.with_options(options),
        }
    }

    pub async fn get_active(&self) -> DbResult<Vec<Client>> {
        self.get_by_status(ClientStatus::Active).await
    }

    pub async fn get_inactive(&self) -> DbResult<Vec<Client>> {
        self.get_by_status(ClientStatus::Inactive).await
    }

    pub async fn get_by_type(&self, kind: ClientType) -> DbResult<Vec<Client>> {
        self.repo
            .find_where(&[Filter::eq("kind", kind)], &by_name())
            .await
    }

    pub async fn activate(&self, id: &str) -> DbResult<()> {
        self.set_status(id, ClientStatus::Active).await
    }

    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        self.set_status(id, ClientStatus::Inactive).await
    }

    pub async fn add_project(&self, client_id: &str, project_id: &str) -> DbResult<()> {
        self.repo
            .add_to_set(client_id, "project_ids", project_id)
            .await
    }

    pub async fn remove_project(&self, client_id: &str, project_id: &str) -> DbResult<()> {
        self.repo
            .remove_from_set(client_id, "project_ids", project_id)
            .await
    }

    /// Case-insensitive substring match on name, email and company.
    ///
    /// Matching happens after fetching the whole collection.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Client>> {
        let needle = term.trim().to_lowercase();
        let clients = self.repo.find_where(&[], &by_name()).await?;
        if needle.is_empty() {
            return Ok(clients);
        }

        let matches = |value: &Option<String>| {
            value
                .as_deref()
                .is_some_and(|v| v.to_lowercase().contains(&needle))
        };
        Ok(clients
            .into_iter()
            .filter(|client| {
                client.name.to_lowercase().contains(&needle)
                    || matches(&client.email)
                    || matches(&client.company)
            })
            .collect())
    }

    async fn get_by_status(&self, status: ClientStatus) -> DbResult<Vec<Client>> {
        self.repo
            .find_where(&[Filter::eq("status", status)], &by_name())
            .await
    }

    async fn set_status(&self, id: &str, status: ClientStatus) -> DbResult<()> {
        self.repo
            .update(id, ClientUpdate::new().with_status(status))
            .await
    }
}

impl<'a> Deref for ClientRepository<'a> {
    type Target = Repository<'a, Client>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

fn by_name() -> QueryOptions {
    QueryOptions::new().ascending("name")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewClient;
    use crate::test_utils::create_test_db;

    #[tokio::test]
    async fn test_kind_is_stored_and_queried() {
        let db = create_test_db().await.unwrap();
        let clients = db.clients();

        clients
            .create(NewClient::new("Acme", ClientType::Company).with_email("ops@acme.io"))
            .await
            .unwrap();
        clients
            .create(NewClient::new("Jane Roe", ClientType::Individual))
            .await
            .unwrap();

        let companies = clients.get_by_type(ClientType::Company).await.unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].name, "Acme");
        assert_eq!(companies[0].kind, ClientType::Company);
        assert_eq!(companies[0].email.as_deref(), Some("ops@acme.io"));
    }

    #[tokio::test]
    async fn test_activate_and_deactivate() {
        let db = create_test_db().await.unwrap();
        let clients = db.clients();

        let acme = clients
            .create(NewClient::new("Acme", ClientType::Company))
            .await
            .unwrap();
        clients
            .create(NewClient::new("Globex", ClientType::Company).with_status(ClientStatus::Inactive))
            .await
            .unwrap();

        assert_eq!(clients.get_active().await.unwrap().len(), 1);
        assert_eq!(clients.get_inactive().await.unwrap().len(), 1);

        clients.deactivate(&acme).await.unwrap();
        assert!(clients.get_active().await.unwrap().is_empty());
        let inactive: Vec<String> = clients
            .get_inactive()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(inactive, vec!["Acme", "Globex"]);

        clients.activate(&acme).await.unwrap();
        let active = clients.get_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, acme);

        assert!(clients.activate("ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_projects() {
        let db = create_test_db().await.unwrap();
        let clients = db.clients();

        let id = clients
            .create(NewClient::new("Acme", ClientType::Company))
            .await
            .unwrap();
        clients.add_project(&id, "p1").await.unwrap();
        clients.add_project(&id, "p2").await.unwrap();
        clients.remove_project(&id, "p1").await.unwrap();

        let client = clients.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(client.project_ids, vec!["p2".to_string()]);
    }

    #[tokio::test]
    async fn test_search() {
        let db = create_test_db().await.unwrap();
        let clients = db.clients();

        clients
            .create(NewClient::new("Acme", ClientType::Company))
            .await
            .unwrap();
        clients
            .create(
                NewClient::new("Jane Roe", ClientType::Individual)
                    .with_company("Acme Holdings")
                    .with_email("jane@roe.dev"),
            )
            .await
            .unwrap();
        clients
            .create(NewClient::new("Initech", ClientType::Company))
            .await
            .unwrap();

        let names = |found: Vec<Client>| found.into_iter().map(|c| c.name).collect::<Vec<_>>();
        assert_eq!(names(clients.search("acme").await.unwrap()), vec!["Acme", "Jane Roe"]);
        assert_eq!(names(clients.search("ROE.DEV").await.unwrap()), vec!["Jane Roe"]);
        assert!(clients.search("umbrella").await.unwrap().is_empty());
        assert_eq!(clients.search("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_clears_contact_fields() {
        let db = create_test_db().await.unwrap();
        let clients = db.clients();

        let acme = clients
            .create(
                NewClient::new("Acme", ClientType::Company)
                    .with_email("ops@acme.io")
                    .with_phone("555-0100"),
            )
            .await
            .unwrap();

        clients
            .update(&acme, ClientUpdate::new().clear_phone())
            .await
            .unwrap();

        let found = clients.find_by_id(&acme).await.unwrap().unwrap();
        assert_eq!(found.phone, None);
        assert_eq!(found.email.as_deref(), Some("ops@acme.io"));
    }
}
