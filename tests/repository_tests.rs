//! End-to-end integration tests for docrepo
//!
//! Every test opens its own database through `docrepo::open`.
//!
//! - `generic` - CRUD and queries on a custom collection
//! - `timestamps` - temporal fields stored natively, read back as dates
//! - `domain` - specialized repositories working together
//! - `config` - options resolved from `StoreConfig`

mod common;

use common::*;
use docrepo::{
    DbError, Filter, MissingRecord, NewTeam, NewUser, PageRequest, QueryOptions, Repository,
    StoreConfig, UserRole, UserUpdate,
};

// =============================================================================
// GENERIC REPOSITORY
// =============================================================================

mod generic {
    use super::*;

    #[tokio::test]
    async fn test_create_find_update_delete_round_trip() {
        let ctx = TestContext::new().await;
        ctx.db.define_collection(CONTACTS).await.unwrap();
        let contacts: Repository<Contact> = ctx.db.collection(CONTACTS);

        let id = contacts
            .create(new_contact("Ada", "ada@x.com"))
            .await
            .unwrap();

        let ada = contacts.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(ada.id, id);
        assert_eq!(ada.name, "Ada");
        assert_eq!(ada.email, "ada@x.com");

        contacts
            .update(
                &id,
                ContactUpdate {
                    name: Some("Ada L.".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let renamed = contacts.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(renamed.name, "Ada L.");
        assert_eq!(renamed.email, "ada@x.com");
        assert_eq!(renamed.created_at, ada.created_at);
        assert!(renamed.updated_at >= ada.updated_at);

        contacts.delete(&id).await.unwrap();
        assert!(contacts.find_by_id(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_where_unique_field_among_many() {
        let ctx = TestContext::new().await;
        ctx.db.define_collection(CONTACTS).await.unwrap();
        let contacts: Repository<Contact> = ctx.db.collection(CONTACTS);

        for i in 0..50 {
            contacts
                .create(new_contact(&format!("c{}", i), &format!("c{}@x.com", i)))
                .await
                .unwrap();
        }

        let found = contacts
            .find_where(&[Filter::eq("email", "c42@x.com")], &QueryOptions::new())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "c42");
        assert_eq!(contacts.find_all().await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_store() {
        let ctx = TestContext::new().await;
        let contacts: Repository<Contact> = ctx.db.collection(CONTACTS);

        let err = contacts
            .find_where(&[Filter::eq("email; DELETE contacts", "x")], &QueryOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));

        let err = contacts
            .find_where(&[], &QueryOptions::new().limit(0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));

        let err = contacts
            .find_where(&[Filter::is_in("name", Vec::<String>::new())], &QueryOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_embedded_store_round_trip() {
        let ctx = TestContext::on_disk("kv").await;
        let users = ctx.db.users();

        let id = users
            .create(NewUser::new("Ada", "ada@x.com", UserRole::Developer))
            .await
            .unwrap();
        assert!(ctx.temp_dir.as_ref().unwrap().exists());
        assert_eq!(users.find_by_id(&id).await.unwrap().unwrap().name, "Ada");
    }
}

// =============================================================================
// TIMESTAMPS
// =============================================================================

mod timestamps {
    use super::*;
    use chrono::{Duration, Utc};

    #[derive(Debug, serde::Deserialize)]
    struct TypeCheck {
        met_at: bool,
        created_at: bool,
    }

    #[tokio::test]
    async fn test_dates_are_stored_as_datetimes() {
        let ctx = TestContext::new().await;
        ctx.db.define_collection(CONTACTS).await.unwrap();
        let contacts: Repository<Contact> = ctx.db.collection(CONTACTS);

        let met_at = Utc::now() - Duration::days(7);
        let id = contacts
            .create(NewContact {
                met_at: Some(met_at),
                ..new_contact("Ada", "ada@x.com")
            })
            .await
            .unwrap();

        let mut response = ctx
            .db
            .client()
            .query(
                "SELECT type::is::datetime(met_at) AS met_at, \
                 type::is::datetime(created_at) AS created_at \
                 FROM type::thing($tb, $id)",
            )
            .bind(("tb", CONTACTS))
            .bind(("id", id.clone()))
            .await
            .unwrap();
        let check: Option<TypeCheck> = response.take(0).unwrap();
        let check = check.unwrap();
        assert!(check.met_at);
        assert!(check.created_at);

        let ada = contacts.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(ada.met_at, Some(met_at));
    }

    #[tokio::test]
    async fn test_filter_by_date_range() {
        let ctx = TestContext::new().await;
        ctx.db.define_collection(CONTACTS).await.unwrap();
        let contacts: Repository<Contact> = ctx.db.collection(CONTACTS);

        let now = Utc::now();
        for (name, days_ago) in [("old", 90), ("recent", 3), ("today", 0)] {
            contacts
                .create(NewContact {
                    met_at: Some(now - Duration::days(days_ago)),
                    ..new_contact(name, &format!("{}@x.com", name))
                })
                .await
                .unwrap();
        }

        let window = contacts
            .find_where(
                &[
                    Filter::ge("met_at", now - Duration::days(30)),
                    Filter::lt("met_at", now - Duration::days(1)),
                ],
                &QueryOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].name, "recent");
    }
}

// =============================================================================
// DOMAIN REPOSITORIES
// =============================================================================

mod domain {
    use super::*;

    #[tokio::test]
    async fn test_user_joins_team_on_both_sides() {
        let ctx = TestContext::new().await;
        let users = ctx.db.users();
        let teams = ctx.db.teams();

        let ada = users
            .create(NewUser::new("Ada", "ada@x.com", UserRole::Developer).with_company("acme"))
            .await
            .unwrap();
        let core = teams
            .create(NewTeam::new("Core").with_company("acme"))
            .await
            .unwrap();

        teams.add_member(&core, &ada).await.unwrap();
        users.add_to_team(&ada, &core).await.unwrap();

        let member_of = teams.get_by_member(&ada).await.unwrap();
        assert_eq!(member_of.len(), 1);
        assert_eq!(member_of[0].id, core);

        let in_team = users.get_by_team(&core).await.unwrap();
        assert_eq!(in_team.len(), 1);
        assert_eq!(in_team[0].id, ada);
    }

    #[tokio::test]
    async fn test_concurrent_member_additions_never_lost() {
        let ctx = TestContext::new().await;
        let teams = ctx.db.teams();

        let core = teams.create(NewTeam::new("Core")).await.unwrap();
        let (first, second) = tokio::join!(
            teams.add_member(&core, "user-1"),
            teams.add_member(&core, "user-2")
        );

        let team = teams.find_by_id(&core).await.unwrap().unwrap();
        let mut expected = Vec::new();
        for (result, member) in [(first, "user-1"), (second, "user-2")] {
            match result {
                Ok(()) => expected.push(member.to_string()),
                Err(err) => assert!(err.is_conflict(), "unexpected error: {:?}", err),
            }
        }
        assert!(!expected.is_empty());

        let mut members = team.member_ids.clone();
        members.sort();
        assert_eq!(members, expected);
    }

    #[tokio::test]
    async fn test_paging_through_users() {
        let ctx = TestContext::new().await;
        let users = ctx.db.users();

        for i in 0..25 {
            users
                .create(NewUser::new(
                    format!("user{:02}", i),
                    format!("user{:02}@x.com", i),
                    UserRole::Viewer,
                ))
                .await
                .unwrap();
        }

        let options = QueryOptions::new().ascending("name");
        let page = users
            .find_page(&[], &options, PageRequest::new(3, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_more);
        let names: Vec<&str> = page.items.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["user20", "user21", "user22", "user23", "user24"]);
    }

    #[tokio::test]
    async fn test_notifications_for_team() {
        let ctx = TestContext::new().await;
        let notes = ctx.db.notifications();

        let members = vec!["u1".to_string(), "u2".to_string()];
        notes
            .create_for_users(
                &members,
                "Sprint started",
                "Sprint 12 is live",
                docrepo::NotificationKind::Info,
            )
            .await
            .unwrap();

        assert_eq!(notes.unread_count_for_user("u1").await.unwrap(), 1);
        assert_eq!(notes.mark_all_as_read_for_user("u1").await.unwrap(), 1);
        assert_eq!(notes.unread_count_for_user("u1").await.unwrap(), 0);
        assert_eq!(notes.unread_count_for_user("u2").await.unwrap(), 1);
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

mod config {
    use super::*;

    #[tokio::test]
    async fn test_default_policies() {
        let ctx = TestContext::with_config(
            StoreConfig::new()
                .with_endpoint("mem://")
                .with_missing_on_update(MissingRecord::Error)
                .with_missing_on_delete(MissingRecord::Ignore),
        )
        .await;
        let users = ctx.db.users();

        let err = users
            .update("ghost", UserUpdate::new().with_name("Nobody"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        users.delete("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn test_configured_policies_reach_repositories() {
        let ctx = TestContext::with_config(
            StoreConfig::new()
                .with_endpoint("mem://")
                .with_namespace("tenant")
                .with_database("crm")
                .with_missing_on_update(MissingRecord::Ignore)
                .with_missing_on_delete(MissingRecord::Error),
        )
        .await;

        ctx.db
            .users()
            .update("ghost", UserUpdate::new().with_name("Nobody"))
            .await
            .unwrap();
        let err = ctx.db.clients().delete("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_open_with_bad_credentials_fails() {
        let config = StoreConfig::new()
            .with_endpoint("mem://")
            .with_credentials("nobody", "wrong");
        let err = docrepo::open(&config).await.err().unwrap();
        assert!(matches!(err, DbError::Authentication(_)));
    }
}
