//! Data models for the built-in collections
//!
//! Each entity comes in three shapes: the stored record (with `id` and
//! store-maintained timestamps), a draft used on create, and a patch used
//! for partial updates. Patch fields left as `None` are not sent to the
//! store and therefore keep their stored value.

use crate::codec::{self, FieldValue};
use crate::repository::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collection holding `User` records
pub const USERS: &str = "users";
/// Collection holding `Team` records
pub const TEAMS: &str = "teams";
/// Collection holding `Client` records
pub const CLIENTS: &str = "clients";
/// Collection holding `Notification` records
pub const NOTIFICATIONS: &str = "notifications";

/// Every collection defined by `schema::init_schema`
pub const BUILT_IN_COLLECTIONS: [&str; 4] = [USERS, TEAMS, CLIENTS, NOTIFICATIONS];

macro_rules! text_field_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Text(value.as_str().to_string())
                }
            }
        )*
    };
}

/// Role a user holds within their company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Developer,
    Designer,
    Client,
    Viewer,
}

impl UserRole {
    /// Returns the string representation used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Developer => "developer",
            UserRole::Designer => "designer",
            UserRole::Client => "client",
            UserRole::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account state of a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

impl UserStatus {
    /// Returns the string representation used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Pending => "pending",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a client is currently engaged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

impl ClientStatus {
    /// Returns the string representation used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Legal shape of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Individual,
    Company,
}

impl ClientType {
    /// Returns the string representation used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Individual => "individual",
            ClientType::Company => "company",
        }
    }
}

impl std::fmt::Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    /// Returns the string representation used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

text_field_value!(UserRole, UserStatus, ClientStatus, ClientType, NotificationKind);

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A stored user
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "codec::record_key")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(with = "codec::optional_timestamp", default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub team_ids: Vec<String>,
    #[serde(with = "codec::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "codec::timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    pub team_ids: Vec<String>,
}

impl NewUser {
    /// An active user with no company or teams
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role,
            status: UserStatus::Active,
            department: None,
            phone: None,
            company_id: None,
            team_ids: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(company_id.into());
        self
    }

    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_ids.push(team_id.into());
        self
    }
}

/// Partial update for a user
///
/// `None` leaves a field unchanged. Nullable fields are doubly optional:
/// `Some(None)` removes the stored value (see the `clear_*` builders).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(
        with = "codec::optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Option<String>>,
}

impl UserUpdate {
    /// Create a new empty update
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(Some(department.into()));
        self
    }

    pub fn clear_department(mut self) -> Self {
        self.department = Some(None);
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(Some(phone.into()));
        self
    }

    pub fn clear_phone(mut self) -> Self {
        self.phone = Some(None);
        self
    }

    pub fn with_last_login(mut self, at: DateTime<Utc>) -> Self {
        self.last_login = Some(at);
        self
    }

    pub fn with_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(Some(company_id.into()));
        self
    }

    pub fn clear_company(mut self) -> Self {
        self.company_id = Some(None);
        self
    }
}

impl Entity for User {
    type Draft = NewUser;
    type Patch = UserUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// Team-level preferences, stored as a nested object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSettings {
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub can_members_invite: bool,
    #[serde(default = "default_member_role")]
    pub default_role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
}

fn default_member_role() -> UserRole {
    UserRole::Developer
}

impl Default for TeamSettings {
    fn default() -> Self {
        Self {
            is_private: false,
            can_members_invite: false,
            default_role: default_member_role(),
            workflow_id: None,
        }
    }
}

/// Partial change to `TeamSettings`, merged client-side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamSettingsUpdate {
    pub is_private: Option<bool>,
    pub can_members_invite: Option<bool>,
    pub default_role: Option<UserRole>,
    pub workflow_id: Option<String>,
}

impl TeamSettingsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_private(mut self, is_private: bool) -> Self {
        self.is_private = Some(is_private);
        self
    }

    pub fn with_members_invite(mut self, allowed: bool) -> Self {
        self.can_members_invite = Some(allowed);
        self
    }

    pub fn with_default_role(mut self, role: UserRole) -> Self {
        self.default_role = Some(role);
        self
    }

    pub fn with_workflow(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    /// Overlay the supplied values onto `settings`
    pub fn apply_to(self, settings: &mut TeamSettings) {
        if let Some(is_private) = self.is_private {
            settings.is_private = is_private;
        }
        if let Some(allowed) = self.can_members_invite {
            settings.can_members_invite = allowed;
        }
        if let Some(role) = self.default_role {
            settings.default_role = role;
        }
        if let Some(workflow_id) = self.workflow_id {
            settings.workflow_id = Some(workflow_id);
        }
    }
}

/// A stored team
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Team {
    #[serde(deserialize_with = "codec::record_key")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub leader_id: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub project_ids: Vec<String>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub settings: TeamSettings,
    #[serde(with = "codec::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "codec::timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader_id: Option<String>,
    pub member_ids: Vec<String>,
    pub project_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    pub settings: TeamSettings,
}

impl NewTeam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            leader_id: None,
            member_ids: Vec::new(),
            project_ids: Vec::new(),
            company_id: None,
            settings: TeamSettings::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the leader; the leader is also recorded as a member
    pub fn with_leader(mut self, leader_id: impl Into<String>) -> Self {
        let leader_id = leader_id.into();
        if !self.member_ids.contains(&leader_id) {
            self.member_ids.push(leader_id.clone());
        }
        self.leader_id = Some(leader_id);
        self
    }

    pub fn with_member(mut self, member_id: impl Into<String>) -> Self {
        let member_id = member_id.into();
        if !self.member_ids.contains(&member_id) {
            self.member_ids.push(member_id);
        }
        self
    }

    pub fn with_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(company_id.into());
        self
    }

    pub fn with_settings(mut self, settings: TeamSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Partial update for a team
///
/// `None` leaves a field unchanged. Nullable fields are doubly optional:
/// `Some(None)` removes the stored value (see the `clear_*` builders).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<TeamSettings>,
}

impl TeamUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    pub fn clear_description(mut self) -> Self {
        self.description = Some(None);
        self
    }

    pub fn with_leader(mut self, leader_id: impl Into<String>) -> Self {
        self.leader_id = Some(Some(leader_id.into()));
        self
    }

    pub fn clear_leader(mut self) -> Self {
        self.leader_id = Some(None);
        self
    }

    pub fn with_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(Some(company_id.into()));
        self
    }

    pub fn clear_company(mut self) -> Self {
        self.company_id = Some(None);
        self
    }

    pub fn with_settings(mut self, settings: TeamSettings) -> Self {
        self.settings = Some(settings);
        self
    }
}

impl Entity for Team {
    type Draft = NewTeam;
    type Patch = TeamUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

/// A stored client
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Client {
    #[serde(deserialize_with = "codec::record_key")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub status: ClientStatus,
    pub kind: ClientType,
    #[serde(default)]
    pub project_ids: Vec<String>,
    #[serde(with = "codec::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "codec::timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewClient {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub status: ClientStatus,
    pub kind: ClientType,
    pub project_ids: Vec<String>,
}

impl NewClient {
    /// An active client with no projects
    pub fn new(name: impl Into<String>, kind: ClientType) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
            company: None,
            status: ClientStatus::Active,
            kind,
            project_ids: Vec::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_status(mut self, status: ClientStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial update for a client
///
/// `None` leaves a field unchanged. Nullable fields are doubly optional:
/// `Some(None)` removes the stored value (see the `clear_*` builders).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ClientStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ClientType>,
}

impl ClientUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(Some(email.into()));
        self
    }

    pub fn clear_email(mut self) -> Self {
        self.email = Some(None);
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(Some(phone.into()));
        self
    }

    pub fn clear_phone(mut self) -> Self {
        self.phone = Some(None);
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(Some(company.into()));
        self
    }

    pub fn clear_company(mut self) -> Self {
        self.company = Some(None);
        self
    }

    pub fn with_status(mut self, status: ClientStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_kind(mut self, kind: ClientType) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl Entity for Client {
    type Draft = NewClient;
    type Patch = ClientUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A stored notification addressed to one user
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "codec::record_key")]
    pub id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub user_id: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(with = "codec::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "codec::timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub user_id: String,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl NewNotification {
    /// An unread notification for `user_id`
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            user_id: user_id.into(),
            is_read: false,
            action_url: None,
        }
    }

    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }
}

/// Partial update for a notification
///
/// `None` leaves a field unchanged. Nullable fields are doubly optional:
/// `Some(None)` removes the stored value (see the `clear_*` builders).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<NotificationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<Option<String>>,
}

impl NotificationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read(mut self, is_read: bool) -> Self {
        self.is_read = Some(is_read);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(Some(url.into()));
        self
    }

    pub fn clear_action_url(mut self) -> Self {
        self.action_url = Some(None);
        self
    }
}

impl Entity for Notification {
    type Draft = NewNotification;
    type Patch = NotificationUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}
