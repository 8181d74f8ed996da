//! Repository modules for database operations
//!
//! `Repository<T>` is the generic typed CRUD and query layer; the
//! collection-specific repositories wrap it with named queries and domain
//! mutations and deref to it for everything else.

mod base;
mod client;
mod filter;
mod notification;
mod team;
mod user;

pub use base::{Entity, MissingRecord, Repository, RepositoryOptions};
pub use client::ClientRepository;
pub use filter::{Filter, Operator, OrderBy, Page, PageRequest, QueryOptions, SortDirection};
pub use notification::NotificationRepository;
pub use team::TeamRepository;
pub use user::UserRepository;
