//! # quickdoc - key-value access to document stores
//!
//! quickdoc puts a small key-value API on top of a document database. Keys are
//! dotted paths: the first segment selects a record, the rest walk into its
//! data, so `"user.address.city"` reads or writes one field of record `user`.
//!
//! ## Key Features
//!
//! - **Dotted keys**: nested reads and writes without hand-walking documents
//! - **Soft TTL**: records can expire; expired records read as absent and are
//!   purged lazily or on demand
//! - **Compound updates**: `push`, `pull`, `add` and `subtract` on nested values
//! - **Child databases**: further collections over the same or a new connection
//! - **Connection state**: every operation is gated on a connection state
//!   machine whose transitions can be subscribed to
//! - **Pluggable backends**: an in-memory backend ships with the crate,
//!   `quickdoc-fjall-adapter` adds persistent storage
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quickdoc::Database;
//!
//! let db = Database::builder().url("memory://app").open().await?;
//!
//! db.set("user.name", "Ada").await?;
//! db.push("user.roles", "admin").await?;
//! db.set_with_ttl("session", "token", 3600).await?;
//!
//! let name = db.get("user.name").await?;
//! let sessions = db.instantiate_child(Some("sessions"), None).await?;
//!
//! db.close().await?;
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - Documents, records and listing options
//! - [`common`] - Values, clocks, event bus and shared constants
//! - [`errors`] - Error types and result definitions
//! - [`key`] - Dotted key resolution
//! - [`expiration`] - TTL stamps and cleanup strategies
//! - [`codec`] - Path access inside record data
//! - [`store`] - Backend and connector abstractions, the in-memory backend
//! - [`database`] - The [Database] facade
//! - [`database_builder`] / [`database_config`] - Opening and configuring databases
//! - [`metadata`] - Descriptive information about an open database

pub mod codec;
pub mod collection;
pub mod common;
pub mod database;
pub mod database_builder;
pub mod database_config;
pub mod errors;
pub mod expiration;
mod hierarchy;
pub mod key;
pub mod metadata;
pub mod store;

pub use collection::{AllOptions, Document, Record, RecordEntry};
pub use common::Value;
pub use database::Database;
pub use database_builder::DatabaseBuilder;
pub use database_config::DatabaseConfig;
pub use errors::{ErrorKind, QuickDocError, QuickDocResult};
pub use expiration::CleanupStrategy;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
