//! # djangoseo-db
//!
//! Database layer for djangoseo-rs. Defines the backend-agnostic [`Value`] and
//! [`Row`] types, the async [`DatabaseBackend`] trait the redirect store is
//! written against, and (behind the `sqlite` feature) a `rusqlite`-based
//! backend.

pub mod base;
pub mod row;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod value;

pub use base::{DatabaseBackend, DatabaseConfig};
pub use row::{FromValue, Row};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
pub use value::Value;
