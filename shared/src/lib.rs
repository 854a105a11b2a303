//! Shared infrastructure for Billix backend services

pub mod database;
pub mod observability;
pub mod types;

pub use database::{DatabaseConfig, DatabaseError, DatabaseResult};
pub use types::{CursorPage, UserId};
