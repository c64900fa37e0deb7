//! `PostgreSQL` adapters for message board persistence.

mod models;
mod repository;
mod schema;

pub use repository::{BoardPgPool, PostgresMessageStore};
