//! Adapter implementations for message board ports.

pub mod configured;
pub mod file;
pub mod memory;
pub mod postgres;

pub use configured::ConfiguredMessageStore;
pub use file::FileMessageStore;
pub use memory::InMemoryMessageStore;
pub use postgres::{BoardPgPool, PostgresMessageStore};
