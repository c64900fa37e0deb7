//! Port contracts for message board persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by board services.

pub mod store;

#[cfg(test)]
pub use store::MockMessageStore;
pub use store::{MessageStore, StoreError, StoreLimits, StoreResult};
