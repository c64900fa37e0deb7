//! In-memory implementation of the `MessageStore` port.
//!
//! Keeps records in a `BTreeMap` so scans follow key order, matching the
//! durable adapters. Contents are lost when the store is dropped.

use crate::board::{
    domain::{Message, MessageId},
    ports::{MessageStore, StoreError, StoreLimits, StoreResult},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory message store.
///
/// Clones share the same underlying map.
///
/// # Example
///
/// ```
/// use message_board::board::{adapters::memory::InMemoryMessageStore, ports::MessageStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), message_board::board::ports::StoreError> {
/// let store = InMemoryMessageStore::new();
/// let shared = store.clone();
/// assert_eq!(store.advance_counter().await?, 1);
/// assert_eq!(shared.advance_counter().await?, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageStore {
    state: Arc<RwLock<InMemoryState>>,
    limits: StoreLimits,
}

#[derive(Debug, Default)]
struct InMemoryState {
    messages: BTreeMap<MessageId, Message>,
    counter: u64,
}

impl InMemoryMessageStore {
    /// Creates an empty store with default size limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store enforcing the given size limits.
    #[must_use]
    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            state: Arc::default(),
            limits,
        }
    }
}

fn lock_error(err: &impl std::fmt::Display) -> StoreError {
    StoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn get(&self, id: &MessageId) -> StoreResult<Option<Message>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state.messages.get(id).cloned())
    }

    async fn insert(&self, message: &Message) -> StoreResult<Option<Message>> {
        self.limits.check(message)?;
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        Ok(state.messages.insert(message.id().clone(), message.clone()))
    }

    async fn remove(&self, id: &MessageId) -> StoreResult<Option<Message>> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        Ok(state.messages.remove(id))
    }

    async fn values(&self) -> StoreResult<Vec<Message>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state.messages.values().cloned().collect())
    }

    async fn advance_counter(&self) -> StoreResult<u64> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.counter = state.counter.saturating_add(1);
        Ok(state.counter)
    }
}
