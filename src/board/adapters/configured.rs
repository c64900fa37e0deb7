//! Store selection from configuration.
//!
//! A configured database URL wins over a data directory; with neither the
//! board runs on the in-memory store.

use super::{FileMessageStore, InMemoryMessageStore, PostgresMessageStore};
use crate::board::{
    domain::{Message, MessageId},
    ports::{MessageStore, StoreResult},
};
use crate::config::BoardConfig;
use async_trait::async_trait;
use tracing::info;

/// Message store chosen at startup from [`BoardConfig`].
#[derive(Debug, Clone)]
pub enum ConfiguredMessageStore {
    /// Volatile store used when nothing durable is configured.
    Memory(InMemoryMessageStore),
    /// Snapshot-file store in the configured data directory.
    File(FileMessageStore),
    /// `PostgreSQL` store at the configured URL.
    Postgres(PostgresMessageStore),
}

impl ConfiguredMessageStore {
    /// Opens the store described by `config`, applying its limits.
    ///
    /// # Errors
    ///
    /// Returns the opening adapter's error: a pool that cannot connect, or a
    /// data directory that cannot be created or whose snapshot is invalid.
    pub fn open(config: &BoardConfig) -> StoreResult<Self> {
        let limits = config.limits();
        let store = if let Some(url) = config.database_url() {
            Self::Postgres(PostgresMessageStore::connect(url, limits)?)
        } else if let Some(dir) = config.data_dir() {
            Self::File(FileMessageStore::open(dir, limits)?)
        } else {
            Self::Memory(InMemoryMessageStore::with_limits(limits))
        };
        info!(backend = store.backend(), "opened message store");
        Ok(store)
    }

    /// Names the backing adapter.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::File(_) => "file",
            Self::Postgres(_) => "postgres",
        }
    }

    fn inner(&self) -> &dyn MessageStore {
        match self {
            Self::Memory(store) => store,
            Self::File(store) => store,
            Self::Postgres(store) => store,
        }
    }
}

#[async_trait]
impl MessageStore for ConfiguredMessageStore {
    async fn get(&self, id: &MessageId) -> StoreResult<Option<Message>> {
        self.inner().get(id).await
    }

    async fn insert(&self, message: &Message) -> StoreResult<Option<Message>> {
        self.inner().insert(message).await
    }

    async fn remove(&self, id: &MessageId) -> StoreResult<Option<Message>> {
        self.inner().remove(id).await
    }

    async fn values(&self) -> StoreResult<Vec<Message>> {
        self.inner().values().await
    }

    async fn advance_counter(&self) -> StoreResult<u64> {
        self.inner().advance_counter().await
    }
}
