//! Service layer for message creation, lookup, update and deletion.

use crate::board::{
    domain::{IdStrategy, Message, MessageId, MessagePayload, PayloadError},
    ports::{MessageStore, StoreError},
};
use crate::config::BoardConfig;
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Service-level errors for message board operations.
///
/// Every operation returns either a message or exactly one of these.
#[derive(Debug, Error)]
pub enum BoardError {
    /// No message is stored under the identifier.
    #[error("a message with id={0} not found")]
    NotFound(MessageId),
    /// The write payload is malformed.
    #[error(transparent)]
    InvalidPayload(#[from] PayloadError),
    /// The backing store failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl BoardError {
    /// Returns the missing identifier for [`BoardError::NotFound`].
    #[must_use]
    pub const fn missing_id(&self) -> Option<&MessageId> {
        match self {
            Self::NotFound(id) => Some(id),
            Self::InvalidPayload(_) | Self::Storage(_) => None,
        }
    }
}

/// Result type for message board service operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Message board orchestration service.
///
/// Operations run one at a time: each call holds the service's write gate
/// from its first store access to its last, so no two read-decide-write
/// sequences interleave even when clones are shared across tasks.
pub struct MessageBoardService<S, C>
where
    S: MessageStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    id_strategy: IdStrategy,
    write_gate: Arc<Mutex<()>>,
}

impl<S, C> Clone for MessageBoardService<S, C>
where
    S: MessageStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            id_strategy: self.id_strategy,
            write_gate: Arc::clone(&self.write_gate),
        }
    }
}

impl<S, C> MessageBoardService<S, C>
where
    S: MessageStore,
    C: Clock + Send + Sync,
{
    /// Creates a service assigning random identifiers.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            id_strategy: IdStrategy::Random,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Creates a service using the identifier strategy from `config`.
    #[must_use]
    pub fn from_config(store: Arc<S>, clock: Arc<C>, config: &BoardConfig) -> Self {
        Self::new(store, clock).with_id_strategy(config.id_strategy())
    }

    /// Replaces the identifier strategy.
    #[must_use]
    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Returns the identifier strategy in use.
    #[must_use]
    pub const fn id_strategy(&self) -> IdStrategy {
        self.id_strategy
    }

    /// Lists every message in the store's key order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Storage`] when the store cannot be scanned.
    #[instrument(skip_all)]
    pub async fn list_messages(&self) -> BoardResult<Vec<Message>> {
        let _gate = self.write_gate.lock().await;
        let messages = self.store.values().await.map_err(storage_failure)?;
        debug!(count = messages.len(), "listed messages");
        Ok(messages)
    }

    /// Retrieves a message by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when no message has the identifier,
    /// or [`BoardError::Storage`] when the lookup fails.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn get_message(&self, id: &MessageId) -> BoardResult<Message> {
        let _gate = self.write_gate.lock().await;
        self.find_existing(id).await
    }

    /// Creates a message from an untyped payload.
    ///
    /// The payload is validated before the store is touched, so a rejected
    /// payload leaves the store unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidPayload`] when the payload is malformed,
    /// or [`BoardError::Storage`] when identifier assignment or the write
    /// fails.
    #[instrument(skip_all)]
    pub async fn add_message(&self, payload: &Value) -> BoardResult<Message> {
        let content = parse_payload(payload)?;
        let _gate = self.write_gate.lock().await;

        let id = self.allocate_id().await?;
        if self.store.get(&id).await.map_err(storage_failure)?.is_some() {
            return Err(storage_failure(StoreError::DuplicateKey(id)));
        }

        let message = Message::new(id, content, &*self.clock);
        self.store.insert(&message).await.map_err(storage_failure)?;
        info!(id = %message.id(), "created message");
        Ok(message)
    }

    /// Replaces the content of an existing message.
    ///
    /// The identifier and creation time are kept; the update time is set to
    /// the current time. An unknown identifier is reported before the
    /// payload is inspected.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when no message has the identifier,
    /// [`BoardError::InvalidPayload`] when the payload is malformed, or
    /// [`BoardError::Storage`] when the store fails.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn update_message(&self, id: &MessageId, payload: &Value) -> BoardResult<Message> {
        let _gate = self.write_gate.lock().await;
        let existing = self.find_existing(id).await?;
        let content = parse_payload(payload)?;

        let revised = existing.revised(content, &*self.clock);
        self.store.insert(&revised).await.map_err(storage_failure)?;
        info!("updated message");
        Ok(revised)
    }

    /// Deletes a message and returns the removed record.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NotFound`] when no message has the identifier,
    /// or [`BoardError::Storage`] when the removal fails.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete_message(&self, id: &MessageId) -> BoardResult<Message> {
        let _gate = self.write_gate.lock().await;
        let removed = self
            .store
            .remove(id)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| not_found(id))?;
        info!("deleted message");
        Ok(removed)
    }

    async fn find_existing(&self, id: &MessageId) -> BoardResult<Message> {
        self.store
            .get(id)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| not_found(id))
    }

    async fn allocate_id(&self) -> BoardResult<MessageId> {
        match self.id_strategy {
            IdStrategy::Random => Ok(MessageId::random()),
            IdStrategy::Sequential => self
                .store
                .advance_counter()
                .await
                .map(MessageId::from_sequence)
                .map_err(storage_failure),
        }
    }
}

fn parse_payload(payload: &Value) -> BoardResult<MessagePayload> {
    MessagePayload::from_json(payload).map_err(|err| {
        warn!(error = %err, "rejected message payload");
        BoardError::InvalidPayload(err)
    })
}

fn not_found(id: &MessageId) -> BoardError {
    warn!(id = %id, "message not found");
    BoardError::NotFound(id.clone())
}

fn storage_failure(err: StoreError) -> BoardError {
    error!(error = %err, "message store operation failed");
    BoardError::Storage(err)
}
