//! Durable ordered map port for message records.

use crate::board::domain::{Message, MessageId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Ordered key-value store holding message records.
///
/// Every method is a single atomic primitive. Durable implementations must
/// persist each mutation before returning, so that a reopened store exposes
/// exactly the last committed state with no explicit save step.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Looks up a record by key.
    ///
    /// Returns `None` for unknown keys.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    async fn get(&self, id: &MessageId) -> StoreResult<Option<Message>>;

    /// Creates or overwrites the record stored under the message identifier.
    ///
    /// Returns the previous record, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::KeyTooLarge`] or [`StoreError::ValueTooLarge`]
    /// when the record exceeds the configured bounds, leaving the store
    /// unchanged, or a persistence error when the write fails.
    async fn insert(&self, message: &Message) -> StoreResult<Option<Message>>;

    /// Removes a record and returns it.
    ///
    /// Returns `None` when the key was absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the removal cannot be persisted.
    async fn remove(&self, id: &MessageId) -> StoreResult<Option<Message>>;

    /// Returns every record in key order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    async fn values(&self) -> StoreResult<Vec<Message>>;

    /// Increments the durable identifier counter and returns the new value.
    ///
    /// The first call on an empty store returns `1`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the counter cannot be persisted.
    async fn advance_counter(&self) -> StoreResult<u64>;
}

/// Size bounds applied to keys and encoded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    max_key_bytes: usize,
    max_value_bytes: usize,
}

impl StoreLimits {
    /// Default key bound in bytes.
    pub const DEFAULT_MAX_KEY_BYTES: usize = 64;
    /// Default bound on the JSON-encoded record in bytes.
    pub const DEFAULT_MAX_VALUE_BYTES: usize = 1024;

    /// Creates limits from explicit bounds.
    #[must_use]
    pub const fn new(max_key_bytes: usize, max_value_bytes: usize) -> Self {
        Self {
            max_key_bytes,
            max_value_bytes,
        }
    }

    /// Returns the key bound in bytes.
    #[must_use]
    pub const fn max_key_bytes(self) -> usize {
        self.max_key_bytes
    }

    /// Returns the encoded record bound in bytes.
    #[must_use]
    pub const fn max_value_bytes(self) -> usize {
        self.max_value_bytes
    }

    /// Verifies a record fits within both bounds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::KeyTooLarge`] or [`StoreError::ValueTooLarge`]
    /// naming the offending key, or [`StoreError::InvalidPersistedData`] if
    /// the record cannot be encoded.
    pub fn check(self, message: &Message) -> StoreResult<()> {
        let id = message.id();
        if id.byte_len() > self.max_key_bytes {
            return Err(StoreError::KeyTooLarge {
                id: id.clone(),
                actual_bytes: id.byte_len(),
                limit_bytes: self.max_key_bytes,
            });
        }

        let encoded = serde_json::to_vec(message).map_err(StoreError::invalid_persisted_data)?;
        if encoded.len() > self.max_value_bytes {
            return Err(StoreError::ValueTooLarge {
                id: id.clone(),
                actual_bytes: encoded.len(),
                limit_bytes: self.max_value_bytes,
            });
        }
        Ok(())
    }
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_KEY_BYTES, Self::DEFAULT_MAX_VALUE_BYTES)
    }
}

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The key exceeds the configured bound.
    #[error("key {id} is {actual_bytes} bytes, exceeds limit of {limit_bytes}")]
    KeyTooLarge {
        /// The offending key.
        id: MessageId,
        /// Key length in bytes.
        actual_bytes: usize,
        /// Configured bound.
        limit_bytes: usize,
    },

    /// The encoded record exceeds the configured bound.
    #[error("record {id} encodes to {actual_bytes} bytes, exceeds limit of {limit_bytes}")]
    ValueTooLarge {
        /// Key of the offending record.
        id: MessageId,
        /// Encoded size in bytes.
        actual_bytes: usize,
        /// Configured bound.
        limit_bytes: usize,
    },

    /// A freshly assigned key already holds a live record.
    #[error("key already in use: {0}")]
    DuplicateKey(MessageId),

    /// Persisted data could not be encoded or decoded.
    #[error("invalid persisted message data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps encoding, decoding or validation failures of persisted data.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
