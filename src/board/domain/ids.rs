//! Identifier types and assignment strategies for message records.

use super::ParseIdStrategyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque key of a message record.
///
/// Ordering is byte-wise over the underlying string, which is the native
/// key order of every store adapter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wraps an existing identifier without validation.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Creates a random identifier from a version 4 UUID.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an identifier from a sequential counter value.
    #[must_use]
    pub fn from_sequence(value: u64) -> Self {
        Self(value.to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the encoded key length in bytes.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for MessageId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How fresh message identifiers are produced.
///
/// One strategy is chosen per service instance and never mixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Version 4 UUIDs, unique independently of process lifetime.
    #[default]
    Random,
    /// Decimal values of a counter held in the durable store.
    Sequential,
}

impl IdStrategy {
    /// Length in bytes of the longest key this strategy produces.
    ///
    /// Sequential keys are bounded by the decimal width of `u64::MAX`.
    #[must_use]
    pub const fn max_key_bytes(self) -> usize {
        match self {
            Self::Random => 36,
            Self::Sequential => 20,
        }
    }

    /// Returns the canonical configuration representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Sequential => "sequential",
        }
    }
}

impl TryFrom<&str> for IdStrategy {
    type Error = ParseIdStrategyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "random" | "uuid" => Ok(Self::Random),
            "sequential" | "counter" => Ok(Self::Sequential),
            _ => Err(ParseIdStrategyError(value.to_owned())),
        }
    }
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
