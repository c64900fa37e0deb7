//! Message record and its timestamp policy.

use super::{MessageId, MessagePayload};
use chrono::{DateTime, SubsecRound, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Fractional-second digits kept on record timestamps.
const TIMESTAMP_DIGITS: u16 = 6;

/// A record listed on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    title: String,
    body: String,
    #[serde(rename = "attachmentURL")]
    attachment_url: String,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMessageData {
    /// Persisted identifier.
    pub id: MessageId,
    /// Persisted title.
    pub title: String,
    /// Persisted body text.
    pub body: String,
    /// Persisted attachment URL.
    pub attachment_url: String,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp, absent until the first update.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Creates a fresh record stamped with the current clock time.
    ///
    /// Stamps are kept to microsecond precision, the finest every store can
    /// hold, so a record reads back exactly as it was written.
    #[must_use]
    pub fn new(id: MessageId, payload: MessagePayload, clock: &impl Clock) -> Self {
        let (title, body, attachment_url) = payload.into_parts();
        Self {
            id,
            title,
            body,
            attachment_url,
            created_at: now(clock),
            updated_at: None,
        }
    }

    /// Reconstructs a message from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMessageData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            body: data.body,
            attachment_url: data.attachment_url,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns a copy of this record with the payload fields overwritten.
    ///
    /// The identifier and creation time are carried over. The update time
    /// never moves backwards: a clock reading earlier than the latest stamp
    /// on the record is raised to that stamp.
    #[must_use]
    pub fn revised(&self, payload: MessagePayload, clock: &impl Clock) -> Self {
        let (title, body, attachment_url) = payload.into_parts();
        let floor = self.updated_at.unwrap_or(self.created_at);
        Self {
            id: self.id.clone(),
            title,
            body,
            attachment_url,
            created_at: self.created_at,
            updated_at: Some(now(clock).max(floor)),
        }
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> &MessageId {
        &self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the attachment URL, possibly empty.
    #[must_use]
    pub fn attachment_url(&self) -> &str {
        &self.attachment_url
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp, if the message was ever updated.
    #[must_use]
    pub const fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

fn now(clock: &impl Clock) -> DateTime<Utc> {
    clock.utc().trunc_subsecs(TIMESTAMP_DIGITS)
}
