//! Domain model for message board records.
//!
//! The domain covers message records, write payloads and identifier
//! assignment while keeping storage concerns outside of the domain boundary.

mod error;
mod ids;
mod message;
mod payload;

pub use error::{ParseIdStrategyError, PayloadError};
pub use ids::{IdStrategy, MessageId};
pub use message::{Message, PersistedMessageData};
pub use payload::MessagePayload;
