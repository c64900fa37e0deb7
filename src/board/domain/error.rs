//! Error types for payload validation and strategy parsing.

use thiserror::Error;

/// Errors returned while reading a write payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// The payload is not a JSON object.
    #[error("invalid payload: expected an object, found {found}")]
    NotAnObject {
        /// JSON type of the rejected value.
        found: &'static str,
    },

    /// The payload is an object without any fields.
    #[error("invalid payload: object has no fields")]
    Empty,

    /// A required field is absent.
    #[error("invalid payload: missing field '{0}'")]
    MissingField(&'static str),

    /// A required field holds a non-string value.
    #[error("invalid payload: field '{field}' must be a string, found {found}")]
    FieldNotString {
        /// Name of the offending field.
        field: &'static str,
        /// JSON type of the offending value.
        found: &'static str,
    },
}

impl PayloadError {
    /// Returns the offending field name, when the error concerns one field.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(field) | Self::FieldNotString { field, .. } => Some(field),
            Self::NotAnObject { .. } | Self::Empty => None,
        }
    }
}

/// Error returned while parsing an identifier strategy name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown identifier strategy: {0}")]
pub struct ParseIdStrategyError(pub String);
