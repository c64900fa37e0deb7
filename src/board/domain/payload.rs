//! Write payload carried by create and update requests.

use super::PayloadError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const TITLE_FIELD: &str = "title";
const BODY_FIELD: &str = "body";
const ATTACHMENT_URL_FIELD: &str = "attachmentURL";

/// User-supplied message content.
///
/// A payload never carries an identifier or timestamps; those are assigned
/// by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    title: String,
    body: String,
    #[serde(rename = "attachmentURL")]
    attachment_url: String,
}

impl MessagePayload {
    /// Creates a payload from its three fields.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        attachment_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            attachment_url: attachment_url.into(),
        }
    }

    /// Reads a payload from an untyped JSON value.
    ///
    /// Keys other than `title`, `body` and `attachmentURL` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] when the value is not a non-empty object or
    /// any of the three fields is missing or not a string.
    pub fn from_json(value: &Value) -> Result<Self, PayloadError> {
        let Value::Object(fields) = value else {
            return Err(PayloadError::NotAnObject {
                found: json_type(value),
            });
        };
        if fields.is_empty() {
            return Err(PayloadError::Empty);
        }

        Ok(Self {
            title: string_field(fields, TITLE_FIELD)?,
            body: string_field(fields, BODY_FIELD)?,
            attachment_url: string_field(fields, ATTACHMENT_URL_FIELD)?,
        })
    }

    /// Renders the payload as the JSON object accepted by [`Self::from_json`].
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut fields = Map::new();
        fields.insert(TITLE_FIELD.to_owned(), Value::from(self.title.as_str()));
        fields.insert(BODY_FIELD.to_owned(), Value::from(self.body.as_str()));
        fields.insert(
            ATTACHMENT_URL_FIELD.to_owned(),
            Value::from(self.attachment_url.as_str()),
        );
        Value::Object(fields)
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

    pub(super) fn into_parts(self) -> (String, String, String) {
        (self.title, self.body, self.attachment_url)
    }
}

impl From<MessagePayload> for Value {
    fn from(payload: MessagePayload) -> Self {
        payload.to_json()
    }
}

fn string_field(fields: &Map<String, Value>, field: &'static str) -> Result<String, PayloadError> {
    match fields.get(field) {
        None => Err(PayloadError::MissingField(field)),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(PayloadError::FieldNotString {
            field,
            found: json_type(other),
        }),
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
