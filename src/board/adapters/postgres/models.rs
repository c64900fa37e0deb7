//! Diesel row models for message persistence.

use super::schema::board_messages;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row shape shared by reads, inserts and upserts of message records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = board_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct MessageRow {
    /// Message identifier.
    pub id: String,
    /// Message title.
    pub title: String,
    /// Message body.
    pub body: String,
    /// Attachment URL.
    pub attachment_url: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result row of a counter increment.
#[derive(Debug, Clone, QueryableByName)]
pub struct CounterValueRow {
    /// Counter value after the increment.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub value: i64,
}
