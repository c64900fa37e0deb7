//! Diesel schema for message board persistence.

diesel::table! {
    /// Message records keyed by identifier.
    board_messages (id) {
        /// Message identifier, compared with the `C` collation.
        #[max_length = 64]
        id -> Varchar,
        /// Message title.
        title -> Text,
        /// Message body.
        body -> Text,
        /// Attachment URL, possibly empty.
        attachment_url -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Latest update timestamp.
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Named durable counters.
    board_counters (name) {
        /// Counter name.
        #[max_length = 64]
        name -> Varchar,
        /// Current counter value.
        value -> Int8,
    }
}
