//! `PostgreSQL` store implementation for message records.

use super::{
    models::{CounterValueRow, MessageRow},
    schema::board_messages,
};
use crate::board::{
    domain::{Message, MessageId, PersistedMessageData},
    ports::{MessageStore, StoreError, StoreLimits, StoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by board adapters.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// Counter row backing sequential identifiers.
const MESSAGE_ID_COUNTER: &str = "message_id";

/// `PostgreSQL`-backed message store.
///
/// Keys are ordered by the `C` collation of the `id` column, which matches
/// the byte-wise order of the other adapters.
#[derive(Debug, Clone)]
pub struct PostgresMessageStore {
    pool: BoardPgPool,
    limits: StoreLimits,
}

impl PostgresMessageStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool, limits: StoreLimits) -> Self {
        Self { pool, limits }
    }

    /// Builds a connection pool for `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the pool cannot establish
    /// its initial connections.
    pub fn connect(database_url: &str, limits: StoreLimits) -> StoreResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .build(manager)
            .map_err(StoreError::persistence)?;
        Ok(Self::new(pool, limits))
    }

    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(StoreError::persistence)?
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn get(&self, id: &MessageId) -> StoreResult<Option<Message>> {
        let key = id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = find_row(connection, &key)?;
            Ok(row.map(row_to_message))
        })
        .await
    }

    async fn insert(&self, message: &Message) -> StoreResult<Option<Message>> {
        self.limits.check(message)?;
        let row = to_row(message);
        self.run_blocking(move |connection| {
            connection
                .transaction::<_, diesel::result::Error, _>(|tx| {
                    let previous = board_messages::table
                        .filter(board_messages::id.eq(&row.id))
                        .select(MessageRow::as_select())
                        .for_update()
                        .first::<MessageRow>(tx)
                        .optional()?;

                    diesel::insert_into(board_messages::table)
                        .values(&row)
                        .on_conflict(board_messages::id)
                        .do_update()
                        .set(&row)
                        .execute(tx)?;

                    Ok(previous)
                })
                .map(|previous| previous.map(row_to_message))
                .map_err(StoreError::persistence)
        })
        .await
    }

    async fn remove(&self, id: &MessageId) -> StoreResult<Option<Message>> {
        let key = id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = diesel::delete(board_messages::table.filter(board_messages::id.eq(&key)))
                .returning(MessageRow::as_returning())
                .get_result::<MessageRow>(connection)
                .optional()
                .map_err(StoreError::persistence)?;
            Ok(row.map(row_to_message))
        })
        .await
    }

    async fn values(&self) -> StoreResult<Vec<Message>> {
        self.run_blocking(|connection| {
            let rows = board_messages::table
                .order(board_messages::id.asc())
                .select(MessageRow::as_select())
                .load::<MessageRow>(connection)
                .map_err(StoreError::persistence)?;
            Ok(rows.into_iter().map(row_to_message).collect())
        })
        .await
    }

    async fn advance_counter(&self) -> StoreResult<u64> {
        self.run_blocking(|connection| {
            let row = diesel::sql_query(concat!(
                "INSERT INTO board_counters (name, value) VALUES ($1, 1) ",
                "ON CONFLICT (name) DO UPDATE SET value = board_counters.value + 1 ",
                "RETURNING value",
            ))
            .bind::<diesel::sql_types::Varchar, _>(MESSAGE_ID_COUNTER)
            .get_result::<CounterValueRow>(connection)
            .map_err(StoreError::persistence)?;
            u64::try_from(row.value).map_err(StoreError::invalid_persisted_data)
        })
        .await
    }
}

fn find_row(connection: &mut PgConnection, key: &str) -> StoreResult<Option<MessageRow>> {
    board_messages::table
        .filter(board_messages::id.eq(key))
        .select(MessageRow::as_select())
        .first::<MessageRow>(connection)
        .optional()
        .map_err(StoreError::persistence)
}

pub(super) fn to_row(message: &Message) -> MessageRow {
    MessageRow {
        id: message.id().as_str().to_owned(),
        title: message.title().to_owned(),
        body: message.body().to_owned(),
        attachment_url: message.attachment_url().to_owned(),
        created_at: message.created_at(),
        updated_at: message.updated_at(),
    }
}

pub(super) fn row_to_message(row: MessageRow) -> Message {
    let MessageRow {
        id,
        title,
        body,
        attachment_url,
        created_at,
        updated_at,
    } = row;

    Message::from_persisted(PersistedMessageData {
        id: MessageId::from(id),
        title,
        body,
        attachment_url,
        created_at,
        updated_at,
    })
}
