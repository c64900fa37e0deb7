//! Shared helpers for `PostgreSQL` store integration tests.

pub use super::cluster::{BoxError, PostgresCluster, TemporaryDatabase};
use super::cluster::{REQUIRE_CLUSTER_ENV, shared_cluster};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use message_board::board::{
    adapters::postgres::PostgresMessageStore,
    domain::{Message, MessageId, MessagePayload},
    ports::StoreLimits,
};
use mockable::DefaultClock;
use rstest::fixture;
use std::future::Future;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// SQL creating the board tables.
pub const CREATE_BOARD_TABLES_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_board_messages/up.sql");

/// SQL dropping the board tables.
pub const DROP_BOARD_TABLES_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_board_messages/down.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "message_board_test_template";

/// Builds the single-threaded runtime tests drive the store with.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
pub fn test_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Runs raw SQL against the database at `url`.
///
/// # Errors
///
/// Returns an error if connecting or executing fails.
pub fn execute_sql(url: &str, sql: &str) -> Result<(), BoxError> {
    let mut conn = PgConnection::establish(url).map_err(|err| Box::new(err) as BoxError)?;
    conn.batch_execute(sql)
        .map_err(|err| Box::new(err) as BoxError)
}

/// Opens a store with its own pool on the database at `url`.
///
/// # Errors
///
/// Returns an error if the pool cannot connect.
pub fn connect_store(url: &str, limits: StoreLimits) -> Result<PostgresMessageStore, BoxError> {
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .map_err(|err| Box::new(err) as BoxError)?;
    Ok(PostgresMessageStore::new(pool, limits))
}

/// Store over a private migrated database, with a runtime to drive it.
pub struct StoreContext {
    /// Store under test.
    pub store: PostgresMessageStore,
    /// Database backing `store`; declared after it so the pool closes first.
    pub database: TemporaryDatabase,
    rt: Runtime,
}

impl StoreContext {
    /// Drives `future` to completion on the context runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.rt.block_on(future)
    }
}

/// Returns the shared cluster, or `None` when it cannot start and the
/// suite is allowed to skip.
///
/// # Errors
///
/// Returns the startup error when `BOARD_REQUIRE_POSTGRES` is set.
pub fn available_cluster() -> Result<Option<PostgresCluster>, BoxError> {
    match shared_cluster() {
        Ok(cluster) => Ok(Some(cluster)),
        Err(err) if std::env::var_os(REQUIRE_CLUSTER_ENV).is_none() => {
            tracing::warn!(error = %err, "PostgreSQL unavailable; skipping store test");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Provides a store over a fresh database cloned from the template.
///
/// # Errors
///
/// Returns an error if template creation, cloning or connecting fails.
#[fixture]
pub fn store_context() -> Result<Option<StoreContext>, BoxError> {
    let Some(cluster) = available_cluster()? else {
        return Ok(None);
    };
    cluster.ensure_template_exists(TEMPLATE_DB, |url| {
        execute_sql(url, CREATE_BOARD_TABLES_SQL)
    })?;
    let database = cluster.temporary_database_from_template(
        &format!("board_test_{}", Uuid::new_v4().simple()),
        TEMPLATE_DB,
    )?;
    let store = connect_store(database.url(), StoreLimits::default())?;
    let rt = test_runtime().map_err(|err| Box::new(err) as BoxError)?;
    Ok(Some(StoreContext {
        store,
        database,
        rt,
    }))
}

/// Builds a record stamped with the wall clock.
#[must_use]
pub fn message(id: &str, body: &str) -> Message {
    Message::new(
        MessageId::new(id),
        MessagePayload::new("title", body, "https://example.com/a.png"),
        &DefaultClock,
    )
}
