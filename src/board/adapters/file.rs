//! Snapshot-file implementation of the `MessageStore` port.
//!
//! The whole map and the identifier counter live in one JSON snapshot inside
//! a capability-scoped directory. Each mutation rewrites the snapshot to a
//! temporary file, syncs it and renames it into place, so a crash leaves
//! either the previous or the new state on disk. The directory itself is
//! synced after the rename so the new entry is durable too. Mutations run on
//! the blocking thread pool. Opening the directory again restores the last
//! committed state without any explicit load call.

use crate::board::{
    domain::{Message, MessageId},
    ports::{MessageStore, StoreError, StoreLimits, StoreResult},
};
use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// File name of the committed snapshot.
pub const SNAPSHOT_FILE: &str = "board.snapshot.json";
const SNAPSHOT_TEMP_FILE: &str = "board.snapshot.json.tmp";

/// Durable message store backed by a snapshot file.
///
/// Clones share the same directory handle and in-memory view.
#[derive(Debug, Clone)]
pub struct FileMessageStore {
    dir: Arc<Dir>,
    state: Arc<RwLock<Snapshot>>,
    limits: StoreLimits,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    counter: u64,
    messages: BTreeMap<MessageId, Message>,
}

/// A snapshot entry whose key disagrees with the record it holds.
#[derive(Debug)]
struct KeyMismatchError {
    key: MessageId,
    record_id: MessageId,
}

impl fmt::Display for KeyMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "snapshot key {} holds record with id {}",
            self.key, self.record_id
        )
    }
}

impl std::error::Error for KeyMismatchError {}

impl FileMessageStore {
    /// Opens the store in `path`, creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the directory cannot be
    /// created or read, and [`StoreError::InvalidPersistedData`] when an
    /// existing snapshot cannot be decoded.
    pub fn open(path: &Utf8Path, limits: StoreLimits) -> StoreResult<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority()).map_err(StoreError::persistence)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(StoreError::persistence)?;
        Self::open_in(dir, limits)
    }

    /// Opens the store inside an already-authorized directory handle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the snapshot cannot be read,
    /// and [`StoreError::InvalidPersistedData`] when it cannot be decoded.
    pub fn open_in(dir: Dir, limits: StoreLimits) -> StoreResult<Self> {
        let snapshot = load_snapshot(&dir)?;
        debug!(
            records = snapshot.messages.len(),
            counter = snapshot.counter,
            "loaded message snapshot"
        );
        Ok(Self {
            dir: Arc::new(dir),
            state: Arc::new(RwLock::new(snapshot)),
            limits,
        })
    }

    /// Runs a snapshot mutation on the blocking pool.
    ///
    /// The closure receives the directory handle and the shared state; it
    /// must write the snapshot before releasing the state lock.
    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Dir, &RwLock<Snapshot>) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || f(&dir, &state))
            .await
            .map_err(StoreError::persistence)?
    }
}

fn persist(dir: &Dir, snapshot: &Snapshot) -> StoreResult<()> {
    let encoded = serde_json::to_vec(snapshot).map_err(StoreError::invalid_persisted_data)?;
    write_synced(dir, SNAPSHOT_TEMP_FILE, &encoded).map_err(StoreError::persistence)?;
    dir.rename(SNAPSHOT_TEMP_FILE, dir, SNAPSHOT_FILE)
        .map_err(StoreError::persistence)?;
    sync_dir(dir).map_err(StoreError::persistence)?;
    debug!(
        bytes = encoded.len(),
        records = snapshot.messages.len(),
        "wrote message snapshot"
    );
    Ok(())
}

fn load_snapshot(dir: &Dir) -> StoreResult<Snapshot> {
    let contents = match dir.read_to_string(SNAPSHOT_FILE) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::default()),
        Err(err) => return Err(StoreError::persistence(err)),
    };

    let snapshot: Snapshot =
        serde_json::from_str(&contents).map_err(StoreError::invalid_persisted_data)?;
    if let Some((key, message)) = snapshot
        .messages
        .iter()
        .find(|(key, message)| *key != message.id())
    {
        return Err(StoreError::invalid_persisted_data(KeyMismatchError {
            key: key.clone(),
            record_id: message.id().clone(),
        }));
    }
    Ok(snapshot)
}

fn write_synced(dir: &Dir, file_name: &str, contents: &[u8]) -> io::Result<()> {
    let mut file = dir.create(file_name)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Flushes the directory entry so a completed rename survives power loss.
#[cfg(unix)]
fn sync_dir(dir: &Dir) -> io::Result<()> {
    dir.as_cap_std().try_clone()?.into_std_file().sync_all()
}

#[cfg(not(unix))]
const fn sync_dir(_dir: &Dir) -> io::Result<()> {
    Ok(())
}

fn lock_error(err: &impl fmt::Display) -> StoreError {
    StoreError::persistence(io::Error::other(err.to_string()))
}

#[async_trait]
impl MessageStore for FileMessageStore {
    async fn get(&self, id: &MessageId) -> StoreResult<Option<Message>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state.messages.get(id).cloned())
    }

    async fn insert(&self, message: &Message) -> StoreResult<Option<Message>> {
        self.limits.check(message)?;
        let record = message.clone();
        self.run_blocking(move |dir, state| {
            let mut snapshot = state.write().map_err(|err| lock_error(&err))?;
            let id = record.id().clone();
            let previous = snapshot.messages.insert(id.clone(), record);

            if let Err(err) = persist(dir, &snapshot) {
                match &previous {
                    Some(prior) => snapshot.messages.insert(id, prior.clone()),
                    None => snapshot.messages.remove(&id),
                };
                return Err(err);
            }
            Ok(previous)
        })
        .await
    }

    async fn remove(&self, id: &MessageId) -> StoreResult<Option<Message>> {
        let key = id.clone();
        self.run_blocking(move |dir, state| {
            let mut snapshot = state.write().map_err(|err| lock_error(&err))?;
            let Some(removed) = snapshot.messages.remove(&key) else {
                return Ok(None);
            };

            if let Err(err) = persist(dir, &snapshot) {
                snapshot.messages.insert(key, removed);
                return Err(err);
            }
            Ok(Some(removed))
        })
        .await
    }

    async fn values(&self) -> StoreResult<Vec<Message>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state.messages.values().cloned().collect())
    }

    async fn advance_counter(&self) -> StoreResult<u64> {
        self.run_blocking(|dir, state| {
            let mut snapshot = state.write().map_err(|err| lock_error(&err))?;
            let previous = snapshot.counter;
            snapshot.counter = previous.saturating_add(1);

            if let Err(err) = persist(dir, &snapshot) {
                snapshot.counter = previous;
                return Err(err);
            }
            Ok(snapshot.counter)
        })
        .await
    }
}
