use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use diesel::{
    r2d2::{ConnectionManager, Pool},
    PgConnection,
};
use tokio::sync::Mutex;

use crate::db::models::StorageEntry;

pub const LAST_BLOCK_NUMBER_KEY: &str = "lastBlockNumber";
pub const TOTAL_EVENTS_KEY: &str = "totalEvents";

// how far behind the chain head a fresh checkpoint starts
const CHECKPOINT_SEED_DISTANCE: u64 = 1000;

/// String-typed key-value storage surviving across watcher invocations. The
/// host guarantees one logical invocation at a time, so implementations do not
/// need any cross-invocation locking.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Scan progress persisted between invocations. `last_block_number` never
/// decreases and `total_events` counts every matched log since inception.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    pub last_block_number: u64,
    pub total_events: u64,
}

impl Checkpoint {
    /// Loads the checkpoint from the store, lazily seeding `last_block_number`
    /// to 1000 blocks behind the current head on the very first invocation.
    pub async fn load(store: &dyn KeyValueStore, current_block: u64) -> anyhow::Result<Self> {
        let last_block_number = match store.get(LAST_BLOCK_NUMBER_KEY).await? {
            Some(raw) => raw
                .parse::<u64>()
                .context(format!("could not parse stored last block number {raw}"))?,
            None => current_block.saturating_sub(CHECKPOINT_SEED_DISTANCE),
        };
        let total_events = match store.get(TOTAL_EVENTS_KEY).await? {
            Some(raw) => raw
                .parse::<u64>()
                .context(format!("could not parse stored total events {raw}"))?,
            None => 0,
        };

        Ok(Self {
            last_block_number,
            total_events,
        })
    }

    pub async fn commit(&self, store: &dyn KeyValueStore) -> anyhow::Result<()> {
        store
            .set(LAST_BLOCK_NUMBER_KEY, &self.last_block_number.to_string())
            .await
            .context("could not persist last block number")?;
        store
            .set(TOTAL_EVENTS_KEY, &self.total_events.to_string())
            .await
            .context("could not persist total events")?;
        Ok(())
    }
}

/// Postgres-backed store, the durable backend used by the daemon.
pub struct PgStore {
    db_connection_pool: Pool<ConnectionManager<PgConnection>>,
}

impl PgStore {
    pub fn new(db_connection_pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { db_connection_pool }
    }
}

#[async_trait]
impl KeyValueStore for PgStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut db_connection = self
            .db_connection_pool
            .get()
            .context("could not get database connection")?;
        StorageEntry::get(&mut db_connection, key)
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut db_connection = self
            .db_connection_pool
            .get()
            .context("could not get database connection")?;
        StorageEntry::set(&mut db_connection, key, value)
    }
}

/// In-memory store used in dev mode and in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
