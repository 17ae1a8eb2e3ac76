//! Redis-backed sink adapter
//!
//! Persists each item as a Redis hash (`HSET item-<n> title ... url ...`),
//! which is the whole protocol the downstream consumer relies on.

use crate::item::{Item, ItemKey};
use crate::sink::traits::{ItemSink, SinkError, SinkResult};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Sink that persists items into Redis hashes
///
/// The key counter lives behind an async mutex and advances only after the
/// HSET succeeds, which keeps the key range dense when a failed put is
/// retried. Every run starts the sequence at 0; overwriting a key with the
/// same record is safe by contract.
pub struct RedisSink {
    client: redis::Client,
    next_index: Mutex<u64>,
}

impl RedisSink {
    /// Connects to Redis and verifies the server is reachable
    ///
    /// Reachability is checked eagerly with a PING so that a dead store is a
    /// startup error, not a surprise on the first `put`.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Connection URL (`redis://[user:pass@]host:port`)
    ///
    /// # Returns
    ///
    /// * `Ok(RedisSink)` - The server answered the PING
    /// * `Err(SinkError::Unavailable)` - Connection or PING failed
    pub async fn connect(redis_url: &str) -> SinkResult<Self> {
        let client = redis::Client::open(redis_url).map_err(unavailable)?;

        let mut con = client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;

        let _: String = redis::cmd("PING")
            .query_async(&mut con)
            .await
            .map_err(unavailable)?;

        Ok(Self {
            client,
            next_index: Mutex::new(0),
        })
    }
}

#[async_trait]
impl ItemSink for RedisSink {
    async fn put(&self, item: &Item) -> SinkResult<ItemKey> {
        // Serialization point: the lock spans counter read, write, and advance
        let mut next_index = self.next_index.lock().await;
        let key = ItemKey::new(*next_index);

        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;

        let fields = [("title", item.title.as_str()), ("url", item.url.as_str())];
        let _: () = con
            .hset_multiple(key.to_string(), &fields)
            .await
            .map_err(unavailable)?;

        *next_index += 1;
        Ok(key)
    }

    async fn get(&self, key: &ItemKey) -> SinkResult<Option<Item>> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(unavailable)?;

        let fields: HashMap<String, String> =
            con.hgetall(key.to_string()).await.map_err(unavailable)?;

        if fields.is_empty() {
            return Ok(None);
        }

        let title = fields.get("title").ok_or_else(|| SinkError::Corrupt {
            key: key.to_string(),
            reason: "missing title field".to_string(),
        })?;
        let url = fields.get("url").ok_or_else(|| SinkError::Corrupt {
            key: key.to_string(),
            reason: "missing url field".to_string(),
        })?;

        Ok(Some(Item::new(title.clone(), url.clone())))
    }

    async fn count(&self) -> SinkResult<u64> {
        Ok(*self.next_index.lock().await)
    }
}

fn unavailable(e: redis::RedisError) -> SinkError {
    SinkError::Unavailable(e.to_string())
}
