//! In-memory sink adapter
//!
//! Holds items in process memory. Used by tests and memory-backend runs;
//! contents vanish when the process exits.

use crate::item::{Item, ItemKey};
use crate::sink::traits::{ItemSink, SinkResult};
use async_trait::async_trait;
use std::sync::Mutex;

/// Sink that keeps items in a vector behind a mutex
///
/// The vector index doubles as the key sequence, so density and collision
/// freedom fall out of pushing under the lock.
#[derive(Debug, Default)]
pub struct MemorySink {
    items: Mutex<Vec<Item>>,
}

impl MemorySink {
    /// Creates an empty in-memory sink
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemSink for MemorySink {
    async fn put(&self, item: &Item) -> SinkResult<ItemKey> {
        let mut items = self.items.lock().unwrap();
        let key = ItemKey::new(items.len() as u64);
        items.push(item.clone());
        Ok(key)
    }

    async fn get(&self, key: &ItemKey) -> SinkResult<Option<Item>> {
        let items = self.items.lock().unwrap();
        Ok(items.get(key.index() as usize).cloned())
    }

    async fn count(&self) -> SinkResult<u64> {
        Ok(self.items.lock().unwrap().len() as u64)
    }
}
