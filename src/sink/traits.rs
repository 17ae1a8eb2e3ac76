//! Item sink trait and error types
//!
//! This module defines the persistence boundary extracted items flow into,
//! and the error type sink adapters report.

use crate::item::{Item, ItemKey};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during sink operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed record under {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for item sink adapters
///
/// The sink owns key assignment. Whatever the backing store, an adapter must
/// hand out keys as if every `put` ran under one global lock that increments
/// a counter and writes: dense, gapless, collision-free, starting at 0.
#[async_trait]
pub trait ItemSink: Send + Sync {
    // ===== Persistence =====

    /// Persists an item under the next sequence key
    ///
    /// The counter behind the key sequence advances only after the write
    /// succeeds, so a failed `put` retried later lands on the same key
    /// instead of leaving a gap.
    ///
    /// # Arguments
    ///
    /// * `item` - The item to persist
    ///
    /// # Returns
    ///
    /// * `Ok(key)` - The key the item was stored under
    /// * `Err(SinkError::Unavailable)` - The backing store is unreachable
    async fn put(&self, item: &Item) -> SinkResult<ItemKey>;

    // ===== Retrieval =====

    /// Retrieves a previously stored item by key
    ///
    /// # Returns
    ///
    /// * `Ok(Some(item))` - An item is stored under this key
    /// * `Ok(None)` - Nothing stored under this key
    /// * `Err(SinkError)` - The store is unreachable or the record is malformed
    async fn get(&self, key: &ItemKey) -> SinkResult<Option<Item>>;

    /// Returns how many keys this sink has assigned
    async fn count(&self) -> SinkResult<u64>;
}
