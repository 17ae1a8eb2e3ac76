//! Sequential reader over the dense key range
//!
//! The downstream consumer walks `item-0 .. item-(N-1)`. Keys are dense by
//! the sink contract, so the first absent key marks the end of what a store
//! holds.

use crate::item::{Item, ItemKey};
use crate::sink::traits::{ItemSink, SinkResult};

/// Reads every stored item back in key order
///
/// Probes keys upward from `item-0` and stops at the first absent one.
///
/// # Arguments
///
/// * `sink` - The sink to read from
///
/// # Returns
///
/// * `Ok(pairs)` - All (key, item) pairs in ascending key order
/// * `Err(SinkError)` - The store became unreachable mid-read
pub async fn read_all(sink: &dyn ItemSink) -> SinkResult<Vec<(ItemKey, Item)>> {
    let mut pairs = Vec::new();

    for index in 0u64.. {
        let key = ItemKey::new(index);
        match sink.get(&key).await? {
            Some(item) => pairs.push((key, item)),
            None => break,
        }
    }

    Ok(pairs)
}
