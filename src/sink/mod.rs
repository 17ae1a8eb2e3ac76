//! Item persistence module
//!
//! This module defines the boundary extracted items cross on their way to
//! durable storage: the `ItemSink` trait, an in-memory adapter, a
//! Redis-backed adapter, and the sequential reader the downstream consumer
//! uses to walk the dense key range back.

mod memory;
mod reader;
mod redis;
mod traits;

// Re-export types
pub use self::redis::RedisSink;
pub use memory::MemorySink;
pub use reader::read_all;
pub use traits::{ItemSink, SinkError, SinkResult};
