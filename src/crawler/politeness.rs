//! Per-host politeness limits
//!
//! This module handles:
//! - A concurrency ceiling per host (simultaneous in-flight requests)
//! - A minimum delay between request starts against the same host
//!
//! Limits apply per host and hosts are independent: a slow host never
//! delays requests to a fast one. Host state is created lazily on first
//! contact.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Permission to send one request to a host
///
/// Dropping the permit frees the host's concurrency slot.
#[derive(Debug)]
pub struct HostPermit {
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug)]
struct HostState {
    /// Bounds in-flight requests; never closed
    slots: Arc<Semaphore>,

    /// Earliest time the next request to this host may start
    next_slot: Mutex<Instant>,
}

/// Hands out request permits according to per-host limits
#[derive(Debug)]
pub struct HostLimiter {
    max_per_host: usize,
    min_delay: Duration,
    hosts: Mutex<HashMap<String, Arc<HostState>>>,
}

impl HostLimiter {
    /// Creates a limiter
    ///
    /// # Arguments
    ///
    /// * `max_per_host` - Concurrency ceiling per host (at least 1)
    /// * `host_delay_ms` - Minimum milliseconds between request starts to
    ///   one host (0 disables the delay gate)
    pub fn new(max_per_host: usize, host_delay_ms: u64) -> Self {
        Self {
            max_per_host,
            min_delay: Duration::from_millis(host_delay_ms),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until a request to `host` is allowed to start
    ///
    /// Blocks on two gates in order: a free concurrency slot, then the
    /// host's minimum-delay window. The returned permit must be held for
    /// the duration of the request (including its retries) and dropped
    /// afterwards.
    pub async fn acquire(&self, host: &str) -> HostPermit {
        let state = self.host_state(host);

        let permit = state
            .slots
            .clone()
            .acquire_owned()
            .await
            .expect("host semaphore is never closed");

        if !self.min_delay.is_zero() {
            loop {
                let now = Instant::now();
                let wait = {
                    let mut next_slot = state.next_slot.lock().unwrap();
                    if *next_slot <= now {
                        *next_slot = now + self.min_delay;
                        None
                    } else {
                        Some(*next_slot - now)
                    }
                };

                match wait {
                    None => break,
                    Some(delay) => tokio::time::sleep(delay).await,
                }
            }
        }

        HostPermit { _permit: permit }
    }

    fn host_state(&self, host: &str) -> Arc<HostState> {
        let mut hosts = self.hosts.lock().unwrap();
        Arc::clone(hosts.entry(host.to_string()).or_insert_with(|| {
            Arc::new(HostState {
                slots: Arc::new(Semaphore::new(self.max_per_host)),
                next_slot: Mutex::new(Instant::now()),
            })
        }))
    }
}
