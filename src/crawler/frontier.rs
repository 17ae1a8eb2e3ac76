//! Crawl frontier with visited-set deduplication
//!
//! This module handles:
//! - FIFO ordering of pending tasks (breadth-first, so page 1 is fetched
//!   before page 2 and later pages never starve)
//! - Atomic check-and-insert against the visited set
//! - Depth bounding relative to the seed set

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use url::Url;

/// One unit of crawl work: a URL awaiting fetch
///
/// Created when a link passes the rule engine (or directly for seeds),
/// consumed exactly once by a fetch worker, discarded after processing.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    /// Normalized URL to fetch
    pub url: Url,

    /// Link distance from the seed set (seeds are depth 0)
    pub depth: u32,

    /// Page this URL was discovered on, if any
    pub discovered_from: Option<Url>,
}

impl CrawlTask {
    /// Creates a seed task at depth 0
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            depth: 0,
            discovered_from: None,
        }
    }

    /// Creates a task for a link discovered on another page
    pub fn discovered(url: Url, parent: &CrawlTask) -> Self {
        Self {
            url,
            depth: parent.depth.saturating_add(1),
            discovered_from: Some(parent.url.clone()),
        }
    }
}

/// Frontier of pending tasks plus the visited set
///
/// All state sits behind a single mutex so the visited-set check and the
/// queue insert happen as one atomic step: two workers racing to enqueue the
/// same link get exactly one acceptance between them. An empty queue does not
/// mean the crawl is over, since in-flight tasks may still enqueue more;
/// termination is decided by the engine, which also tracks in-flight work.
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    max_depth: u32,
}

#[derive(Debug)]
struct FrontierState {
    queue: VecDeque<CrawlTask>,
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `max_depth` - Deepest accepted link distance (`u32::MAX` for unbounded)
    pub fn new(max_depth: u32) -> Self {
        Self {
            state: Mutex::new(FrontierState {
                queue: VecDeque::new(),
                visited: HashSet::new(),
            }),
            max_depth,
        }
    }

    /// Offers a task to the frontier
    ///
    /// Accepted only if the URL has never been seen this run and the depth
    /// bound holds. A URL enters the visited set at most once, in the same
    /// locked step as the queue push.
    ///
    /// # Arguments
    ///
    /// * `task` - The task to enqueue (URL already normalized)
    ///
    /// # Returns
    ///
    /// * `true` - Task accepted and queued
    /// * `false` - Duplicate URL or depth bound exceeded
    pub fn enqueue(&self, task: CrawlTask) -> bool {
        if task.depth > self.max_depth {
            return false;
        }

        let mut state = self.state.lock().unwrap();
        if !state.visited.insert(task.url.as_str().to_string()) {
            return false;
        }

        state.queue.push_back(task);
        true
    }

    /// Takes the next task in FIFO order
    ///
    /// # Returns
    ///
    /// * `Some(task)` - The oldest queued task
    /// * `None` - The queue is currently empty
    pub fn next(&self) -> Option<CrawlTask> {
        self.state.lock().unwrap().queue.pop_front()
    }

    /// Returns whether the queue is currently empty
    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().queue.is_empty()
    }

    /// Returns the number of queued tasks
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    /// Returns how many distinct URLs have been accepted this run
    pub fn visited_count(&self) -> usize {
        self.state.lock().unwrap().visited.len()
    }
}
