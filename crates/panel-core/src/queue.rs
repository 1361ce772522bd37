//! Bounded queues between the workers
//!
//! Two queues, two policies:
//!
//! - [`InboundQueue`] sits between the serial reader and the decode worker.
//!   Under overload, freshness of status beats completeness: a full queue
//!   evicts its oldest entry to admit an `IF` frame, and silently drops
//!   anything else. Neither case is an error to the caller.
//! - [`OutboundQueue`] sits between command producers and the writer. It is
//!   strictly FIFO; enqueue waits a bounded time and then fails explicitly,
//!   so time-critical callers see a transient failure instead of blocking.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use cat_ts590::MAX_COMMAND_LEN;
use tokio::sync::mpsc;
use tokio::sync::Notify;
use tracing::debug;

use crate::error::EngineError;

/// Default inbound command queue depth
pub const INBOUND_QUEUE_CAPACITY: usize = 32;

/// Default outbound command queue depth
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Bounded wait before an outbound enqueue fails
pub const ENQUEUE_TIMEOUT: Duration = Duration::from_millis(50);

/// Work queue of framed commands awaiting decode
#[derive(Debug)]
pub struct InboundQueue {
    inner: Mutex<VecDeque<String>>,
    capacity: usize,
    notify: Notify,
}

impl InboundQueue {
    /// Create with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(INBOUND_QUEUE_CAPACITY)
    }

    /// Create with an explicit capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
        }
    }

    /// Enqueue a framed command, applying the overload policy
    ///
    /// When full: an `IF`-prefixed command evicts the oldest queued entry;
    /// any other command is dropped. Both outcomes are absorbed here, never
    /// surfaced to the reader.
    pub fn push(&self, cmd: String) {
        {
            let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if queue.len() >= self.capacity {
                if cmd.starts_with("IF") {
                    let evicted = queue.pop_front();
                    debug!(?evicted, "inbound queue full: evicted oldest for IF");
                } else {
                    debug!(dropped = %cmd, "inbound queue full: dropped");
                    return;
                }
            }
            queue.push_back(cmd);
        }
        self.notify.notify_one();
    }

    /// Take the oldest queued command
    pub fn pop(&self) -> Option<String> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).pop_front()
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until a push signals new work
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Sender half of the outbound command queue
#[derive(Clone)]
pub struct OutboundQueue {
    tx: mpsc::Sender<String>,
}

impl OutboundQueue {
    /// Create the queue, returning the writer's receiving half
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Enqueue one command (without terminator) for the writer
    ///
    /// Oversized commands are rejected up front - truncation could produce
    /// a different, valid-looking command. A full queue fails after the
    /// bounded wait.
    pub async fn enqueue(&self, cmd: String) -> Result<(), EngineError> {
        if cmd.len() + 1 > MAX_COMMAND_LEN {
            return Err(EngineError::Protocol(cat_ts590::ParseError::CommandTooLong(
                cmd.len() + 1,
            )));
        }
        self.tx
            .send_timeout(cmd, ENQUEUE_TIMEOUT)
            .await
            .map_err(|_| EngineError::QueueFull)
    }
}
