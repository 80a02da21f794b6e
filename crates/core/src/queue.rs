//! Task Queue
//!
//! An unbounded multi-producer, single-consumer FIFO of [`AudioDirective`]s.
//! Producers hold cloneable [`TaskSender`]s; the audio processor owns the one
//! [`TaskReceiver`]. Each producer's directives keep their relative order;
//! directives from different producers interleave in arrival order.

use crate::directive::AudioDirective;
use tokio::sync::mpsc;

/// The consumer side was dropped; the directive was discarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("task queue is closed")]
pub struct QueueClosed;

/// Creates a connected sender/receiver pair.
pub fn task_queue() -> (TaskSender, TaskReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TaskSender { tx }, TaskReceiver { rx })
}

/// Producer handle. Cheap to clone; never blocks.
#[derive(Clone, Debug)]
pub struct TaskSender {
    tx: mpsc::UnboundedSender<AudioDirective>,
}

impl TaskSender {
    /// Appends a directive to the back of the queue.
    pub fn enqueue(&self, directive: AudioDirective) -> Result<(), QueueClosed> {
        tracing::debug!(%directive, "Directive enqueued");
        self.tx.send(directive).map_err(|_| QueueClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer handle. Exactly one exists per queue.
#[derive(Debug)]
pub struct TaskReceiver {
    rx: mpsc::UnboundedReceiver<AudioDirective>,
}

impl TaskReceiver {
    /// Waits for the next directive. Returns `None` once every sender is gone
    /// and the queue has been drained.
    pub async fn dequeue(&mut self) -> Option<AudioDirective> {
        self.rx.recv().await
    }

    /// Directives waiting to be processed.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
