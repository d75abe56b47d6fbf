//! Background persistence queue.
//!
//! Low-priority mutations (access touches, cleanup) and medium-priority
//! promotions flow through bounded per-priority channels into a single
//! consumer task. One consumer means the durable store needs no extra
//! locking for these mutation types; the hot tier keeps its reader/writer
//! lock because recall readers run concurrently.
//!
//! Every task is idempotent under the relaxed-consistency contract: a
//! replayed access touch may over-count by at most one.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use aula_core::constants::{CLEANUP_ACCESS_FLOOR, CLEANUP_IMPORTANCE_FLOOR};
use aula_core::errors::{AulaError, AulaResult};
use aula_core::traits::{CleanupCriteria, IDurableStore};

use crate::hot_tier::HotTier;

/// A deferred mutation.
#[derive(Debug, Clone)]
pub enum PersistTask {
    /// Bump access counters for a recalled entry. Low priority.
    AccessTouch { id: String, at: DateTime<Utc> },
    /// Re-offer a durable entry to the hot tier. Medium priority.
    Promote { id: String },
    /// Age-based cleanup pass. Low priority.
    Cleanup { age_days: i64 },
}

impl PersistTask {
    fn is_medium(&self) -> bool {
        matches!(self, PersistTask::Promote { .. })
    }
}

/// Producer half: hands tasks to the single consumer, never blocking.
pub struct PersistenceQueue {
    low_tx: mpsc::Sender<PersistTask>,
    medium_tx: mpsc::Sender<PersistTask>,
    capacity: usize,
}

impl PersistenceQueue {
    /// Create the channel pair and the consumer's receiving ends.
    pub fn new(capacity: usize) -> (Self, QueueReceivers) {
        let (low_tx, low_rx) = mpsc::channel(capacity);
        let (medium_tx, medium_rx) = mpsc::channel(capacity);
        (
            Self {
                low_tx,
                medium_tx,
                capacity,
            },
            QueueReceivers { low_rx, medium_rx },
        )
    }

    /// Enqueue without blocking. A full channel is backpressure, surfaced
    /// as `QueueSaturated` for the caller to drop or retry.
    pub fn enqueue(&self, task: PersistTask) -> AulaResult<()> {
        let tx = if task.is_medium() {
            &self.medium_tx
        } else {
            &self.low_tx
        };
        match tx.try_send(task) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(AulaError::QueueSaturated {
                pending: self.pending(),
            }),
            Err(TrySendError::Closed(_)) => Err(AulaError::QueueClosed),
        }
    }

    /// Number of tasks currently buffered across both channels.
    pub fn pending(&self) -> usize {
        (self.capacity - self.low_tx.capacity()) + (self.capacity - self.medium_tx.capacity())
    }
}

/// Consumer half, fed to [`QueueWorker::spawn`].
pub struct QueueReceivers {
    low_rx: mpsc::Receiver<PersistTask>,
    medium_rx: mpsc::Receiver<PersistTask>,
}

/// The single consumer. Owns the receivers and applies tasks against the
/// durable store and the hot tier.
pub struct QueueWorker {
    receivers: QueueReceivers,
    durable: Arc<dyn IDurableStore>,
    hot: Arc<HotTier>,
    promotion_threshold: f64,
}

impl QueueWorker {
    pub fn new(
        receivers: QueueReceivers,
        durable: Arc<dyn IDurableStore>,
        hot: Arc<HotTier>,
        promotion_threshold: f64,
    ) -> Self {
        Self {
            receivers,
            durable,
            hot,
            promotion_threshold,
        }
    }

    /// Spawn the consumer task. Runs until both producers are dropped and
    /// the channels are drained; resolves to the processed-task count.
    pub fn spawn(self) -> JoinHandle<u64> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) -> u64 {
        let mut processed = 0u64;
        let mut medium_open = true;
        let mut low_open = true;

        loop {
            // Medium tasks always drain ahead of low ones.
            match self.receivers.medium_rx.try_recv() {
                Ok(task) => {
                    self.apply(task);
                    processed += 1;
                    continue;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => medium_open = false,
            }
            match self.receivers.low_rx.try_recv() {
                Ok(task) => {
                    self.apply(task);
                    processed += 1;
                    continue;
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => low_open = false,
            }

            if !medium_open && !low_open {
                break;
            }

            tokio::select! {
                biased;
                task = self.receivers.medium_rx.recv(), if medium_open => match task {
                    Some(task) => {
                        self.apply(task);
                        processed += 1;
                    }
                    None => medium_open = false,
                },
                task = self.receivers.low_rx.recv(), if low_open => match task {
                    Some(task) => {
                        self.apply(task);
                        processed += 1;
                    }
                    None => low_open = false,
                },
            }
        }

        debug!(processed, "persistence queue drained");
        processed
    }

    fn apply(&self, task: PersistTask) {
        match task {
            PersistTask::AccessTouch { id, at } => {
                if let Err(e) = self.durable.apply_access(&id, at) {
                    // Consistency warning: the counter diverges until the
                    // next successful touch.
                    warn!(id = %id, error = %e, "deferred access touch failed");
                    return;
                }
                self.hot.touch(&id, at);
            }
            PersistTask::Promote { id } => match self.durable.get(&id) {
                Ok(Some(entry)) => {
                    let force = entry.importance.value() > self.promotion_threshold;
                    self.hot.admit(entry, force);
                }
                Ok(None) => debug!(id = %id, "promotion target no longer exists"),
                Err(e) => warn!(id = %id, error = %e, "promotion read failed"),
            },
            PersistTask::Cleanup { age_days } => {
                let criteria = CleanupCriteria {
                    last_accessed_before: Utc::now() - Duration::days(age_days),
                    access_count_below: CLEANUP_ACCESS_FLOOR,
                    importance_below: CLEANUP_IMPORTANCE_FLOOR,
                };
                match self.durable.delete_matching(&criteria) {
                    Ok(ids) => {
                        let dropped = self.hot.remove_many(&ids);
                        debug!(deleted = ids.len(), hot_dropped = dropped, "cleanup pass");
                    }
                    Err(e) => warn!(error = %e, "deferred cleanup failed"),
                }
            }
        }
    }
}
