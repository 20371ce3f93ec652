use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use crate::models::payment::PaymentRequest;

#[derive(Debug, Error)]
#[error("admission queue is full")]
pub struct QueueFull;

/// Bounded buffer between HTTP ingress and the worker pool. Admission is
/// non-blocking and rejects on overflow; that rejection is the system's
/// only backpressure mechanism. Workers share the consuming end.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<PaymentRequest>,
    rx: Arc<Mutex<mpsc::Receiver<PaymentRequest>>>,
}

impl JobQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Admits a request if capacity is available, rejecting immediately
    /// otherwise. Never blocks the HTTP producer.
    pub fn enqueue(&self, req: PaymentRequest) -> Result<(), QueueFull> {
        self.tx.try_send(req).map_err(|_| QueueFull)
    }

    /// Resubmits a failed delivery for another attempt. Unlike `enqueue`
    /// this waits for capacity: an accepted request is never dropped.
    pub async fn requeue(&self, req: PaymentRequest) {
        // Send only fails when the receiver is gone, i.e. during shutdown.
        let _ = self.tx.send(req).await;
    }

    /// Blocks until a request is available. `None` means the queue was
    /// closed and the worker should exit.
    pub async fn dequeue(&self) -> Option<PaymentRequest> {
        self.rx.lock().await.recv().await
    }

    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
