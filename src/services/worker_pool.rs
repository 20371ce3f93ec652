use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::app::config::Config;
use crate::models::payment::{Payment, PaymentEvent, PaymentRequest, Processor};
use crate::queue::JobQueue;
use crate::services::processor_client::ProcessorApi;
use crate::services::routing::RouteWatch;
use crate::storage::PaymentStore;

/// Fixed set of workers draining the admission queue. Each delivery runs
/// under a global semaphore capping simultaneous outbound calls across the
/// whole pool, independent of the worker count. A failed delivery goes
/// straight back on the queue; retry is unconditional and unbounded.
pub struct WorkerPool {
    queue: JobQueue,
    store: Arc<dyn PaymentStore>,
    client: Arc<dyn ProcessorApi>,
    routes: RouteWatch,
    default_url: String,
    fallback_url: String,
    num_workers: usize,
    concurrency: Arc<Semaphore>,
    attempt_delay: Duration,
}

impl WorkerPool {
    pub fn new(
        queue: JobQueue,
        store: Arc<dyn PaymentStore>,
        client: Arc<dyn ProcessorApi>,
        routes: RouteWatch,
        config: &Config,
    ) -> Self {
        Self {
            queue,
            store,
            client,
            routes,
            default_url: config.default_url.clone(),
            fallback_url: config.fallback_url.clone(),
            num_workers: config.num_workers,
            concurrency: Arc::new(Semaphore::new(config.semaphore_size)),
            attempt_delay: Duration::from_millis(config.worker_sleep_ms),
        }
    }

    pub fn spawn(self) {
        info!(workers = self.num_workers, "starting worker pool");
        let pool = Arc::new(self);
        for _ in 0..pool.num_workers {
            let pool = pool.clone();
            tokio::spawn(async move { pool.run_worker().await });
        }
    }

    async fn run_worker(&self) {
        let mut routes = self.routes.clone();
        loop {
            // Gate first: while both processors are down the worker parks
            // here instead of pulling work it cannot deliver.
            routes.ready().await;

            let Some(request) = self.queue.dequeue().await else {
                // Queue closed, shutdown in progress.
                return;
            };
            self.attempt(&routes, request).await;

            if !self.attempt_delay.is_zero() {
                tokio::time::sleep(self.attempt_delay).await;
            }
        }
    }

    /// One delivery attempt. `requested_at` is stamped here, after the
    /// concurrency permit is held, so every retry carries a fresh
    /// timestamp.
    async fn attempt(&self, routes: &RouteWatch, request: PaymentRequest) {
        let Ok(permit) = self.concurrency.clone().acquire_owned().await else {
            return;
        };

        let state = routes.snapshot();
        let event = PaymentEvent {
            correlation_id: request.correlation_id.clone(),
            amount: request.amount,
            requested_at: Utc::now(),
        };

        if self.client.deliver(self.processor_url(state.processor), &event).await {
            let payment = Payment {
                correlation_id: event.correlation_id,
                amount: event.amount,
                requested_at: event.requested_at,
                processor: state.processor,
            };
            // Delivery already succeeded from the payer's perspective, so
            // a store failure is logged and swallowed, not retried.
            if let Err(err) = self.store.record(payment).await {
                error!(error = %err, "failed to record confirmed payment");
            }
            drop(permit);
        } else {
            drop(permit);
            self.queue.requeue(request).await;
        }
    }

    fn processor_url(&self, processor: Processor) -> &str {
        match processor {
            Processor::Default => &self.default_url,
            Processor::Fallback => &self.fallback_url,
        }
    }
}
