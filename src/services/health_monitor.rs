use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::models::health::ServiceHealth;
use crate::services::processor_client::ProcessorApi;
use crate::services::routing::{select_processor, RouteState};

const PROBE_RETRY_DELAY: Duration = Duration::from_millis(500);
const CHECK_MARGIN: Duration = Duration::from_millis(50);

/// Single background loop that re-selects the active processor from each
/// health probe and drives the suspend gate. Sole writer of the routing
/// snapshot.
pub struct HealthMonitor {
    client: Arc<dyn ProcessorApi>,
    route_tx: watch::Sender<RouteState>,
    tolerance_ms: u64,
}

impl HealthMonitor {
    pub fn new(
        client: Arc<dyn ProcessorApi>,
        route_tx: watch::Sender<RouteState>,
        tolerance_ms: u64,
    ) -> Self {
        Self {
            client,
            route_tx,
            tolerance_ms,
        }
    }

    pub async fn run(self) {
        loop {
            let health = match self.client.probe().await {
                Ok(health) => health,
                Err(err) => {
                    // Keep the previous routing decision in effect; an
                    // unreachable health endpoint says nothing about the
                    // processors themselves.
                    warn!(error = %err, "health probe failed, retrying");
                    tokio::time::sleep(PROBE_RETRY_DELAY).await;
                    continue;
                }
            };

            self.apply(&health);

            tokio::time::sleep(Duration::from_millis(health.next_check_ms) + CHECK_MARGIN).await;
        }
    }

    /// Computes and publishes the next routing snapshot. When neither
    /// processor is healthy the previous selection is kept and dispatch is
    /// suspended; the first healthy probe afterwards releases every blocked
    /// worker in one publish.
    fn apply(&self, health: &ServiceHealth) {
        let prev = *self.route_tx.borrow();
        let next = match select_processor(health, self.tolerance_ms) {
            Some(processor) => RouteState {
                processor,
                suspended: false,
            },
            None => RouteState {
                processor: prev.processor,
                suspended: true,
            },
        };

        if next == prev {
            return;
        }
        if next.suspended {
            info!("both processors unhealthy, suspending dispatch");
        } else if prev.suspended {
            info!(processor = next.processor.as_str(), "processor recovered, resuming dispatch");
        } else {
            info!(
                from = prev.processor.as_str(),
                to = next.processor.as_str(),
                "switching active processor"
            );
        }
        self.route_tx.send_replace(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::Processor;
    use crate::services::processor_client::ClientError;
    use crate::services::routing::route_watch;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn health(default_healthy: bool, fallback_healthy: bool) -> ServiceHealth {
        ServiceHealth {
            default_healthy,
            fallback_healthy,
            default_min_response_ms: 100,
            fallback_min_response_ms: 100,
            next_check_ms: 1000,
        }
    }

    struct ScriptedProbe {
        script: Mutex<VecDeque<Result<ServiceHealth, ()>>>,
        fallthrough: ServiceHealth,
    }

    #[async_trait]
    impl ProcessorApi for ScriptedProbe {
        async fn deliver(&self, _url: &str, _event: &crate::models::payment::PaymentEvent) -> bool {
            unreachable!("monitor never delivers payments")
        }

        async fn probe(&self) -> Result<ServiceHealth, ClientError> {
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(health)) => Ok(health),
                Some(Err(())) => {
                    Err(ClientError::UnexpectedStatus(StatusCode::SERVICE_UNAVAILABLE))
                }
                None => Ok(self.fallthrough),
            }
        }
    }

    fn monitor_with(
        script: Vec<Result<ServiceHealth, ()>>,
        fallthrough: ServiceHealth,
        route_tx: watch::Sender<RouteState>,
    ) -> HealthMonitor {
        HealthMonitor::new(
            Arc::new(ScriptedProbe {
                script: Mutex::new(script.into()),
                fallthrough,
            }),
            route_tx,
            1000,
        )
    }

    #[test]
    fn both_unhealthy_keeps_selection_and_suspends() {
        let (tx, watch) = route_watch();
        tx.send_replace(RouteState {
            processor: Processor::Fallback,
            suspended: false,
        });
        let monitor = monitor_with(vec![], health(true, true), tx);

        monitor.apply(&health(false, false));
        let state = watch.snapshot();
        assert!(state.suspended);
        assert_eq!(state.processor, Processor::Fallback);
    }

    #[test]
    fn recovery_clears_suspension() {
        let (tx, watch) = route_watch();
        let monitor = monitor_with(vec![], health(true, true), tx);

        monitor.apply(&health(false, false));
        assert!(watch.snapshot().suspended);

        monitor.apply(&health(false, true));
        let state = watch.snapshot();
        assert!(!state.suspended);
        assert_eq!(state.processor, Processor::Fallback);
    }

    #[test]
    fn tie_break_applies_the_configured_tolerance() {
        let (tx, watch) = route_watch();
        let monitor = monitor_with(vec![], health(true, true), tx);

        monitor.apply(&ServiceHealth {
            default_healthy: true,
            fallback_healthy: true,
            default_min_response_ms: 2000,
            fallback_min_response_ms: 100,
            next_check_ms: 1000,
        });
        assert_eq!(watch.snapshot().processor, Processor::Fallback);

        monitor.apply(&ServiceHealth {
            default_healthy: true,
            fallback_healthy: true,
            default_min_response_ms: 100,
            fallback_min_response_ms: 50,
            next_check_ms: 1000,
        });
        assert_eq!(watch.snapshot().processor, Processor::Default);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_failure_keeps_previous_decision_until_a_probe_lands() {
        let (tx, watch) = route_watch();
        let monitor = monitor_with(
            vec![
                Ok(ServiceHealth {
                    default_healthy: true,
                    fallback_healthy: true,
                    default_min_response_ms: 2000,
                    fallback_min_response_ms: 100,
                    next_check_ms: 100,
                }),
                Err(()),
                Err(()),
            ],
            health(true, false),
            tx,
        );
        let task = tokio::spawn(monitor.run());

        // First probe routes to the fallback; the two failed probes that
        // follow must not disturb that decision.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(watch.snapshot().processor, Processor::Fallback);
        assert!(!watch.snapshot().suspended);

        // Once probes land again the monitor converges on the new health.
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(watch.snapshot().processor, Processor::Default);

        task.abort();
    }
}
