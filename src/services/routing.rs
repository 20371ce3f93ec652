use tokio::sync::watch;

use crate::models::health::ServiceHealth;
use crate::models::payment::Processor;

/// Routing snapshot published by the health monitor and read by every
/// worker. Single writer, many readers; each publish replaces the whole
/// value so readers never observe a torn state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteState {
    pub processor: Processor,
    pub suspended: bool,
}

impl RouteState {
    pub fn initial() -> Self {
        Self {
            processor: Processor::Default,
            suspended: false,
        }
    }
}

/// Chooses the processor to route to, or `None` when neither side is
/// healthy (the caller keeps its previous selection and suspends dispatch).
///
/// With both sides healthy the default wins unless the fallback is faster
/// by more than `tolerance_ms`. The margin is a business bias toward the
/// cheaper default processor, not just a latency optimization.
pub fn select_processor(health: &ServiceHealth, tolerance_ms: u64) -> Option<Processor> {
    match (health.default_healthy, health.fallback_healthy) {
        (true, true) => {
            if health.fallback_min_response_ms + tolerance_ms < health.default_min_response_ms {
                Some(Processor::Fallback)
            } else {
                Some(Processor::Default)
            }
        }
        (true, false) => Some(Processor::Default),
        (false, true) => Some(Processor::Fallback),
        (false, false) => None,
    }
}

pub fn route_watch() -> (watch::Sender<RouteState>, RouteWatch) {
    let (tx, rx) = watch::channel(RouteState::initial());
    (tx, RouteWatch { rx })
}

/// Worker-side handle on the routing snapshot. Doubles as the suspend
/// gate: `ready` parks the worker while dispatch is suspended and wakes
/// together with every other waiter when the monitor publishes a recovery.
/// The watch channel versions each publish, so there is no missed-wakeup
/// window between a resume and the next suspension.
#[derive(Clone)]
pub struct RouteWatch {
    rx: watch::Receiver<RouteState>,
}

impl RouteWatch {
    pub fn snapshot(&self) -> RouteState {
        *self.rx.borrow()
    }

    /// Blocks while dispatch is suspended, returning the first snapshot
    /// that allows deliveries again.
    pub async fn ready(&mut self) -> RouteState {
        let result = self
            .rx
            .wait_for(|state| !state.suspended)
            .await
            .map(|state| *state);
        match result {
            Ok(state) => state,
            // Monitor gone (shutdown): let the worker run with whatever
            // was published last rather than park forever.
            Err(_) => *self.rx.borrow(),
        }
    }
}
