use std::sync::Arc;

use crate::queue::JobQueue;
use crate::services::PeerClient;
use crate::storage::PaymentStore;

/// Shared handles the HTTP layer needs. Cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub queue: JobQueue,
    pub store: Arc<dyn PaymentStore>,
    pub peer: Option<Arc<PeerClient>>,
}
