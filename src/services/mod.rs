pub mod health_monitor;
pub mod processor_client;
pub mod routing;
pub mod worker_pool;

pub use health_monitor::HealthMonitor;
pub use processor_client::{HttpProcessorClient, PeerClient, ProcessorApi};
pub use worker_pool::WorkerPool;
