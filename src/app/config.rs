use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub default_url: String,
    pub fallback_url: String,
    pub health_url: String,
    /// Peer instance to merge summaries with, when horizontally scaled.
    pub other_url: Option<String>,
    pub num_workers: usize,
    /// Latency margin (ms) the fallback must beat the default by before it
    /// is preferred. Biases routing toward the cheaper default processor.
    pub default_tolerance_ms: u64,
    /// Global cap on simultaneous outbound deliveries, across all workers.
    pub semaphore_size: usize,
    pub jobs_buffer_size: usize,
    /// Per-worker pause (ms) after every delivery attempt.
    pub worker_sleep_ms: u64,
    pub request_timeout_ms: u64,
    pub storage: String,
    pub rocksdb_path: String,
    pub database_url: String,
}

fn read_env(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: read_env("SERVER_PORT", "9999").parse().unwrap_or(9999),
            default_url: read_env("DEFAULT_URL", "http://localhost:8001"),
            fallback_url: read_env("FALLBACK_URL", "http://localhost:8002"),
            health_url: read_env("HEALTH_URL", "http://localhost:9001"),
            other_url: env::var("OTHER_URL").ok().filter(|url| !url.is_empty()),
            num_workers: read_env("NUM_WORKERS", "2000").parse().unwrap_or(2000),
            default_tolerance_ms: read_env("DEFAULT_TOLERANCE", "1500").parse().unwrap_or(1500),
            semaphore_size: read_env("SEMAPHORE_SIZE", "50").parse().unwrap_or(50),
            jobs_buffer_size: read_env("JOBS_BUFFER_SIZE", "10000").parse().unwrap_or(10000),
            worker_sleep_ms: read_env("WORKER_SLEEP", "50").parse().unwrap_or(50),
            request_timeout_ms: read_env("REQUEST_TIMEOUT_MS", "5000").parse().unwrap_or(5000),
            storage: read_env("STORAGE", "memory"),
            rocksdb_path: read_env("ROCKSDB_PATH", "/data/payments"),
            database_url: read_env("DATABASE_URL", "postgres://localhost/payments"),
        }
    }
}
