pub mod job_queue;

pub use job_queue::{JobQueue, QueueFull};
