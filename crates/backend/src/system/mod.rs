pub mod jobs;
pub mod middleware;
pub mod tracing;
