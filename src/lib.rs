pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod rate_limiter;
pub mod server;

// Domain record and its wire formats
pub mod domain;
pub mod transcode;

// Application layer (use cases + ports) and infrastructure adapters
pub mod app;
pub mod infra;

// Fire-and-forget log publishing
pub mod publisher;
