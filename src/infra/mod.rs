pub mod auth;
pub mod file_log;
pub mod http_client;
pub mod interval_fetcher;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory_log;
