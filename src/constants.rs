/// Default values and environment variable names shared by both services.

// Local development defaults
pub const DEFAULT_GATEWAY_PORT: u16 = 50000;
pub const DEFAULT_PUBLISHER_PORT: u16 = 50001;
pub const DEFAULT_CACHE_URI: &str = "http://localhost:50007/";
pub const DEFAULT_PUBLISHER_URI: &str = "http://localhost:50001";
pub const DEFAULT_PROBE_URI: &str = "https://www.google.com";
pub const DEFAULT_API_KEY: &str = "123456";
pub const DEFAULT_BROKER: &str = "localhost:9092";
pub const DEFAULT_TOPIC: &str = "relay-topic";
pub const DEFAULT_LOG_DIR: &str = "data/log";
pub const DEFAULT_LOGS_DIR: &str = "logs";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

// Environment overrides
pub const ENV_CONFIG: &str = "RELAY_CONFIG";
pub const ENV_GATEWAY_PORT: &str = "RELAY_GATEWAY_PORT";
pub const ENV_PUBLISHER_PORT: &str = "RELAY_PUBLISHER_PORT";
pub const ENV_CACHE_URI: &str = "RELAY_CACHE_URI";
pub const ENV_PUBLISHER_URI: &str = "RELAY_PUBLISHER_URI";
pub const ENV_PROBE_URI: &str = "RELAY_PROBE_URI";
pub const ENV_API_KEY: &str = "RELAY_API_KEY";
pub const ENV_LOG_BACKEND: &str = "RELAY_LOG_BACKEND";
pub const ENV_BROKERS: &str = "RELAY_BROKERS";
pub const ENV_TOPIC: &str = "RELAY_TOPIC";
pub const ENV_LOG_DIR: &str = "RELAY_LOG_DIR";
pub const ENV_LOGS_DIR: &str = "RELAY_LOGS_DIR";

/// Authorization scheme expected in front of the key: `Authorization: Apikey <key>`.
pub const APIKEY_SCHEME: &str = "Apikey";

// Service names (log file names and health output)
pub const GATEWAY_SERVICE: &str = "http-svc";
pub const PUBLISHER_SERVICE: &str = "http-sec-svc";
