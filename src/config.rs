use crate::constants;
use crate::error::{RelayError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Process configuration, built once in `main` and handed to each component.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub publisher: PublisherConfig,
    pub log: LogConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub port: u16,
    pub cache_uri: String,
    pub publisher_uri: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_sec: u32,
    pub burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    pub port: u16,
    pub api_key: String,
    pub probe_uri: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogBackend {
    File,
    Kafka,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub backend: LogBackend,
    pub brokers: Vec<String>,
    pub topic: String,
    pub dir: PathBuf,
    pub partition: i32,
    pub queue_capacity: usize,
    pub error_buffer: usize,
    pub submit_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: constants::DEFAULT_GATEWAY_PORT,
            cache_uri: constants::DEFAULT_CACHE_URI.to_string(),
            publisher_uri: constants::DEFAULT_PUBLISHER_URI.to_string(),
            api_key: constants::DEFAULT_API_KEY.to_string(),
            timeout_secs: constants::DEFAULT_TIMEOUT_SECS,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_sec: 50,
            burst: 50,
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            port: constants::DEFAULT_PUBLISHER_PORT,
            api_key: constants::DEFAULT_API_KEY.to_string(),
            probe_uri: constants::DEFAULT_PROBE_URI.to_string(),
            timeout_secs: constants::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            backend: LogBackend::File,
            brokers: vec![constants::DEFAULT_BROKER.to_string()],
            topic: constants::DEFAULT_TOPIC.to_string(),
            dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
            partition: 0,
            queue_capacity: 1024,
            error_buffer: 256,
            submit_timeout_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::DEFAULT_LOGS_DIR),
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PublisherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LogConfig {
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }
}

impl Config {
    /// Read the TOML file if given, then apply `RELAY_*` overrides from the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from `lookup`. Kept separate from `load` so callers decide where values come from.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(constants::ENV_GATEWAY_PORT) {
            self.gateway.port = parse_port(constants::ENV_GATEWAY_PORT, &v)?;
        }
        if let Some(v) = lookup(constants::ENV_CACHE_URI) {
            self.gateway.cache_uri = v;
        }
        if let Some(v) = lookup(constants::ENV_PUBLISHER_URI) {
            self.gateway.publisher_uri = v;
        }
        if let Some(v) = lookup(constants::ENV_API_KEY) {
            self.gateway.api_key = v.clone();
            self.publisher.api_key = v;
        }
        if let Some(v) = lookup(constants::ENV_PUBLISHER_PORT) {
            self.publisher.port = parse_port(constants::ENV_PUBLISHER_PORT, &v)?;
        }
        if let Some(v) = lookup(constants::ENV_PROBE_URI) {
            self.publisher.probe_uri = v;
        }
        if let Some(v) = lookup(constants::ENV_LOG_BACKEND) {
            self.log.backend = match v.trim().to_ascii_lowercase().as_str() {
                "file" => LogBackend::File,
                "kafka" => LogBackend::Kafka,
                other => {
                    return Err(RelayError::Config(format!(
                        "{}: unknown log backend '{}'",
                        constants::ENV_LOG_BACKEND,
                        other
                    )))
                }
            };
        }
        if let Some(v) = lookup(constants::ENV_BROKERS) {
            self.log.brokers = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup(constants::ENV_TOPIC) {
            self.log.topic = v;
        }
        if let Some(v) = lookup(constants::ENV_LOG_DIR) {
            self.log.dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(constants::ENV_LOGS_DIR) {
            self.logging.dir = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.log.topic.trim().is_empty() {
            return Err(RelayError::Config("log.topic must not be empty".into()));
        }
        if self.log.backend == LogBackend::Kafka && self.log.brokers.is_empty() {
            return Err(RelayError::Config("log.brokers must list at least one broker".into()));
        }
        if self.log.queue_capacity == 0 || self.log.error_buffer == 0 {
            return Err(RelayError::Config(
                "log.queue_capacity and log.error_buffer must be positive".into(),
            ));
        }
        if self.gateway.timeout_secs == 0 || self.publisher.timeout_secs == 0 {
            return Err(RelayError::Config(
                "gateway.timeout_secs and publisher.timeout_secs must be positive".into(),
            ));
        }
        if self.gateway.rate_limit.requests_per_sec == 0 || self.gateway.rate_limit.burst == 0 {
            return Err(RelayError::Config("gateway.rate_limit values must be positive".into()));
        }
        Ok(())
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse()
        .map_err(|e| RelayError::Config(format!("{}: invalid port '{}': {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_local_development() {
        let config = Config::default();
        assert_eq!(config.gateway.port, 50000);
        assert_eq!(config.publisher.port, 50001);
        assert_eq!(config.gateway.cache_uri, "http://localhost:50007/");
        assert_eq!(config.gateway.publisher_uri, "http://localhost:50001");
        assert_eq!(config.log.brokers, vec!["localhost:9092".to_string()]);
        assert_eq!(config.log.topic, "relay-topic");
        assert_eq!(config.gateway.timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config
            .apply_env(lookup_from(&[
                ("RELAY_BROKERS", "k1:9092, k2:9092,"),
                ("RELAY_TOPIC", "people"),
                ("RELAY_API_KEY", "s3cret"),
                ("RELAY_PUBLISHER_URI", "http://publisher:50001"),
                ("RELAY_LOG_BACKEND", "Kafka"),
                ("RELAY_GATEWAY_PORT", "8080"),
            ]))
            .unwrap();
        assert_eq!(config.log.brokers, vec!["k1:9092", "k2:9092"]);
        assert_eq!(config.log.topic, "people");
        assert_eq!(config.gateway.api_key, "s3cret");
        assert_eq!(config.publisher.api_key, "s3cret");
        assert_eq!(config.gateway.publisher_uri, "http://publisher:50001");
        assert_eq!(config.log.backend, LogBackend::Kafka);
        assert_eq!(config.gateway.port, 8080);
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_env(lookup_from(&[("RELAY_PUBLISHER_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [log]
            topic = "people"
            backend = "kafka"
            brokers = ["a:1"]

            [gateway.rate_limit]
            burst = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.log.topic, "people");
        assert_eq!(config.log.backend, LogBackend::Kafka);
        assert_eq!(config.log.queue_capacity, 1024);
        assert_eq!(config.gateway.rate_limit.burst, 5);
        assert_eq!(config.gateway.rate_limit.requests_per_sec, 50);
        assert_eq!(config.publisher.probe_uri, "https://www.google.com");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(lookup_from(&[("RELAY_LOG_BACKEND", "memory")]))
            .unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
        assert!(toml::from_str::<Config>("[log]\nbackend = \"memory\"").is_err());
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let mut config = Config::default();
        config.gateway.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(RelayError::Config(_))));

        let mut config = Config::default();
        config.publisher.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(RelayError::Config(_))));
    }

    #[test]
    fn empty_topic_is_rejected() {
        let mut config = Config::default();
        config.log.topic = "  ".into();
        assert!(config.validate().is_err());
    }
}
