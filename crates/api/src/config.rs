//! Service configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use projections::RetryPolicy;

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Configuration shared by the three services.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `EVENTSTORE_PORT`: event store listen port (default: `50100`)
/// - `ACCOUNT_COMMAND_EVENT_PORT`: command service event ingress (default: `50101`)
/// - `ACCOUNT_COMMAND_API_PORT`: command service API (default: `7000`)
/// - `ACCOUNT_QUERY_EVENT_PORT`: query service event ingress (default: `50102`)
/// - `ACCOUNT_QUERY_API_PORT`: query service API (default: `7001`)
/// - `EVENTSTORE_URL`: where subscribers publish and fetch history
///   (default: `"http://localhost:50100"`)
/// - `SUBSCRIBER_URLS`: comma-separated broadcast targets
///   (default: both local `/event` endpoints)
/// - `REQUEST_TIMEOUT_MS`: outbound HTTP timeout (default: `5000`)
/// - `BOOTSTRAP_MAX_ATTEMPTS`: history fetch attempts (default: `20`)
/// - `BOOTSTRAP_BACKOFF_MS`: wait between fetch attempts (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub eventstore_port: u16,
    pub command_event_port: u16,
    pub command_api_port: u16,
    pub query_event_port: u16,
    pub query_api_port: u16,
    pub eventstore_url: String,
    pub subscriber_urls: Vec<String>,
    pub request_timeout: Duration,
    pub bootstrap_max_attempts: u32,
    pub bootstrap_backoff: Duration,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// Unparseable values fall back to the default as well.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            eventstore_port: env_or("EVENTSTORE_PORT", defaults.eventstore_port),
            command_event_port: env_or("ACCOUNT_COMMAND_EVENT_PORT", defaults.command_event_port),
            command_api_port: env_or("ACCOUNT_COMMAND_API_PORT", defaults.command_api_port),
            query_event_port: env_or("ACCOUNT_QUERY_EVENT_PORT", defaults.query_event_port),
            query_api_port: env_or("ACCOUNT_QUERY_API_PORT", defaults.query_api_port),
            eventstore_url: std::env::var("EVENTSTORE_URL").unwrap_or(defaults.eventstore_url),
            subscriber_urls: std::env::var("SUBSCRIBER_URLS")
                .map(|raw| parse_list(&raw))
                .unwrap_or(defaults.subscriber_urls),
            request_timeout: Duration::from_millis(env_or(
                "REQUEST_TIMEOUT_MS",
                defaults.request_timeout.as_millis() as u64,
            )),
            bootstrap_max_attempts: env_or(
                "BOOTSTRAP_MAX_ATTEMPTS",
                defaults.bootstrap_max_attempts,
            ),
            bootstrap_backoff: Duration::from_millis(env_or(
                "BOOTSTRAP_BACKOFF_MS",
                defaults.bootstrap_backoff.as_millis() as u64,
            )),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: env_or("LOG_FORMAT", defaults.log_format),
        }
    }

    /// Returns the `"host:port"` bind address string for a port.
    pub fn addr(&self, port: u16) -> String {
        format!("{}:{}", self.host, port)
    }

    pub fn eventstore_addr(&self) -> String {
        self.addr(self.eventstore_port)
    }

    pub fn command_event_addr(&self) -> String {
        self.addr(self.command_event_port)
    }

    pub fn command_api_addr(&self) -> String {
        self.addr(self.command_api_port)
    }

    pub fn query_event_addr(&self) -> String {
        self.addr(self.query_event_port)
    }

    pub fn query_api_addr(&self) -> String {
        self.addr(self.query_api_port)
    }

    /// Retry policy for the bootstrap history fetch.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.bootstrap_max_attempts, self.bootstrap_backoff)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            eventstore_port: 50100,
            command_event_port: 50101,
            command_api_port: 7000,
            query_event_port: 50102,
            query_api_port: 7001,
            eventstore_url: "http://localhost:50100".to_string(),
            subscriber_urls: vec![
                "http://localhost:50101/event".to_string(),
                "http://localhost:50102/event".to_string(),
            ],
            request_timeout: Duration::from_millis(5000),
            bootstrap_max_attempts: projections::replay::DEFAULT_MAX_ATTEMPTS,
            bootstrap_backoff: projections::replay::DEFAULT_BACKOFF,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.eventstore_port, 50100);
        assert_eq!(config.command_event_port, 50101);
        assert_eq!(config.command_api_port, 7000);
        assert_eq!(config.query_event_port, 50102);
        assert_eq!(config.query_api_port, 7001);
        assert_eq!(config.eventstore_url, "http://localhost:50100");
        assert_eq!(config.subscriber_urls.len(), 2);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.bootstrap_max_attempts, 20);
        assert_eq!(config.bootstrap_backoff, Duration::from_secs(3));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            ..Config::default()
        };
        assert_eq!(config.eventstore_addr(), "127.0.0.1:50100");
        assert_eq!(config.command_api_addr(), "127.0.0.1:7000");
        assert_eq!(config.query_event_addr(), "127.0.0.1:50102");
    }

    #[test]
    fn test_retry_policy() {
        let config = Config {
            bootstrap_max_attempts: 3,
            bootstrap_backoff: Duration::from_millis(10),
            ..Config::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_millis(10));
    }

    #[test]
    fn test_parse_list_skips_blanks() {
        assert_eq!(
            parse_list(" http://a/event, ,http://b/event,"),
            vec!["http://a/event", "http://b/event"]
        );
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
