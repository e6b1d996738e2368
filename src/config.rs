//! Server configuration, read from the command line and environment.

use clap::Parser;
use std::time::Duration;

/// respkv - a minimal in-memory key-value server speaking RESP
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "respkv", version, about)]
pub struct Config {
    /// Host to bind to
    #[arg(long, env = "RESPKV_HOST", default_value = crate::DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "RESPKV_PORT", default_value_t = crate::DEFAULT_PORT)]
    pub port: u16,

    /// Run a background sweep for expired keys every N milliseconds.
    /// Without it, expired keys are only dropped when read.
    #[arg(long, env = "RESPKV_SWEEP_INTERVAL_MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_interval_ms: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "RESPKV_LOG", default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            sweep_interval_ms: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Interval for the expiry sweeper, if it is enabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["respkv"]).unwrap();
        assert_eq!(config.port, 6379);
        assert_eq!(config.bind_address(), "127.0.0.1:6379");
        assert_eq!(config.sweep_interval(), None);
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "respkv",
            "--host",
            "0.0.0.0",
            "-p",
            "6380",
            "--sweep-interval-ms",
            "250",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:6380");
        assert_eq!(config.sweep_interval(), Some(Duration::from_millis(250)));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::try_parse_from(["respkv", "--port", "not-a-port"]).is_err());
        assert!(Config::try_parse_from(["respkv", "--sweep-interval-ms", "0"]).is_err());
    }
}
