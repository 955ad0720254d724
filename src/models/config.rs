//! Configuration data model and validation

use crate::error::{AppError, Result};
use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of echo requests per ping run
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    /// Per-attempt ping timeout
    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_seconds: u64,

    /// Per-port TCP connect timeout
    #[serde(default = "default_scan_timeout_ms")]
    pub scan_timeout_ms: u64,

    /// Maximum hops for traceroute
    #[serde(default = "default_trace_max_hops")]
    pub trace_max_hops: u32,

    /// Per-probe wait passed to traceroute
    #[serde(default = "default_trace_wait_secs")]
    pub trace_wait_seconds: u64,

    /// Speed test server base URLs
    #[serde(default = "default_speedtest_servers")]
    pub speedtest_servers: Vec<String>,

    /// Number of download/upload chunks per speed test phase
    #[serde(default = "default_speedtest_chunks")]
    pub speedtest_chunks: u32,

    /// Size of each speed test chunk in bytes
    #[serde(default = "default_speedtest_chunk_bytes")]
    pub speedtest_chunk_bytes: u64,

    /// TCP endpoint used by the internet connectivity check
    #[serde(default = "default_internet_check_addr")]
    pub internet_check_addr: String,

    /// HTTP endpoint used by the internet connectivity check
    #[serde(default = "default_internet_check_url")]
    pub internet_check_url: String,

    /// Hostname resolved by the DNS check
    #[serde(default = "default_dns_check_hostname")]
    pub dns_check_hostname: String,

    /// Known-good external host pinged by diagnosis and troubleshooting
    #[serde(default = "default_external_host")]
    pub external_host: String,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Format of diagnostic log lines on stderr
    #[serde(default)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ping_count: default_ping_count(),
            ping_timeout_seconds: default_ping_timeout_secs(),
            scan_timeout_ms: default_scan_timeout_ms(),
            trace_max_hops: default_trace_max_hops(),
            trace_wait_seconds: default_trace_wait_secs(),
            speedtest_servers: default_speedtest_servers(),
            speedtest_chunks: default_speedtest_chunks(),
            speedtest_chunk_bytes: default_speedtest_chunk_bytes(),
            internet_check_addr: default_internet_check_addr(),
            internet_check_url: default_internet_check_url(),
            dns_check_hostname: default_dns_check_hostname(),
            external_host: default_external_host(),
            enable_color: default_enable_color(),
            log_format: LogFormat::default(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_seconds)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    pub fn trace_wait(&self) -> Duration {
        Duration::from_secs(self.trace_wait_seconds)
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.ping_count == 0 || self.ping_count > 100 {
            return Err(AppError::config("Ping count must be between 1 and 100"));
        }

        if self.ping_timeout_seconds == 0 || self.ping_timeout_seconds > 60 {
            return Err(AppError::config("Ping timeout must be between 1 and 60 seconds"));
        }

        if self.scan_timeout_ms < 10 || self.scan_timeout_ms > 60_000 {
            return Err(AppError::config("Scan timeout must be between 10 and 60000 milliseconds"));
        }

        if self.trace_max_hops == 0 || self.trace_max_hops > 64 {
            return Err(AppError::config("Trace max hops must be between 1 and 64"));
        }

        if self.trace_wait_seconds == 0 || self.trace_wait_seconds > 30 {
            return Err(AppError::config("Trace wait must be between 1 and 30 seconds"));
        }

        if self.speedtest_servers.is_empty() {
            return Err(AppError::config("At least one speed test server is required"));
        }

        for server in &self.speedtest_servers {
            let parsed = url::Url::parse(server).map_err(|e| {
                AppError::config(format!("Invalid speed test server '{}': {}", server, e))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(AppError::config(format!(
                    "Speed test server must use http or https: {}",
                    server
                )));
            }
        }

        if self.speedtest_chunks == 0 || self.speedtest_chunks > 100 {
            return Err(AppError::config("Speed test chunk count must be between 1 and 100"));
        }

        let max_chunk = crate::defaults::MAX_SPEEDTEST_CHUNK_BYTES;
        if self.speedtest_chunk_bytes == 0 || self.speedtest_chunk_bytes > max_chunk {
            return Err(AppError::config(format!(
                "Speed test chunk size must be between 1 and {} bytes",
                max_chunk
            )));
        }

        self.internet_check_addr
            .parse::<SocketAddr>()
            .map_err(|e| {
                AppError::config(format!(
                    "Invalid internet check address '{}': {}",
                    self.internet_check_addr, e
                ))
            })?;

        url::Url::parse(&self.internet_check_url)
            .map_err(|e| {
                AppError::config(format!(
                    "Invalid internet check URL '{}': {}",
                    self.internet_check_url, e
                ))
            })?;

        if self.dns_check_hostname.trim().is_empty() {
            return Err(AppError::config("DNS check hostname cannot be empty"));
        }

        if self.external_host.trim().is_empty() {
            return Err(AppError::config("External host cannot be empty"));
        }

        Ok(())
    }

    /// Merge `NDT_*` environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        self.merge_from_lookup(|key| std::env::var(key).ok())
    }

    /// Merge values from any key lookup, using the environment variable names
    pub fn merge_from_lookup<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("NDT_PING_COUNT") {
            self.ping_count = parse_env("NDT_PING_COUNT", &value)?;
        }

        if let Some(value) = lookup("NDT_PING_TIMEOUT") {
            self.ping_timeout_seconds = parse_env("NDT_PING_TIMEOUT", &value)?;
        }

        if let Some(value) = lookup("NDT_SCAN_TIMEOUT_MS") {
            self.scan_timeout_ms = parse_env("NDT_SCAN_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = lookup("NDT_TRACE_MAX_HOPS") {
            self.trace_max_hops = parse_env("NDT_TRACE_MAX_HOPS", &value)?;
        }

        if let Some(value) = lookup("NDT_TRACE_WAIT") {
            self.trace_wait_seconds = parse_env("NDT_TRACE_WAIT", &value)?;
        }

        if let Some(value) = lookup("NDT_SPEEDTEST_SERVERS") {
            self.speedtest_servers = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(value) = lookup("NDT_SPEEDTEST_CHUNKS") {
            self.speedtest_chunks = parse_env("NDT_SPEEDTEST_CHUNKS", &value)?;
        }

        if let Some(value) = lookup("NDT_SPEEDTEST_CHUNK_BYTES") {
            self.speedtest_chunk_bytes = parse_env("NDT_SPEEDTEST_CHUNK_BYTES", &value)?;
        }

        if let Some(value) = lookup("NDT_INTERNET_CHECK_ADDR") {
            self.internet_check_addr = value.trim().to_string();
        }

        if let Some(value) = lookup("NDT_INTERNET_CHECK_URL") {
            self.internet_check_url = value.trim().to_string();
        }

        if let Some(value) = lookup("NDT_DNS_CHECK_HOST") {
            self.dns_check_hostname = value.trim().to_string();
        }

        if let Some(value) = lookup("NDT_EXTERNAL_HOST") {
            self.external_host = value.trim().to_string();
        }

        if let Some(value) = lookup("NDT_ENABLE_COLOR") {
            self.enable_color = parse_env("NDT_ENABLE_COLOR", &value)?;
        }

        if let Some(value) = lookup("NDT_LOG_FORMAT") {
            self.log_format = parse_env("NDT_LOG_FORMAT", &value)?;
        }

        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

// Default value functions for serde
fn default_ping_count() -> u32 {
    crate::defaults::DEFAULT_PING_COUNT
}

fn default_ping_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_PING_TIMEOUT.as_secs()
}

fn default_scan_timeout_ms() -> u64 {
    crate::defaults::DEFAULT_SCAN_TIMEOUT_MS
}

fn default_trace_max_hops() -> u32 {
    crate::defaults::DEFAULT_TRACE_MAX_HOPS
}

fn default_trace_wait_secs() -> u64 {
    crate::defaults::DEFAULT_TRACE_WAIT_SECS
}

fn default_speedtest_servers() -> Vec<String> {
    crate::defaults::DEFAULT_SPEEDTEST_SERVERS
        .iter()
        .map(|&s| s.to_string())
        .collect()
}

fn default_speedtest_chunks() -> u32 {
    crate::defaults::DEFAULT_SPEEDTEST_CHUNKS
}

fn default_speedtest_chunk_bytes() -> u64 {
    crate::defaults::DEFAULT_SPEEDTEST_CHUNK_BYTES
}

fn default_internet_check_addr() -> String {
    crate::defaults::INTERNET_CHECK_ADDR.to_string()
}

fn default_internet_check_url() -> String {
    crate::defaults::INTERNET_CHECK_URL.to_string()
}

fn default_dns_check_hostname() -> String {
    crate::defaults::DNS_CHECK_HOSTNAME.to_string()
}

fn default_external_host() -> String {
    crate::defaults::EXTERNAL_HOST.to_string()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
