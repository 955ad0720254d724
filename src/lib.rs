//! Network Diagnostics Toolkit
//!
//! Inspects local network configuration, tests reachability with ping and
//! traceroute, probes TCP ports, measures throughput and folds the results
//! into a structured health diagnosis.

pub mod actions;
pub mod app;
pub mod cli;
pub mod command;
pub mod config;
pub mod connections;
pub mod detector;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod neighbors;
pub mod output;
pub mod ping;
pub mod platform;
pub mod probe;
pub mod progress;
pub mod scanner;
pub mod speedtest;
pub mod stats;
pub mod trace;
pub mod troubleshooter;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{
    Config, ConnectionCheck, ConnectionStatus, DetectionOutcome, Diagnosis, HealthStatus,
    Interface, Issue, IssueType, NetworkSnapshot, PingResult, PortResult, PortStatus, Severity,
    SpeedTestResult, TraceHop,
};
pub use detector::NetworkDetector;
pub use ping::PingTester;
pub use scanner::{PortPreset, PortScanner, ScanSession};
pub use trace::TraceRoute;
pub use speedtest::SpeedTester;
pub use troubleshooter::Troubleshooter;
pub use output::{ColoredFormatter, OutputFormatter, OutputFormatterFactory, PlainFormatter};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_PING_COUNT: u32 = 4;
    pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(2);
    pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 1000;
    pub const DEFAULT_TRACE_MAX_HOPS: u32 = 30;
    pub const DEFAULT_TRACE_WAIT_SECS: u64 = 1;

    pub const INTERNET_CHECK_ADDR: &str = "8.8.8.8:53";
    pub const INTERNET_CHECK_URL: &str = "http://www.google.com";
    pub const INTERNET_CHECK_TIMEOUT: Duration = Duration::from_secs(2);
    pub const GATEWAY_PING_TIMEOUT: Duration = Duration::from_secs(3);
    pub const DNS_CHECK_HOSTNAME: &str = "google.com";
    pub const EXTERNAL_HOST: &str = "8.8.8.8";

    pub const TROUBLESHOOT_PING_COUNT: u32 = 2;
    pub const TROUBLESHOOT_TRACE_MAX_HOPS: u32 = 15;

    pub const DEFAULT_SPEEDTEST_SERVERS: &[&str] = &["https://speed.cloudflare.com"];
    pub const DEFAULT_SPEEDTEST_CHUNKS: u32 = 10;
    pub const DEFAULT_SPEEDTEST_CHUNK_BYTES: u64 = 2_500_000;
    /// Upload chunks are allocated whole
    pub const MAX_SPEEDTEST_CHUNK_BYTES: u64 = 100_000_000;
    pub const DEFAULT_SPEEDTEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_ENABLE_COLOR: bool = true;
}
