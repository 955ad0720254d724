//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::{supports_color, Cli, Command},
    config::env::EnvManager,
    error::Result,
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    ///
    /// Layers, lowest first: defaults, settings file, `NDT_*` variables,
    /// command-line flags.
    pub fn parse(&self) -> Result<Config> {
        EnvManager::load_env_file(self.cli.env_file.as_deref())?;
        self.parse_with(|key| std::env::var(key).ok())
    }

    /// Same as `parse`, reading variables from `lookup` and skipping the settings file
    pub fn parse_with<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        config.merge_from_lookup(lookup)?;
        self.apply_cli_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        if self.cli.no_color || self.cli.json {
            config.enable_color = false;
        } else if self.cli.color {
            config.enable_color = true;
        } else if !supports_color() {
            config.enable_color = false;
        }

        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;

        match &self.cli.command {
            Command::Ping { count, timeout, .. } => {
                if let Some(count) = count {
                    config.ping_count = *count;
                }
                if let Some(timeout) = timeout {
                    config.ping_timeout_seconds = *timeout;
                }
            }
            Command::Scan { timeout_ms: Some(timeout_ms), .. } => {
                config.scan_timeout_ms = *timeout_ms;
            }
            Command::Trace { max_hops, wait, .. } => {
                if let Some(max_hops) = max_hops {
                    config.trace_max_hops = *max_hops;
                }
                if let Some(wait) = wait {
                    config.trace_wait_seconds = *wait;
                }
            }
            Command::Speedtest { servers } if !servers.is_empty() => {
                config.speedtest_servers = servers.clone();
            }
            _ => {}
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let summary = [
        format!("Ping Count: {}", config.ping_count),
        format!("Ping Timeout: {}s", config.ping_timeout_seconds),
        format!("Scan Timeout: {}ms", config.scan_timeout_ms),
        format!("Trace Max Hops: {}", config.trace_max_hops),
        format!("Trace Wait: {}s", config.trace_wait_seconds),
        format!("Speed Test Servers: {}", config.speedtest_servers.join(", ")),
        format!(
            "Speed Test Chunks: {} x {} bytes",
            config.speedtest_chunks, config.speedtest_chunk_bytes
        ),
        format!(
            "Internet Check: {} / {}",
            config.internet_check_addr, config.internet_check_url
        ),
        format!("DNS Check Host: {}", config.dns_check_hostname),
        format!("External Host: {}", config.external_host),
        format!("Color Output: {}", config.enable_color),
        format!("Log Format: {}", config.log_format.as_str()),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ];

    summary.join("\n")
}
