//! Command-line interface definitions

use crate::scanner::{parse_port_list, PortPreset};
use crate::types::SystemAction;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Network Diagnostics Toolkit - inspect, probe and troubleshoot the local network
#[derive(Parser, Debug, Clone)]
#[command(name = "ndt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Force colored output
    #[arg(long, global = true, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Read settings from this file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show hostname, interfaces, gateways, DNS servers and connectivity checks
    Status,

    /// Collect a snapshot and report detected problems
    Diagnose,

    /// Send echo requests to a host
    Ping {
        host: String,

        /// Number of echo requests
        #[arg(short, long)]
        count: Option<u32>,

        /// Per-request timeout in seconds
        #[arg(short = 'W', long, value_parser = parse_duration)]
        timeout: Option<u64>,
    },

    /// Probe TCP ports on a host
    Scan {
        host: String,

        /// Ports to scan, e.g. "22,80,8000-8010"
        #[arg(short, long, value_parser = parse_ports, conflicts_with = "preset")]
        ports: Option<PortList>,

        /// Named port preset (common, web, ftp, mail, database, remote, all)
        #[arg(long, value_parser = parse_preset)]
        preset: Option<PortPreset>,

        /// Per-port connect timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// List the available port presets
    Presets,

    /// Trace the route to a host
    Trace {
        host: String,

        /// Maximum number of hops
        #[arg(short, long)]
        max_hops: Option<u32>,

        /// Seconds to wait for each hop
        #[arg(short, long, value_parser = parse_duration)]
        wait: Option<u64>,
    },

    /// Measure latency, download and upload throughput
    Speedtest {
        /// Speed test server base URL (can be used multiple times)
        #[arg(long = "server")]
        servers: Vec<String>,
    },

    /// Run the full troubleshooting sequence and print the transcript
    Troubleshoot,

    /// Run a network maintenance action
    Action {
        #[arg(value_enum)]
        action: SystemAction,

        /// Limit the action to one network adapter
        #[arg(long)]
        adapter: Option<String>,
    },

    /// Show the ARP neighbor table
    Arp,

    /// List established TCP/UDP connections and their owning processes
    Connections,

    /// Query the NetBIOS name table of a host (Windows only)
    Netbios {
        /// IPv4 address of the host
        ip: String,
    },

    /// Show the effective configuration
    Config {
        /// Write an example settings file to PATH and exit
        #[arg(long, value_name = "PATH")]
        write_example: Option<PathBuf>,
    },
}

/// Ports given with `--ports`, already expanded and validated
#[derive(Debug, Clone, PartialEq)]
pub struct PortList(pub Vec<u32>);

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::Diagnose => "diagnose",
            Command::Ping { .. } => "ping",
            Command::Scan { .. } => "scan",
            Command::Presets => "presets",
            Command::Trace { .. } => "trace",
            Command::Speedtest { .. } => "speedtest",
            Command::Troubleshoot => "troubleshoot",
            Command::Action { .. } => "action",
            Command::Arp => "arp",
            Command::Connections => "connections",
            Command::Netbios { .. } => "netbios",
            Command::Config { .. } => "config",
        }
    }
}

impl Cli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color || self.json {
            false
        } else {
            supports_color()
        }
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 60 {
                Err("Duration cannot exceed 60 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

fn parse_ports(s: &str) -> Result<PortList, String> {
    parse_port_list(s).map(PortList).map_err(|e| e.to_string())
}

fn parse_preset(s: &str) -> Result<PortPreset, String> {
    s.parse().map_err(|e: crate::error::AppError| e.to_string())
}

/// Check if the terminal supports color output
pub fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["ndt", "status", "--json", "--verbose"]);
        assert_eq!(cli.command, Command::Status);
        assert!(cli.json);
        assert!(cli.verbose);
        assert!(!cli.use_colors());
    }

    #[test]
    fn test_ping_arguments() {
        let cli = Cli::parse_from(["ndt", "ping", "8.8.8.8", "-c", "2", "-W", "3"]);
        assert_eq!(
            cli.command,
            Command::Ping {
                host: "8.8.8.8".to_string(),
                count: Some(2),
                timeout: Some(3),
            }
        );
    }

    #[test]
    fn test_scan_port_list_and_preset() {
        let cli = Cli::parse_from(["ndt", "scan", "10.0.0.1", "--ports", "22,80-82"]);
        match cli.command {
            Command::Scan { ports, preset, .. } => {
                assert_eq!(ports, Some(PortList(vec![22, 80, 81, 82])));
                assert_eq!(preset, None);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::parse_from(["ndt", "scan", "10.0.0.1", "--preset", "Web"]);
        assert!(matches!(cli.command, Command::Scan { preset: Some(PortPreset::Web), .. }));
    }

    #[test]
    fn test_scan_rejects_bad_input() {
        assert!(Cli::try_parse_from(["ndt", "scan", "h", "--ports", "0"]).is_err());
        assert!(Cli::try_parse_from(["ndt", "scan", "h", "--preset", "games"]).is_err());
        let both = ["ndt", "scan", "h", "--ports", "80", "--preset", "web"];
        assert!(Cli::try_parse_from(both).is_err());
    }

    #[test]
    fn test_action_value_enum() {
        let cli = Cli::parse_from(["ndt", "action", "flush-dns"]);
        assert_eq!(
            cli.command,
            Command::Action {
                action: SystemAction::FlushDns,
                adapter: None,
            }
        );
        assert!(Cli::try_parse_from(["ndt", "action", "reboot"]).is_err());
    }

    #[test]
    fn test_advanced_tools() {
        let cli = Cli::parse_from(["ndt", "netbios", "192.168.1.30", "--json"]);
        assert_eq!(cli.command, Command::Netbios { ip: "192.168.1.30".to_string() });
        assert!(cli.json);
        assert!(Cli::try_parse_from(["ndt", "netbios"]).is_err());
        assert_eq!(Cli::parse_from(["ndt", "connections"]).command.name(), "connections");
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration("5"), Ok(5));
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("+5").is_err());
        assert!(parse_duration("61").is_err());
    }

    #[test]
    fn test_color_flags_conflict() {
        assert!(Cli::try_parse_from(["ndt", "arp", "--color", "--no-color"]).is_err());
        let cli = Cli::parse_from(["ndt", "arp", "--color"]);
        assert!(cli.use_colors());
    }
}
