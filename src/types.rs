//! Small shared enums used across probes, the supervisor and the CLI

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// The kinds of long-running probe the supervisor keeps track of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Ping,
    Scan,
    Trace,
    SpeedTest,
    Detect,
    Troubleshoot,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Ping => "ping",
            ProbeKind::Scan => "scan",
            ProbeKind::Trace => "trace",
            ProbeKind::SpeedTest => "speedtest",
            ProbeKind::Detect => "detect",
            ProbeKind::Troubleshoot => "troubleshoot",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OS-level network maintenance actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SystemAction {
    /// Request a new DHCP lease
    Renew,
    /// Release the current DHCP lease
    Release,
    /// Clear the resolver cache
    FlushDns,
    /// Reset the Winsock catalog (Windows only)
    ResetWinsock,
}

impl SystemAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemAction::Renew => "renew",
            SystemAction::Release => "release",
            SystemAction::FlushDns => "flush-dns",
            SystemAction::ResetWinsock => "reset-winsock",
        }
    }

    /// Human-readable label used in action output
    pub fn label(&self) -> &'static str {
        match self {
            SystemAction::Renew => "Renew IP",
            SystemAction::Release => "Release IP",
            SystemAction::FlushDns => "Flush DNS",
            SystemAction::ResetWinsock => "Reset Winsock",
        }
    }
}

impl fmt::Display for SystemAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "renew" => Ok(SystemAction::Renew),
            "release" => Ok(SystemAction::Release),
            "flush-dns" | "flushdns" => Ok(SystemAction::FlushDns),
            "reset-winsock" | "winsock" => Ok(SystemAction::ResetWinsock),
            other => Err(AppError::validation(format!("Unknown action: {}", other))),
        }
    }
}

/// Operating system family the platform adapter targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsFamily {
    Windows,
    Linux,
    MacOs,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Windows => write!(f, "windows"),
            OsFamily::Linux => write!(f, "linux"),
            OsFamily::MacOs => write!(f, "macos"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_str() {
        assert_eq!("renew".parse::<SystemAction>().unwrap(), SystemAction::Renew);
        assert_eq!("flush_dns".parse::<SystemAction>().unwrap(), SystemAction::FlushDns);
        assert_eq!("FlushDNS".parse::<SystemAction>().unwrap(), SystemAction::FlushDns);
        assert!("reboot".parse::<SystemAction>().is_err());
    }

    #[test]
    fn test_probe_kind_display() {
        assert_eq!(ProbeKind::SpeedTest.to_string(), "speedtest");
        assert_eq!(
            serde_json::to_string(&ProbeKind::SpeedTest).unwrap(),
            "\"speed_test\""
        );
    }
}
