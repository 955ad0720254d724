//! Platform adapters
//!
//! The only place that knows OS command syntax and output formats. Probes ask
//! the adapter for a `CommandSpec` or `Source`, run it through a
//! `CommandRunner`, and hand the text back to the adapter for parsing.

pub mod unix;
pub mod windows;

use crate::command::{CommandSpec, Source};
use crate::models::{ActiveConnection, AdminStatus, NeighborEntry, TraceHop};
use std::collections::HashMap;
use crate::types::{OsFamily, SystemAction};
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub use unix::{LinuxPlatform, MacOsPlatform};
pub use windows::WindowsPlatform;

/// Parsed outcome of a single ping invocation
#[derive(Debug, Clone, PartialEq)]
pub enum PingReply {
    Reply { time_ms: f64, ttl: Option<u32> },
    /// The utility ran and reported no answer
    NoReply,
    /// Exit status claimed success but no round-trip time could be found
    Unparsable,
}

/// Link-layer details for one interface
#[derive(Debug, Clone, PartialEq)]
pub struct LinkInfo {
    pub name: String,
    pub mac: Option<String>,
    pub admin: AdminStatus,
}

pub trait PlatformAdapter: Send + Sync {
    fn kind(&self) -> OsFamily;

    /// A single echo request with the given reply timeout
    fn ping_command(&self, host: &str, timeout: Duration) -> CommandSpec;

    fn parse_ping_reply(&self, exit_code: Option<i32>, output: &str) -> PingReply {
        parse_ping_output(exit_code, output)
    }

    fn trace_command(&self, target: &str, max_hops: u32, wait: Duration) -> CommandSpec;

    /// Parse one line of traceroute output; header and noise lines yield `None`
    fn parse_trace_line(&self, line: &str) -> Option<TraceHop>;

    fn hostname_source(&self) -> Source;

    fn gateway_source(&self) -> Source;

    fn parse_gateways(&self, text: &str) -> Vec<String>;

    fn dns_source(&self) -> Source;

    fn parse_dns_servers(&self, text: &str) -> Vec<String>;

    fn link_source(&self) -> Source;

    fn parse_links(&self, text: &str) -> Vec<LinkInfo>;

    fn arp_source(&self) -> Source;

    fn parse_neighbors(&self, text: &str) -> Vec<NeighborEntry>;

    /// Socket listing that includes owning processes where the OS allows it
    fn connections_command(&self) -> CommandSpec;

    /// Established connections only
    fn parse_connections(&self, text: &str) -> Vec<ActiveConnection>;

    /// Process listing used to name connection owners the socket listing leaves bare
    fn process_names_command(&self) -> Option<CommandSpec> {
        None
    }

    fn parse_process_names(&self, _text: &str) -> HashMap<u32, String> {
        HashMap::new()
    }

    /// Remote NetBIOS name table query, `None` where there is no `nbtstat`
    fn netbios_command(&self, _ip: &str) -> Option<CommandSpec> {
        None
    }

    /// Map a maintenance action to a command, `None` when unsupported here
    fn action_command(&self, action: SystemAction, adapter: Option<&str>) -> Option<CommandSpec>;
}

/// Adapter for the platform this binary was built for
pub fn current() -> Arc<dyn PlatformAdapter> {
    for_family(host_family())
}

pub fn for_family(family: OsFamily) -> Arc<dyn PlatformAdapter> {
    match family {
        OsFamily::Windows => Arc::new(WindowsPlatform),
        OsFamily::Linux => Arc::new(LinuxPlatform),
        OsFamily::MacOs => Arc::new(MacOsPlatform),
    }
}

pub fn host_family() -> OsFamily {
    match env!("NDT_TARGET_FAMILY") {
        "windows" => OsFamily::Windows,
        "macos" => OsFamily::MacOs,
        _ => OsFamily::Linux,
    }
}

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)time\s*([=<])\s*([0-9]+(?:\.[0-9]+)?)\s*ms").expect("valid time regex")
    })
}

fn ttl_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)ttl\s*=\s*([0-9]+)").expect("valid ttl regex"))
}

fn ipv4_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").expect("valid ipv4 regex"))
}

/// Shared ping reply parser; Windows and Unix utilities both print `time=` and `ttl=`
pub fn parse_ping_output(exit_code: Option<i32>, output: &str) -> PingReply {
    if exit_code != Some(0) {
        return PingReply::NoReply;
    }

    let Some(caps) = time_regex().captures(output) else {
        return PingReply::Unparsable;
    };

    let Ok(value) = caps[2].parse::<f64>() else {
        return PingReply::Unparsable;
    };

    // "time<1ms" is reported as half a millisecond
    let time_ms = if &caps[1] == "<" { value / 2.0 } else { value };
    let ttl = ttl_regex()
        .captures(output)
        .and_then(|c| c[1].parse::<u32>().ok());

    PingReply::Reply { time_ms, ttl }
}

/// Every IPv4 address literal found in a line
pub(crate) fn ipv4_literals(line: &str) -> Vec<Ipv4Addr> {
    ipv4_regex()
        .find_iter(line)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Append while keeping first-seen order
pub(crate) fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Lower-case, colon separated form of a hardware address
pub(crate) fn normalize_mac(raw: &str) -> Option<String> {
    let mac = raw.trim().replace('-', ":").to_ascii_lowercase();
    let octets: Vec<&str> = mac.split(':').collect();
    let valid = octets.len() == 6
        && octets
            .iter()
            .all(|o| !o.is_empty() && o.len() <= 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return None;
    }
    Some(
        octets
            .iter()
            .map(|o| format!("{:0>2}", o))
            .collect::<Vec<_>>()
            .join(":"),
    )
}
