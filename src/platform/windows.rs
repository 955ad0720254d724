//! Windows adapter: `ping`, `tracert`, `ipconfig`, `arp`, `netstat`, `nbtstat` and `netsh`

use super::{ipv4_literals, normalize_mac, push_unique, LinkInfo, PlatformAdapter};
use crate::command::{CommandSpec, Source};
use crate::models::{
    ActiveConnection, AdminStatus, HopLatency, NeighborEntry, NetbiosName, TraceHop,
};
use crate::types::{OsFamily, SystemAction};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPlatform;

/// `"   Default Gateway . . . . : 192.168.1.1"` -> `Some(("Default Gateway", "192.168.1.1"))`
fn split_label(line: &str) -> Option<(&str, &str)> {
    let (label, value) = line.split_once(" : ").or_else(|| {
        line.trim_end()
            .strip_suffix(" :")
            .map(|label| (label, ""))
    })?;
    let label = label.trim().trim_end_matches(|c| c == '.' || c == ' ');
    Some((label, value.trim()))
}

/// `    DESKTOP-4F2A   <20>  UNIQUE      Registered`
fn netbios_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\S+)\s+<([0-9A-Fa-f]{2})>\s+(UNIQUE|GROUP)\s+(\S+)")
            .expect("valid netbios name regex")
    })
}

/// Name table and adapter address from `nbtstat -A` output
pub fn parse_nbtstat(text: &str) -> (Vec<NetbiosName>, Option<String>) {
    let mut names = Vec::new();
    let mut mac = None;

    for line in text.lines() {
        if let Some(caps) = netbios_name_regex().captures(line) {
            names.push(NetbiosName {
                name: caps[1].to_string(),
                suffix: caps[2].to_ascii_uppercase(),
                kind: caps[3].to_string(),
                status: caps[4].to_string(),
            });
        } else if let Some((_, value)) = line.split_once("MAC Address =") {
            mac = normalize_mac(value);
        }
    }

    (names, mac)
}

fn is_adapter_header(line: &str) -> bool {
    !line.starts_with(char::is_whitespace)
        && line.trim_end().ends_with(':')
        && line.contains("adapter")
}

/// Addresses listed under `label`, including the indented continuation lines that follow it
fn labelled_addresses(text: &str, label_prefix: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut in_block = false;

    for line in text.lines() {
        match split_label(line) {
            Some((label, value)) => {
                in_block = label.starts_with(label_prefix);
                if in_block {
                    for ip in ipv4_literals(value) {
                        if !ip.is_unspecified() {
                            push_unique(&mut found, ip.to_string());
                        }
                    }
                }
            }
            None if in_block
                && line.starts_with(char::is_whitespace)
                && !line.trim().is_empty() =>
            {
                for ip in ipv4_literals(line) {
                    push_unique(&mut found, ip.to_string());
                }
            }
            None => in_block = false,
        }
    }

    found
}

/// One `tracert` sample column: `<1` is half a millisecond, otherwise whole milliseconds
fn tracert_sample(token: &str) -> Option<f64> {
    let value = token.strip_suffix("ms").unwrap_or(token);
    if value == "<1" {
        return Some(0.5);
    }
    value.parse::<u32>().ok().map(f64::from)
}

impl PlatformAdapter for WindowsPlatform {
    fn kind(&self) -> OsFamily {
        OsFamily::Windows
    }

    fn ping_command(&self, host: &str, timeout: Duration) -> CommandSpec {
        let wait_ms = timeout.as_millis().max(1).to_string();
        CommandSpec::new("ping", ["-n", "1", "-w", wait_ms.as_str(), host])
    }

    fn trace_command(&self, target: &str, max_hops: u32, wait: Duration) -> CommandSpec {
        let hops = max_hops.to_string();
        let wait_ms = wait.as_millis().max(1).to_string();
        CommandSpec::new("tracert", ["-d", "-h", hops.as_str(), "-w", wait_ms.as_str(), target])
    }

    fn parse_trace_line(&self, line: &str) -> Option<TraceHop> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let hop = parts.first()?.parse::<u32>().ok()?;

        if line.contains(TraceHop::TIMED_OUT) || parts.last() == Some(&"*") || parts.len() < 2 {
            return Some(TraceHop::timeout(hop));
        }

        let ip = parts[parts.len() - 1].trim_matches(|c| c == '[' || c == ']');
        let samples: Vec<f64> = parts[1..parts.len() - 1]
            .iter()
            .filter(|token| **token != "ms" && **token != "*")
            .filter_map(|token| tracert_sample(token))
            .collect();

        let latency = if samples.is_empty() {
            HopLatency::Unmeasured
        } else {
            HopLatency::Millis(samples.iter().sum::<f64>() / samples.len() as f64)
        };

        Some(TraceHop::reached(hop, ip, latency))
    }

    fn hostname_source(&self) -> Source {
        Source::Command(CommandSpec::new("hostname", Vec::<String>::new()))
    }

    fn gateway_source(&self) -> Source {
        Source::Command(CommandSpec::new("ipconfig", Vec::<String>::new()))
    }

    fn parse_gateways(&self, text: &str) -> Vec<String> {
        labelled_addresses(text, "Default Gateway")
    }

    fn dns_source(&self) -> Source {
        Source::Command(CommandSpec::new("ipconfig", ["/all"]))
    }

    fn parse_dns_servers(&self, text: &str) -> Vec<String> {
        labelled_addresses(text, "DNS Servers")
    }

    fn link_source(&self) -> Source {
        Source::Command(CommandSpec::new("ipconfig", ["/all"]))
    }

    fn parse_links(&self, text: &str) -> Vec<LinkInfo> {
        let mut links: Vec<LinkInfo> = Vec::new();

        for line in text.lines() {
            if is_adapter_header(line) {
                let header = line.trim().trim_end_matches(':');
                let name = header
                    .split_once(" adapter ")
                    .map_or(header, |(_, name)| name)
                    .trim()
                    .to_string();
                links.push(LinkInfo { name, mac: None, admin: AdminStatus::Up });
                continue;
            }

            let Some(current) = links.last_mut() else { continue };
            if let Some((label, value)) = split_label(line) {
                if label.starts_with("Physical Address") {
                    current.mac = normalize_mac(value);
                } else if label.starts_with("Media State") && value.contains("disconnected") {
                    current.admin = AdminStatus::Down;
                }
            }
        }

        links
    }

    fn arp_source(&self) -> Source {
        Source::Command(CommandSpec::new("arp", ["-a"]))
    }

    fn parse_neighbors(&self, text: &str) -> Vec<NeighborEntry> {
        let mut entries = Vec::new();
        let mut interface: Option<String> = None;

        for line in text.lines() {
            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix("Interface:") {
                interface = rest.split_whitespace().next().map(str::to_string);
                continue;
            }

            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() < 3 || ipv4_literals(parts[0]).is_empty() {
                continue;
            }
            let Some(mac) = normalize_mac(parts[1]) else { continue };

            entries.push(NeighborEntry {
                ip: parts[0].to_string(),
                mac,
                entry_type: parts[2].to_string(),
                interface: interface.clone(),
            });
        }

        entries
    }

    fn action_command(&self, action: SystemAction, adapter: Option<&str>) -> Option<CommandSpec> {
        let with_adapter = |flag: &str| {
            let mut args = vec![flag.to_string()];
            args.extend(adapter.map(str::to_string));
            CommandSpec::new("ipconfig", args)
        };

        Some(match action {
            SystemAction::Renew => with_adapter("/renew"),
            SystemAction::Release => with_adapter("/release"),
            SystemAction::FlushDns => CommandSpec::new("ipconfig", ["/flushdns"]),
            SystemAction::ResetWinsock => CommandSpec::new("netsh", ["winsock", "reset"]),
        })
    }

    fn connections_command(&self) -> CommandSpec {
        CommandSpec::new("netstat", ["-ano"])
    }

    /// `  TCP    192.168.1.20:52311     20.42.65.92:443        ESTABLISHED     4321`
    fn parse_connections(&self, text: &str) -> Vec<ActiveConnection> {
        text.lines()
            .filter_map(|line| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() != 5 || fields[3] != "ESTABLISHED" {
                    return None;
                }
                Some(ActiveConnection {
                    protocol: fields[0].to_string(),
                    local: fields[1].to_string(),
                    remote: fields[2].to_string(),
                    state: fields[3].to_string(),
                    pid: fields[4].parse().ok(),
                    process: None,
                })
            })
            .collect()
    }

    fn process_names_command(&self) -> Option<CommandSpec> {
        Some(CommandSpec::new("tasklist", ["/FO", "CSV", "/NH"]))
    }

    /// `"chrome.exe","4321","Console","1","120,000 K"`
    fn parse_process_names(&self, text: &str) -> HashMap<u32, String> {
        text.lines()
            .filter_map(|line| {
                let mut columns = line.trim().trim_matches('"').split("\",\"");
                let name = columns.next()?;
                let pid = columns.next()?.parse::<u32>().ok()?;
                Some((pid, name.to_string()))
            })
            .collect()
    }

    fn netbios_command(&self, ip: &str) -> Option<CommandSpec> {
        Some(CommandSpec::new("nbtstat", ["-A", ip]))
    }
}
