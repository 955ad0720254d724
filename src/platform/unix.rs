//! Linux and macOS adapters
//!
//! Both use the BSD-style `traceroute` and `/etc/resolv.conf`; they differ in
//! where routes, links and neighbors come from.

use super::{normalize_mac, push_unique, LinkInfo, PlatformAdapter};
use crate::command::{CommandSpec, Source};
use crate::models::{ActiveConnection, AdminStatus, HopLatency, NeighborEntry, TraceHop};
use crate::types::{OsFamily, SystemAction};
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxPlatform;

#[derive(Debug, Clone, Copy, Default)]
pub struct MacOsPlatform;

/// Whole seconds, rounded up and never below one
fn whole_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    secs.max(1)
}

fn unix_trace_command(target: &str, max_hops: u32, wait: Duration) -> CommandSpec {
    let hops = max_hops.to_string();
    let wait = whole_secs(wait).to_string();
    CommandSpec::new("traceroute", ["-n", "-m", hops.as_str(), "-w", wait.as_str(), target])
}

/// `users:(("firefox",pid=2345,fd=87))`
fn ss_process_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\(\("([^"]+)",pid=([0-9]+)"#).expect("valid ss process regex"))
}

/// `tcp ESTAB 0 0 192.168.1.20:52344 140.82.112.4:443 users:(("firefox",pid=2345,fd=87))`
fn parse_ss_line(line: &str) -> Option<ActiveConnection> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 || fields[1] != "ESTAB" {
        return None;
    }
    let protocol = match fields[0] {
        "tcp" => "TCP",
        "udp" => "UDP",
        _ => return None,
    };
    let owner = ss_process_regex().captures(line);

    Some(ActiveConnection {
        protocol: protocol.to_string(),
        local: fields[4].to_string(),
        remote: fields[5].to_string(),
        state: "ESTABLISHED".to_string(),
        pid: owner.as_ref().and_then(|c| c[2].parse().ok()),
        process: owner.map(|c| c[1].to_string()),
    })
}

/// `Safari  501 me  23u  IPv4 0x1a2b  0t0  TCP 192.168.1.20:52311->17.57.146.20:443 (ESTABLISHED)`
fn parse_lsof_line(line: &str) -> Option<ActiveConnection> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let pid = fields.get(1)?.parse::<u32>().ok()?;
    let arrow = fields.iter().position(|f| f.contains("->"))?;
    let (local, remote) = fields[arrow].split_once("->")?;
    let protocol = fields.get(arrow.checked_sub(1)?)?;
    let state = fields
        .get(arrow + 1)
        .map(|s| s.trim_matches(|c| c == '(' || c == ')'))
        .unwrap_or("ESTABLISHED");
    if state != "ESTABLISHED" {
        return None;
    }

    Some(ActiveConnection {
        protocol: protocol.to_string(),
        local: local.to_string(),
        remote: remote.to_string(),
        state: state.to_string(),
        pid: Some(pid),
        process: Some(fields[0].replace("\\x20", " ")),
    })
}

/// ` 3  10.0.0.1  9.812 ms *  10.2 ms` style lines
fn parse_unix_trace_line(line: &str) -> Option<TraceHop> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let hop = parts.first()?.parse::<u32>().ok()?;
    let rest = &parts[1..];

    if rest.is_empty() || rest.iter().all(|token| *token == "*") {
        return Some(TraceHop::timeout(hop));
    }

    let mut ip: Option<&str> = None;
    let mut samples = Vec::new();
    let mut i = 0;
    while i < rest.len() {
        let token = rest[i];
        if let Ok(value) = token.parse::<f64>() {
            if rest.get(i + 1) == Some(&"ms") {
                samples.push(value);
                i += 2;
                continue;
            }
        } else if ip.is_none() && token != "*" && token != "ms" && !token.starts_with('!') {
            ip = Some(token.trim_matches(|c| c == '(' || c == ')'));
        }
        i += 1;
    }

    let Some(ip) = ip else {
        return Some(TraceHop::timeout(hop));
    };

    let latency = if samples.is_empty() {
        HopLatency::Unmeasured
    } else {
        HopLatency::Millis(samples.iter().sum::<f64>() / samples.len() as f64)
    };

    Some(TraceHop::reached(hop, ip, latency))
}

fn parse_resolv_conf(text: &str) -> Vec<String> {
    let mut servers = Vec::new();
    for line in text.lines() {
        let mut fields = line.split_whitespace();
        if fields.next() != Some("nameserver") {
            continue;
        }
        if let Some(addr) = fields.next().and_then(|v| v.parse::<IpAddr>().ok()) {
            push_unique(&mut servers, addr.to_string());
        }
    }
    servers
}

fn resolv_conf() -> Source {
    Source::File(PathBuf::from("/etc/resolv.conf"))
}

impl PlatformAdapter for LinuxPlatform {
    fn kind(&self) -> OsFamily {
        OsFamily::Linux
    }

    fn ping_command(&self, host: &str, timeout: Duration) -> CommandSpec {
        let wait = whole_secs(timeout).to_string();
        CommandSpec::new("ping", ["-c", "1", "-W", wait.as_str(), host])
    }

    fn trace_command(&self, target: &str, max_hops: u32, wait: Duration) -> CommandSpec {
        unix_trace_command(target, max_hops, wait)
    }

    fn parse_trace_line(&self, line: &str) -> Option<TraceHop> {
        parse_unix_trace_line(line)
    }

    fn hostname_source(&self) -> Source {
        Source::File(PathBuf::from("/proc/sys/kernel/hostname"))
    }

    fn gateway_source(&self) -> Source {
        Source::File(PathBuf::from("/proc/net/route"))
    }

    /// Default routes from `/proc/net/route`; addresses are little-endian hex
    fn parse_gateways(&self, text: &str) -> Vec<String> {
        let mut gateways = Vec::new();
        for line in text.lines().skip(1) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 || fields[1] != "00000000" {
                continue;
            }
            let Ok(raw) = u32::from_str_radix(fields[2], 16) else { continue };
            let gateway = Ipv4Addr::from(raw.to_le_bytes());
            if !gateway.is_unspecified() {
                push_unique(&mut gateways, gateway.to_string());
            }
        }
        gateways
    }

    fn dns_source(&self) -> Source {
        resolv_conf()
    }

    fn parse_dns_servers(&self, text: &str) -> Vec<String> {
        parse_resolv_conf(text)
    }

    fn link_source(&self) -> Source {
        Source::Command(CommandSpec::new("ip", ["-o", "link", "show"]))
    }

    /// `2: eth0@if5: <BROADCAST,MULTICAST,UP,LOWER_UP> ... link/ether 02:42:ac:11:00:02 ...`
    fn parse_links(&self, text: &str) -> Vec<LinkInfo> {
        let mut links = Vec::new();
        for line in text.lines() {
            let mut sections = line.splitn(3, ": ");
            let (Some(_index), Some(name), Some(rest)) =
                (sections.next(), sections.next(), sections.next())
            else {
                continue;
            };

            let name = name.split('@').next().unwrap_or(name).trim().to_string();
            let admin = match rest.split_once('<').and_then(|(_, r)| r.split_once('>')) {
                Some((flags, _)) if flags.split(',').any(|f| f == "UP") => AdminStatus::Up,
                Some(_) => AdminStatus::Down,
                None => AdminStatus::Unknown,
            };
            let mac = rest
                .split_once("link/ether ")
                .and_then(|(_, r)| r.split_whitespace().next())
                .and_then(normalize_mac);

            links.push(LinkInfo { name, mac, admin });
        }
        links
    }

    fn arp_source(&self) -> Source {
        Source::File(PathBuf::from("/proc/net/arp"))
    }

    fn parse_neighbors(&self, text: &str) -> Vec<NeighborEntry> {
        let mut entries = Vec::new();
        for line in text.lines().skip(1) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 6 || fields[3] == "00:00:00:00:00:00" {
                continue;
            }
            let Some(mac) = normalize_mac(fields[3]) else { continue };
            let entry_type = match fields[2] {
                "0x6" | "0x4" => "static",
                _ => "dynamic",
            };
            entries.push(NeighborEntry {
                ip: fields[0].to_string(),
                mac,
                entry_type: entry_type.to_string(),
                interface: Some(fields[5].to_string()),
            });
        }
        entries
    }

    fn action_command(&self, action: SystemAction, adapter: Option<&str>) -> Option<CommandSpec> {
        let dhclient = |flag: &str| {
            let mut args = vec![flag.to_string()];
            args.extend(adapter.map(str::to_string));
            CommandSpec::new("dhclient", args)
        };

        match action {
            SystemAction::Renew => Some(dhclient("-v")),
            SystemAction::Release => Some(dhclient("-r")),
            SystemAction::FlushDns => Some(CommandSpec::new("resolvectl", ["flush-caches"])),
            SystemAction::ResetWinsock => None,
        }
    }

    fn connections_command(&self) -> CommandSpec {
        CommandSpec::new("ss", ["-t", "-u", "-n", "-p"])
    }

    fn parse_connections(&self, text: &str) -> Vec<ActiveConnection> {
        text.lines().filter_map(parse_ss_line).collect()
    }
}

impl PlatformAdapter for MacOsPlatform {
    fn kind(&self) -> OsFamily {
        OsFamily::MacOs
    }

    /// macOS `-W` takes milliseconds
    fn ping_command(&self, host: &str, timeout: Duration) -> CommandSpec {
        let wait_ms = timeout.as_millis().max(1).to_string();
        CommandSpec::new("ping", ["-c", "1", "-W", wait_ms.as_str(), host])
    }

    fn trace_command(&self, target: &str, max_hops: u32, wait: Duration) -> CommandSpec {
        unix_trace_command(target, max_hops, wait)
    }

    fn parse_trace_line(&self, line: &str) -> Option<TraceHop> {
        parse_unix_trace_line(line)
    }

    fn hostname_source(&self) -> Source {
        Source::Command(CommandSpec::new("hostname", Vec::<String>::new()))
    }

    fn gateway_source(&self) -> Source {
        Source::Command(CommandSpec::new("route", ["-n", "get", "default"]))
    }

    fn parse_gateways(&self, text: &str) -> Vec<String> {
        let mut gateways = Vec::new();
        for line in text.lines() {
            let Some(value) = line.trim().strip_prefix("gateway:") else { continue };
            if let Ok(ip) = value.trim().parse::<Ipv4Addr>() {
                push_unique(&mut gateways, ip.to_string());
            }
        }
        gateways
    }

    fn dns_source(&self) -> Source {
        resolv_conf()
    }

    fn parse_dns_servers(&self, text: &str) -> Vec<String> {
        parse_resolv_conf(text)
    }

    fn link_source(&self) -> Source {
        Source::Command(CommandSpec::new("ifconfig", Vec::<String>::new()))
    }

    fn parse_links(&self, text: &str) -> Vec<LinkInfo> {
        let mut links: Vec<LinkInfo> = Vec::new();
        for line in text.lines() {
            if !line.starts_with(char::is_whitespace) {
                let Some((name, rest)) = line.split_once(": ") else { continue };
                let admin = match rest.split_once('<').and_then(|(_, r)| r.split_once('>')) {
                    Some((flags, _)) if flags.split(',').any(|f| f == "UP") => AdminStatus::Up,
                    Some(_) => AdminStatus::Down,
                    None => AdminStatus::Unknown,
                };
                links.push(LinkInfo { name: name.to_string(), mac: None, admin });
            } else if let Some(current) = links.last_mut() {
                if let Some(mac) = line.trim().strip_prefix("ether ") {
                    current.mac = normalize_mac(mac.split_whitespace().next().unwrap_or(""));
                }
            }
        }
        links
    }

    fn arp_source(&self) -> Source {
        Source::Command(CommandSpec::new("arp", ["-an"]))
    }

    /// `? (192.168.1.1) at aa:bb:cc:dd:ee:ff on en0 ifscope [ethernet]`
    fn parse_neighbors(&self, text: &str) -> Vec<NeighborEntry> {
        let mut entries = Vec::new();
        for line in text.lines() {
            let Some((_, rest)) = line.split_once('(') else { continue };
            let Some((ip, rest)) = rest.split_once(')') else { continue };
            let mut fields = rest.split_whitespace();
            if fields.next() != Some("at") {
                continue;
            }
            let Some(mac) = fields.next().and_then(normalize_mac) else { continue };
            let interface = rest
                .split_once(" on ")
                .and_then(|(_, r)| r.split_whitespace().next())
                .map(str::to_string);
            let entry_type = if rest.contains("permanent") { "static" } else { "dynamic" };

            entries.push(NeighborEntry {
                ip: ip.to_string(),
                mac,
                entry_type: entry_type.to_string(),
                interface,
            });
        }
        entries
    }

    fn action_command(&self, action: SystemAction, adapter: Option<&str>) -> Option<CommandSpec> {
        let iface = adapter.unwrap_or("en0");
        match action {
            SystemAction::Renew => Some(CommandSpec::new("ipconfig", ["set", iface, "DHCP"])),
            SystemAction::Release => Some(CommandSpec::new("ipconfig", ["set", iface, "NONE"])),
            SystemAction::FlushDns => Some(CommandSpec::new("killall", ["-HUP", "mDNSResponder"])),
            SystemAction::ResetWinsock => None,
        }
    }

    fn connections_command(&self) -> CommandSpec {
        CommandSpec::new("lsof", ["-n", "-P", "-iTCP", "-sTCP:ESTABLISHED"])
    }

    fn parse_connections(&self, text: &str) -> Vec<ActiveConnection> {
        text.lines().filter_map(parse_lsof_line).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HopStatus;

    #[test]
    fn test_unix_trace_line() {
        let hop = parse_unix_trace_line(" 1  192.168.1.1  0.512 ms  0.401 ms  0.388 ms").unwrap();
        assert_eq!(hop.hop, 1);
        assert_eq!(hop.ip, "192.168.1.1");
        match hop.latency {
            Some(HopLatency::Millis(ms)) => assert!((ms - 0.4336).abs() < 0.001),
            other => panic!("unexpected latency {:?}", other),
        }
    }

    #[test]
    fn test_unix_trace_timeout_and_noise() {
        let hop = parse_unix_trace_line(" 2  * * *").unwrap();
        assert_eq!(hop.status, HopStatus::Timeout);
        assert_eq!(hop.ip, TraceHop::TIMED_OUT);

        let header = "traceroute to 8.8.8.8 (8.8.8.8), 30 hops max, 60 byte packets";
        assert!(parse_unix_trace_line(header).is_none());
    }

    #[test]
    fn test_unix_trace_partial_line() {
        let hop = parse_unix_trace_line(" 3  10.0.0.1  9.5 ms *  10.5 ms").unwrap();
        assert_eq!(hop.latency, Some(HopLatency::Millis(10.0)));

        let unmeasured = parse_unix_trace_line(" 4  10.0.0.9  * * !H").unwrap();
        assert_eq!(unmeasured.latency, Some(HopLatency::Unmeasured));
        assert_eq!(unmeasured.status, HopStatus::Ok);
    }

    #[test]
    fn test_proc_net_route() {
        let text = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
wg0\t00000000\t0100000A\t0003\t0\t0\t200\t00000000\t0\t0\t0
";
        assert_eq!(
            LinuxPlatform.parse_gateways(text),
            vec!["192.168.1.1".to_string(), "10.0.0.1".to_string()]
        );
    }

    #[test]
    fn test_route_get_default() {
        let text = "   route to: default\ndestination: default\n       mask: default\n    gateway: 192.168.1.1\n  interface: en0\n";
        assert_eq!(MacOsPlatform.parse_gateways(text), vec!["192.168.1.1".to_string()]);
    }

    #[test]
    fn test_resolv_conf() {
        let text = "# generated\nnameserver 127.0.0.53\nnameserver 8.8.8.8\nnameserver 127.0.0.53\nsearch home\n";
        assert_eq!(
            LinuxPlatform.parse_dns_servers(text),
            vec!["127.0.0.53".to_string(), "8.8.8.8".to_string()]
        );
    }

    #[test]
    fn test_ip_link_show() {
        let text = "\
1: lo: <LOOPBACK,UP,LOWER_UP> mtu 65536 qdisc noqueue state UNKNOWN mode DEFAULT group default qlen 1000\\    link/loopback 00:00:00:00:00:00 brd 00:00:00:00:00:00
2: eth0@if5: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc noqueue state UP\\    link/ether 02:42:AC:11:00:02 brd ff:ff:ff:ff:ff:ff link-netnsid 0
3: wlan0: <BROADCAST,MULTICAST> mtu 1500 qdisc noop state DOWN\\    link/ether a0:b1:c2:d3:e4:f5 brd ff:ff:ff:ff:ff:ff
";
        let links = LinuxPlatform.parse_links(text);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].mac, None);
        assert_eq!(links[1].name, "eth0");
        assert_eq!(links[1].mac.as_deref(), Some("02:42:ac:11:00:02"));
        assert_eq!(links[1].admin, AdminStatus::Up);
        assert_eq!(links[2].admin, AdminStatus::Down);
    }

    #[test]
    fn test_ifconfig() {
        let text = "\
lo0: flags=8049<UP,LOOPBACK,RUNNING,MULTICAST> mtu 16384
\tinet 127.0.0.1 netmask 0xff000000
en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500
\tether a0:b1:c2:d3:e4:f5
\tinet 192.168.1.20 netmask 0xffffff00 broadcast 192.168.1.255
";
        let links = MacOsPlatform.parse_links(text);
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].name, "en0");
        assert_eq!(links[1].mac.as_deref(), Some("a0:b1:c2:d3:e4:f5"));
    }

    #[test]
    fn test_proc_net_arp() {
        let text = "\
IP address       HW type     Flags       HW address            Mask     Device
192.168.1.1      0x1         0x2         aa:bb:cc:dd:ee:ff     *        eth0
192.168.1.7      0x1         0x0         00:00:00:00:00:00     *        eth0
";
        let entries = LinuxPlatform.parse_neighbors(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, "dynamic");
        assert_eq!(entries[0].interface.as_deref(), Some("eth0"));
    }

    #[test]
    fn test_arp_an() {
        let text = "\
? (192.168.1.1) at aa:bb:cc:dd:ee:ff on en0 ifscope [ethernet]
? (192.168.1.5) at (incomplete) on en0 ifscope [ethernet]
? (224.0.0.251) at 1:0:5e:0:0:fb on en0 ifscope permanent [ethernet]
";
        let entries = MacOsPlatform.parse_neighbors(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].interface.as_deref(), Some("en0"));
        assert_eq!(entries[1].mac, "01:00:5e:00:00:fb");
        assert_eq!(entries[1].entry_type, "static");
    }

    #[test]
    fn test_ss_connections() {
        let text = "\
Netid State  Recv-Q Send-Q Local Address:Port    Peer Address:Port Process
tcp   ESTAB  0      0      192.168.1.20:52344    140.82.112.4:443  users:((\"firefox\",pid=2345,fd=87))
tcp   LISTEN 0      128    0.0.0.0:22            0.0.0.0:*
udp   ESTAB  0      0      192.168.1.20:40000    192.168.1.1:53
tcp   ESTAB  0      0      [::1]:631             [::1]:50012
";
        let conns = LinuxPlatform.parse_connections(text);
        assert_eq!(conns.len(), 3);
        assert_eq!(conns[0].protocol, "TCP");
        assert_eq!(conns[0].remote, "140.82.112.4:443");
        assert_eq!(conns[0].pid, Some(2345));
        assert_eq!(conns[0].process.as_deref(), Some("firefox"));
        assert_eq!(conns[1].protocol, "UDP");
        assert_eq!(conns[1].pid, None);
        assert_eq!(conns[2].local, "[::1]:631");
    }

    #[test]
    fn test_lsof_connections() {
        let text = "\
COMMAND   PID USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
Google\\x20 501 me     23u  IPv4 0x1a2b3c4d5e6f7a8b      0t0  TCP 192.168.1.20:52311->142.250.74.14:443 (ESTABLISHED)
ssh       733 me      3u  IPv4 0x2b3c4d5e6f7a8b9c      0t0  TCP 192.168.1.20:50022->10.0.0.5:22 (ESTABLISHED)
";
        let conns = MacOsPlatform.parse_connections(text);
        assert_eq!(conns.len(), 2);
        assert_eq!(conns[0].process.as_deref(), Some("Google "));
        assert_eq!(conns[1].pid, Some(733));
        assert_eq!(conns[1].local, "192.168.1.20:50022");
        assert_eq!(conns[1].remote, "10.0.0.5:22");
        assert_eq!(conns[1].state, "ESTABLISHED");
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            LinuxPlatform.ping_command("1.1.1.1", Duration::from_millis(2500)).to_string(),
            "ping -c 1 -W 3 1.1.1.1"
        );
        assert_eq!(
            MacOsPlatform.ping_command("1.1.1.1", Duration::from_secs(2)).to_string(),
            "ping -c 1 -W 2000 1.1.1.1"
        );
        assert_eq!(
            LinuxPlatform.trace_command("8.8.8.8", 15, Duration::from_secs(1)).to_string(),
            "traceroute -n -m 15 -w 1 8.8.8.8"
        );
        assert_eq!(
            LinuxPlatform.action_command(SystemAction::Release, Some("eth0")).unwrap().to_string(),
            "dhclient -r eth0"
        );
        assert_eq!(
            MacOsPlatform.action_command(SystemAction::Renew, None).unwrap().to_string(),
            "ipconfig set en0 DHCP"
        );
        assert!(LinuxPlatform.action_command(SystemAction::ResetWinsock, None).is_none());
    }
}
