//! Diagnosis rules
//!
//! Each rule inspects a snapshot and yields at most one issue. The gateway
//! and DNS rules re-probe live instead of trusting the snapshot's checks.

use crate::models::{Config, Issue, IssueType, NetworkSnapshot, Severity};
use crate::probe::ConnectivityProbe;
use futures::future::join_all;

/// Run every rule in order and collect the issues found
pub async fn evaluate(
    snapshot: &NetworkSnapshot,
    probes: &dyn ConnectivityProbe,
    config: &Config,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    issues.extend(apipa_address(snapshot));
    issues.extend(no_gateway(snapshot));
    issues.extend(gateway_unreachable(snapshot, probes).await);
    issues.extend(dns_failure(probes, config).await);
    issues.extend(multiple_adapters(snapshot));
    issues
}

pub fn apipa_address(snapshot: &NetworkSnapshot) -> Option<Issue> {
    let iface = snapshot.interfaces.iter().find(|iface| iface.is_apipa())?;
    let ip = iface.ipv4.map(|ip| ip.to_string()).unwrap_or_default();

    Some(
        Issue::new(
            IssueType::ApipaAddress,
            Severity::Warning,
            format!(
                "Interface {} has a self-assigned address {}; no DHCP server answered",
                iface.name, ip
            ),
        )
        .with_solution("Renew the IP address and check that the router's DHCP server is running"),
    )
}

pub fn no_gateway(snapshot: &NetworkSnapshot) -> Option<Issue> {
    if snapshot.active_interfaces().next().is_none() || !snapshot.gateways.is_empty() {
        return None;
    }

    Some(
        Issue::new(IssueType::NoGateway, Severity::Critical, "No default gateway is configured")
            .with_solution("Check the cable or Wi-Fi connection, then renew the IP address"),
    )
}

/// Critical when gateways are known but none answers a fresh ping
pub async fn gateway_unreachable(
    snapshot: &NetworkSnapshot,
    probes: &dyn ConnectivityProbe,
) -> Option<Issue> {
    if snapshot.gateways.is_empty() {
        return None;
    }

    let timeout = crate::defaults::GATEWAY_PING_TIMEOUT;
    let replies = join_all(
        snapshot
            .gateways
            .iter()
            .map(|gateway| probes.ping_reachable(gateway, timeout)),
    )
    .await;

    if replies.into_iter().any(|reply| matches!(reply, Ok(true))) {
        return None;
    }

    Some(
        Issue::new(
            IssueType::GatewayUnreachable,
            Severity::Critical,
            format!("Default gateway {} is not responding", snapshot.gateways.join(", ")),
        )
        .with_solution("Restart the router and check the connection to it"),
    )
}

/// Critical when a known-good address answers but name resolution fails
pub async fn dns_failure(probes: &dyn ConnectivityProbe, config: &Config) -> Option<Issue> {
    let external = &config.external_host;
    let reachable = probes
        .ping_reachable(external, crate::defaults::DEFAULT_PING_TIMEOUT)
        .await
        .unwrap_or(false);
    if !reachable {
        return None;
    }

    let resolves = probes
        .resolves(&config.dns_check_hostname)
        .await
        .unwrap_or(false);
    if resolves {
        return None;
    }

    Some(
        Issue::new(
            IssueType::DnsFailure,
            Severity::Critical,
            format!(
                "DNS servers are not responding: {} is reachable but {} does not resolve",
                external, config.dns_check_hostname
            ),
        )
        .with_solution("Flush the DNS cache or switch to a public DNS server such as 1.1.1.1"),
    )
}

pub fn multiple_adapters(snapshot: &NetworkSnapshot) -> Option<Issue> {
    let active: Vec<&str> = snapshot
        .active_interfaces()
        .map(|iface| iface.name.as_str())
        .collect();
    if active.len() <= 1 {
        return None;
    }

    Some(
        Issue::new(
            IssueType::MultipleAdapters,
            Severity::Warning,
            format!(
                "{} active network adapters ({}); traffic may take an unexpected route",
                active.len(),
                active.join(", ")
            ),
        )
        .with_solution("Disable the adapters that are not in use"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnosis, HealthStatus, Interface};
    use crate::probe::fake::FakeProbes;
    use chrono::Utc;
    use std::net::Ipv4Addr;

    fn snapshot(interfaces: Vec<Interface>, gateways: &[&str]) -> NetworkSnapshot {
        NetworkSnapshot {
            hostname: "host".to_string(),
            gateways: gateways.iter().map(|g| g.to_string()).collect(),
            dns_servers: vec![],
            interfaces,
            connection_checks: vec![],
            timestamp: Utc::now(),
        }
    }

    fn iface(name: &str, ip: [u8; 4]) -> Interface {
        Interface::new(name, Some(Ipv4Addr::from(ip)))
    }

    async fn diagnose(snapshot: &NetworkSnapshot, probes: &FakeProbes) -> Diagnosis {
        Diagnosis::from_issues(evaluate(snapshot, probes, &Config::default()).await)
    }

    #[tokio::test]
    async fn test_apipa_is_warning() {
        let probes = FakeProbes::online().reach("192.168.1.1", true).reach("8.8.8.8", true);
        let snap = snapshot(vec![iface("eth0", [169, 254, 5, 5])], &["192.168.1.1"]);
        let diagnosis = diagnose(&snap, &probes).await;

        assert!(diagnosis.has_issue(IssueType::ApipaAddress));
        assert!(diagnosis.status >= HealthStatus::Warning);
        assert!(diagnosis.issues[0].message.contains("169.254.5.5"));
    }

    #[tokio::test]
    async fn test_active_interface_without_gateway_is_critical() {
        let probes = FakeProbes::online().reach("8.8.8.8", true);
        let snap = snapshot(vec![iface("eth0", [192, 168, 1, 20])], &[]);
        let diagnosis = diagnose(&snap, &probes).await;

        assert!(diagnosis.has_issue(IssueType::NoGateway));
        assert!(!diagnosis.has_issue(IssueType::GatewayUnreachable));
        assert_eq!(diagnosis.status, HealthStatus::Critical);
    }

    #[tokio::test]
    async fn test_no_gateway_needs_active_interface() {
        let snap = snapshot(vec![iface("lo", [127, 0, 0, 1])], &[]);
        assert!(no_gateway(&snap).is_none());
    }

    #[tokio::test]
    async fn test_every_gateway_is_repinged() {
        let probes = FakeProbes::online();
        let snap = snapshot(vec![iface("eth0", [10, 0, 0, 5])], &["10.0.0.1", "10.0.0.254"]);
        let issue = gateway_unreachable(&snap, &probes).await.expect("issue");

        assert_eq!(issue.severity, Severity::Critical);
        let pinged = probes.pinged.lock().unwrap().clone();
        assert_eq!(pinged, vec!["10.0.0.1", "10.0.0.254"]);
    }

    #[tokio::test]
    async fn test_one_answering_gateway_is_enough() {
        let probes = FakeProbes::online().reach("10.0.0.254", true);
        let snap = snapshot(vec![iface("eth0", [10, 0, 0, 5])], &["10.0.0.1", "10.0.0.254"]);
        assert!(gateway_unreachable(&snap, &probes).await.is_none());
    }

    #[tokio::test]
    async fn test_dns_failure_requires_reachable_external_host() {
        let broken_dns = FakeProbes {
            resolves: Some(false),
            ..FakeProbes::online()
        };
        assert!(dns_failure(&broken_dns, &Config::default()).await.is_none());

        let broken_dns = broken_dns.reach("8.8.8.8", true);
        let issue = dns_failure(&broken_dns, &Config::default()).await.expect("issue");
        assert_eq!(issue.issue_type, IssueType::DnsFailure);
        assert_eq!(issue.severity, Severity::Critical);
    }

    #[tokio::test]
    async fn test_multiple_adapters_and_all_issues_reported() {
        let probes = FakeProbes::online().reach("8.8.8.8", true);
        let snap = snapshot(
            vec![
                iface("eth0", [192, 168, 1, 20]),
                iface("wlan0", [192, 168, 1, 21]),
                iface("eth1", [169, 254, 1, 1]),
            ],
            &[],
        );
        let diagnosis = diagnose(&snap, &probes).await;

        let types: Vec<IssueType> = diagnosis.issues.iter().map(|i| i.issue_type).collect();
        assert_eq!(
            types,
            vec![IssueType::ApipaAddress, IssueType::NoGateway, IssueType::MultipleAdapters]
        );
        assert_eq!(diagnosis.status, HealthStatus::Critical);
    }
}
