//! Network configuration snapshot and diagnosis models

use chrono::{DateTime, Utc};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Administrative state reported by the OS for an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    Up,
    Down,
    Unknown,
}

impl fmt::Display for AdminStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminStatus::Up => write!(f, "up"),
            AdminStatus::Down => write!(f, "down"),
            AdminStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// How an interface participates in routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceClass {
    /// Has a routable, non-loopback, non-APIPA IPv4 address
    Active,
    /// Self-assigned 169.254.0.0/16 address
    Apipa,
    Inactive,
}

/// One network interface as seen during a detection pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<Ipv4Addr>,
    /// Subnet derived from the interface netmask
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Ipv4Net>,
    /// Lower-case, colon separated hardware address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    pub admin_status: AdminStatus,
}

impl Interface {
    pub fn new(name: impl Into<String>, ipv4: Option<Ipv4Addr>) -> Self {
        Self {
            name: name.into(),
            ipv4,
            network: None,
            mac: None,
            admin_status: AdminStatus::Unknown,
        }
    }

    pub fn classification(&self) -> InterfaceClass {
        match self.ipv4 {
            Some(ip) if ip.is_link_local() => InterfaceClass::Apipa,
            Some(ip) if !ip.is_loopback() && !ip.is_unspecified() => InterfaceClass::Active,
            _ => InterfaceClass::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        self.classification() == InterfaceClass::Active
    }

    pub fn is_apipa(&self) -> bool {
        self.classification() == InterfaceClass::Apipa
    }
}

/// Status values produced by the three connectivity checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Working,
    Failed,
    Error,
}

impl ConnectionStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ConnectionStatus::Connected | ConnectionStatus::Working)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Working => "Working",
            ConnectionStatus::Failed => "Failed",
            ConnectionStatus::Error => "Error",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionCheck {
    pub description: String,
    pub status: ConnectionStatus,
}

impl ConnectionCheck {
    pub const INTERNET: &'static str = "Internet Connection";
    pub const LOCAL_NETWORK: &'static str = "Local Network";
    pub const DNS_RESOLUTION: &'static str = "DNS Resolution";

    pub fn new(description: impl Into<String>, status: ConnectionStatus) -> Self {
        Self {
            description: description.into(),
            status,
        }
    }
}

/// Point-in-time capture of local network configuration and connectivity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub hostname: String,
    pub gateways: Vec<String>,
    pub dns_servers: Vec<String>,
    pub interfaces: Vec<Interface>,
    pub connection_checks: Vec<ConnectionCheck>,
    pub timestamp: DateTime<Utc>,
}

impl NetworkSnapshot {
    pub fn active_interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter().filter(|iface| iface.is_active())
    }

    pub fn check(&self, description: &str) -> Option<&ConnectionCheck> {
        self.connection_checks
            .iter()
            .find(|check| check.description == description)
    }
}

/// Result of a detection pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DetectionOutcome {
    Snapshot(NetworkSnapshot),
    Failed { error: String },
}

impl DetectionOutcome {
    pub fn snapshot(&self) -> Option<&NetworkSnapshot> {
        match self {
            DetectionOutcome::Snapshot(snapshot) => Some(snapshot),
            DetectionOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    ApipaAddress,
    NoGateway,
    GatewayUnreachable,
    DnsFailure,
    MultipleAdapters,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::ApipaAddress => "apipa_address",
            IssueType::NoGateway => "no_gateway",
            IssueType::GatewayUnreachable => "gateway_unreachable",
            IssueType::DnsFailure => "dns_failure",
            IssueType::MultipleAdapters => "multiple_adapters",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

impl Issue {
    pub fn new(issue_type: IssueType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            issue_type,
            severity,
            message: message.into(),
            solution: None,
        }
    }

    pub fn with_solution(mut self, solution: impl Into<String>) -> Self {
        self.solution = Some(solution.into());
        self
    }
}

/// Overall health, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ok,
    Warning,
    Critical,
}

impl From<Severity> for HealthStatus {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warning => HealthStatus::Warning,
            Severity::Critical => HealthStatus::Critical,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Ok => write!(f, "ok"),
            HealthStatus::Warning => write!(f, "warning"),
            HealthStatus::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub status: HealthStatus,
    pub issues: Vec<Issue>,
}

impl Diagnosis {
    /// Status is the maximum severity over all issues
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let status = issues
            .iter()
            .map(|issue| HealthStatus::from(issue.severity))
            .max()
            .unwrap_or(HealthStatus::Ok);
        Self { status, issues }
    }

    pub fn has_issue(&self, issue_type: IssueType) -> bool {
        self.issues.iter().any(|issue| issue.issue_type == issue_type)
    }
}

/// One row of the ARP/neighbor table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborEntry {
    pub ip: String,
    pub mac: String,
    pub entry_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
}

/// An established socket and, when the OS tells us, the process owning it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveConnection {
    /// "TCP" or "UDP"
    pub protocol: String,
    pub local: String,
    pub remote: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
}

/// One row of a remote machine's NetBIOS name table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetbiosName {
    pub name: String,
    /// Service suffix as two hex digits, e.g. "00" or "20"
    pub suffix: String,
    /// "UNIQUE" or "GROUP"
    pub kind: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetbiosInfo {
    pub ip: String,
    pub names: Vec<NetbiosName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NetbiosInfo {
    pub fn failed(ip: &str, error: impl Into<String>) -> Self {
        Self {
            ip: ip.to_string(),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_classification() {
        let active = Interface::new("eth0", Some(Ipv4Addr::new(192, 168, 1, 20)));
        assert_eq!(active.classification(), InterfaceClass::Active);

        let apipa = Interface::new("eth1", Some(Ipv4Addr::new(169, 254, 5, 5)));
        assert_eq!(apipa.classification(), InterfaceClass::Apipa);

        let lo = Interface::new("lo", Some(Ipv4Addr::LOCALHOST));
        assert_eq!(lo.classification(), InterfaceClass::Inactive);

        let none = Interface::new("wlan0", None);
        assert_eq!(none.classification(), InterfaceClass::Inactive);
    }

    #[test]
    fn test_diagnosis_status_is_max_severity() {
        assert_eq!(Diagnosis::from_issues(vec![]).status, HealthStatus::Ok);

        let diagnosis = Diagnosis::from_issues(vec![
            Issue::new(IssueType::MultipleAdapters, Severity::Warning, "two adapters"),
            Issue::new(IssueType::NoGateway, Severity::Critical, "no gateway"),
        ]);
        assert_eq!(diagnosis.status, HealthStatus::Critical);
        assert_eq!(diagnosis.issues.len(), 2);
    }

    #[test]
    fn test_issue_serialization() {
        let issue = Issue::new(IssueType::ApipaAddress, Severity::Warning, "self-assigned")
            .with_solution("renew");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "apipa_address");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["solution"], "renew");
    }

    #[test]
    fn test_failed_outcome_serialization() {
        let outcome = DetectionOutcome::Failed { error: "no interfaces".to_string() };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["error"], "no interfaces");
        assert!(outcome.snapshot().is_none());
    }
}
