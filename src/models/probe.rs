//! Result types produced by the probe aggregators

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptStatus {
    Reply,
    Timeout,
}

/// A single echo request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingAttempt {
    pub sequence: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    pub status: AttemptStatus,
    /// Why a non-reply happened: "no reply", "unparsable reply" or a command error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PingAttempt {
    pub fn reply(sequence: u32, time_ms: f64, ttl: Option<u32>) -> Self {
        Self {
            sequence,
            time_ms: Some(time_ms),
            ttl,
            status: AttemptStatus::Reply,
            detail: None,
        }
    }

    pub fn timeout(sequence: u32, detail: impl Into<String>) -> Self {
        Self {
            sequence,
            time_ms: None,
            ttl: None,
            status: AttemptStatus::Timeout,
            detail: Some(detail.into()),
        }
    }
}

/// Statistics over the successful samples of a ping run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PingStatistics {
    pub sent: u32,
    pub received: u32,
    pub lost: u32,
    pub success_rate: f64,
    pub times: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    pub stddev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResult {
    pub host: String,
    pub attempts: Vec<PingAttempt>,
    pub statistics: PingStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PingResult {
    pub fn failed(host: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            attempts: Vec::new(),
            statistics: PingStatistics::default(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.statistics.received > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortStatus {
    Open,
    Closed,
    Error,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortStatus::Open => write!(f, "Open"),
            PortStatus::Closed => write!(f, "Closed"),
            PortStatus::Error => write!(f, "Error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortResult {
    /// Requested port; values outside 1..=65535 are reported as errors
    pub port: u32,
    pub status: PortStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PortResult {
    pub fn open(port: u32, service: impl Into<String>) -> Self {
        Self {
            port,
            status: PortStatus::Open,
            service: Some(service.into()),
            error: None,
        }
    }

    pub fn closed(port: u32) -> Self {
        Self {
            port,
            status: PortStatus::Closed,
            service: None,
            error: None,
        }
    }

    pub fn error(port: u32, message: impl Into<String>) -> Self {
        Self {
            port,
            status: PortStatus::Error,
            service: None,
            error: Some(message.into()),
        }
    }
}

/// Averaged hop round-trip time, or `*` when the tool printed no numeric sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HopLatency {
    Millis(f64),
    Unmeasured,
}

impl fmt::Display for HopLatency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HopLatency::Millis(ms) => write!(f, "{:.1} ms", ms),
            HopLatency::Unmeasured => write!(f, "*"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HopStatus {
    Ok,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceHop {
    pub hop: u32,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<HopLatency>,
    pub status: HopStatus,
}

impl TraceHop {
    pub const TIMED_OUT: &'static str = "Request timed out";

    pub fn timeout(hop: u32) -> Self {
        Self {
            hop,
            ip: Self::TIMED_OUT.to_string(),
            latency: None,
            status: HopStatus::Timeout,
        }
    }

    pub fn reached(hop: u32, ip: impl Into<String>, latency: HopLatency) -> Self {
        Self {
            hop,
            ip: ip.into(),
            latency: Some(latency),
            status: HopStatus::Ok,
        }
    }
}

/// ` 3  10.20.0.1  4.5 ms` or ` 4  Request timed out`
impl fmt::Display for TraceHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.latency) {
            (HopStatus::Ok, Some(latency)) => {
                write!(f, "{:>2}  {}  {}", self.hop, self.ip, latency)
            }
            (HopStatus::Ok, None) => write!(f, "{:>2}  {}", self.hop, self.ip),
            (HopStatus::Timeout, _) => write!(f, "{:>2}  {}", self.hop, Self::TIMED_OUT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub sponsor: String,
    pub country: String,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpeedTestResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_mbps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_mbps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
}

impl SpeedTestResult {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && !self.cancelled && self.upload_mbps.is_some()
    }
}

/// Round to two decimal places, the precision used for reported rates
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_latency_display() {
        assert_eq!(HopLatency::Millis(0.5).to_string(), "0.5 ms");
        assert_eq!(HopLatency::Millis(12.0).to_string(), "12.0 ms");
        assert_eq!(HopLatency::Unmeasured.to_string(), "*");
    }

    #[test]
    fn test_port_result_constructors() {
        let open = PortResult::open(22, "ssh");
        assert_eq!(open.status, PortStatus::Open);
        assert_eq!(open.service.as_deref(), Some("ssh"));

        let err = PortResult::error(99999, "port out of range");
        assert_eq!(err.status, PortStatus::Error);
        assert!(err.service.is_none());
    }

    #[test]
    fn test_failed_ping_result() {
        let result = PingResult::failed("", "host is empty");
        assert_eq!(result.statistics.sent, 0);
        assert!(!result.is_success());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(93.456), 93.46);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_trace_hop_display() {
        assert_eq!(
            TraceHop::reached(3, "10.0.0.1", HopLatency::Millis(4.5)).to_string(),
            " 3  10.0.0.1  4.5 ms"
        );
        assert_eq!(TraceHop::timeout(12).to_string(), "12  Request timed out");
    }

    #[test]
    fn test_trace_hop_timeout() {
        let hop = TraceHop::timeout(3);
        assert_eq!(hop.ip, "Request timed out");
        assert_eq!(hop.status, HopStatus::Timeout);
        assert!(hop.latency.is_none());
    }
}
