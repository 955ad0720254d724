//! Data models shared by the probes, detector and output layers

pub mod config;
pub mod network;
pub mod probe;

// Re-export main model types
pub use config::Config;
pub use network::{
    ActiveConnection, AdminStatus, ConnectionCheck, ConnectionStatus, DetectionOutcome, Diagnosis,
    HealthStatus, Interface, InterfaceClass, Issue, IssueType, NeighborEntry, NetbiosInfo,
    NetbiosName, NetworkSnapshot, Severity,
};
pub use probe::{
    round2, AttemptStatus, HopLatency, HopStatus, PingAttempt, PingResult, PingStatistics,
    PortResult, PortStatus, ServerInfo, SpeedTestResult, TraceHop,
};
