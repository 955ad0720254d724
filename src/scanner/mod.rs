//! TCP connect port scanner

pub mod ports;
pub mod presets;
pub mod services;

use crate::logging::Logger;
use crate::models::{PortResult, PortStatus};
use crate::probe::probe_port;
use crate::progress::ProgressSender;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub use ports::parse_port_list;
pub use presets::PortPreset;
pub use services::service_name;

/// Progress emitted while scanning, in scan order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    /// Percentage of ports finished, `(i + 1) * 100 / total` rounded down
    Progress { percent: u8 },
    Result(PortResult),
}

/// Ordered results of one scan plus the token that stops it
#[derive(Debug, Clone, Default)]
pub struct ScanSession {
    pub results: Vec<PortResult>,
    pub cancel: CancellationToken,
}

impl ScanSession {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { results: Vec::new(), cancel }
    }

    /// Request the scan to halt before its next port
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn open_ports(&self) -> impl Iterator<Item = &PortResult> {
        self.results.iter().filter(|r| r.status == PortStatus::Open)
    }
}

pub struct PortScanner {
    logger: Arc<Logger>,
}

impl PortScanner {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    /// Scan `ports` on `host` one at a time, in the order given
    ///
    /// The session's token is checked before each port; a stopped scan returns
    /// the results collected so far.
    pub async fn scan_ports(
        &self,
        host: &str,
        ports: &[u32],
        timeout: Duration,
        progress: &ProgressSender<ScanEvent>,
        cancel: CancellationToken,
    ) -> ScanSession {
        let mut session = ScanSession::new(cancel);
        let total = ports.len();

        self.logger
            .info(&format!("Scanning {} ports on {}", total, host))
            .field("host", host)
            .field("timeout_ms", timeout.as_millis() as u64)
            .log()
            .await;

        for (i, &port) in ports.iter().enumerate() {
            if session.is_stopped() {
                crate::log_info!(
                    self.logger,
                    "Scan of {} stopped after {} of {} ports",
                    host,
                    i,
                    total
                );
                break;
            }

            let result = probe_port(host, port, timeout).await;
            session.results.push(result.clone());

            let percent = ((i + 1) * 100 / total) as u8;
            progress.emit(ScanEvent::Progress { percent });
            progress.emit(ScanEvent::Result(result));
        }

        crate::log_debug!(
            self.logger,
            "Scan of {} finished: {} open of {} scanned",
            host,
            session.open_ports().count(),
            session.results.len()
        );

        session
    }
}
