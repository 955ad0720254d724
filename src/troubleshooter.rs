//! Automated troubleshooting run
//!
//! Runs detection, pings, a traceroute and a speed test strictly one after
//! another and narrates every step as a line of text. Each line is streamed
//! through the progress channel as soon as it is produced and also kept for
//! the returned transcript. Nothing here fails: problems become log lines.

use crate::detector::NetworkDetector;
use crate::logging::Logger;
use crate::models::{Config, DetectionOutcome, NetworkSnapshot, SpeedTestResult};
use crate::ping::PingTester;
use crate::progress::ProgressSender;
use crate::speedtest::{SpeedProgress, SpeedTester};
use crate::trace::{TraceEvent, TraceRoute, TraceRun};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const INDENT: &str = "    ";
const DETAIL: &str = "        ";

/// Lines collected so far, mirrored to the progress channel
struct Transcript<'a> {
    lines: Vec<String>,
    progress: &'a ProgressSender<String>,
}

impl<'a> Transcript<'a> {
    fn new(progress: &'a ProgressSender<String>) -> Self {
        Self {
            lines: Vec::new(),
            progress,
        }
    }

    fn line(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.progress.emit(text.clone());
        self.lines.push(text);
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }
}

pub struct Troubleshooter {
    detector: NetworkDetector,
    pinger: PingTester,
    tracer: TraceRoute,
    speed: SpeedTester,
    logger: Arc<Logger>,
    cancel: CancellationToken,
    external_host: String,
    ping_timeout: Duration,
    trace_wait: Duration,
}

impl Troubleshooter {
    pub fn new(
        detector: NetworkDetector,
        pinger: PingTester,
        tracer: TraceRoute,
        speed: SpeedTester,
        logger: Arc<Logger>,
        config: &Config,
    ) -> Self {
        Self {
            detector,
            pinger,
            tracer,
            speed,
            logger,
            cancel: CancellationToken::new(),
            external_host: config.external_host.clone(),
            ping_timeout: config.ping_timeout(),
            trace_wait: config.trace_wait(),
        }
    }

    /// Token checked between stages and shared with the pings
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every stage and return the full transcript
    pub async fn run(&self, progress: &ProgressSender<String>) -> String {
        let run_id = self.logger.begin_run("troubleshoot").await;
        let mut log = Transcript::new(progress);

        log.line(format!(
            "--- Automated Network Troubleshooting --- ({})",
            Local::now().format("%Y-%m-%dT%H:%M:%S")
        ));
        log.line("");

        let completed = self.stages(&mut log).await;
        if !completed {
            log.line("Troubleshooting stopped.");
        }

        log.line("");
        log.line("--- Troubleshooting Complete ---");

        self.logger.end_run(&run_id, "troubleshoot", completed).await;
        log.finish()
    }

    /// Returns false when the run was stopped before the last stage finished
    async fn stages(&self, log: &mut Transcript<'_>) -> bool {
        log.line("1. Gathering Device and Network Information...");
        let snapshot = match self.detector.collect().await {
            DetectionOutcome::Snapshot(snapshot) => {
                describe_snapshot(log, &snapshot);
                Some(snapshot)
            }
            DetectionOutcome::Failed { error } => {
                log.line(format!("{}Unable to collect network information: {}", INDENT, error));
                None
            }
        };
        log.line("");
        if self.cancel.is_cancelled() {
            return false;
        }

        log.line("2. Performing Connectivity Tests...");
        let gateway = snapshot.as_ref().and_then(|s| s.gateways.first().cloned());
        let dns_server = snapshot.as_ref().and_then(|s| s.dns_servers.first().cloned());

        match gateway {
            Some(gateway) => self.ping_stage(log, "gateway", &gateway, "gateway").await,
            None => log.line(format!("{}Gateway not found, skipping ping test.", INDENT)),
        }
        match dns_server {
            Some(server) => self.ping_stage(log, "primary DNS server", &server, "DNS server").await,
            None => log.line(format!("{}DNS server not found, skipping ping test.", INDENT)),
        }
        let external = self.external_host.clone();
        self.ping_stage(log, "external host", &external, "external host").await;
        log.line("");
        if self.cancel.is_cancelled() {
            return false;
        }

        log.line(format!("3. Performing Traceroute to {}...", self.external_host));
        let run = self.trace_stage(log).await;
        if run.stopped || self.cancel.is_cancelled() {
            return false;
        }
        log.line("");

        log.line("4. Performing Speed Test...");
        let result = self.speed_stage(log).await;
        describe_speed(log, &result);
        !result.cancelled
    }

    async fn ping_stage(&self, log: &mut Transcript<'_>, label: &str, host: &str, noun: &str) {
        log.line(format!("{}Pinging {} ({})...", INDENT, label, host));
        let result = self
            .pinger
            .ping_host(
                host,
                crate::defaults::TROUBLESHOOT_PING_COUNT,
                self.ping_timeout,
                &ProgressSender::disabled(),
                &self.cancel,
            )
            .await;

        match result.statistics.avg {
            Some(avg) if result.error.is_none() => {
                log.line(format!("{}Success ({:.2}ms avg)", DETAIL, avg));
            }
            _ => log.line(format!("{}Failed to ping {}.", DETAIL, noun)),
        }
    }

    /// Trace to the external host, relaying hops as they arrive
    async fn trace_stage(&self, log: &mut Transcript<'_>) -> TraceRun {
        let (tx, mut rx) = ProgressSender::channel();
        let trace = async move {
            let run = self
                .tracer
                .run(
                    &self.external_host,
                    crate::defaults::TROUBLESHOOT_TRACE_MAX_HOPS,
                    self.trace_wait,
                    &tx,
                )
                .await;
            drop(tx);
            run
        };

        let relay = async {
            while let Some(progress) = rx.recv().await {
                match progress.event {
                    TraceEvent::Hop(hop) => log.line(hop.to_string()),
                    TraceEvent::Error { message } => log.line(message),
                    TraceEvent::Finished { stopped: true, .. } => log.line("Traceroute stopped."),
                    TraceEvent::Finished { .. } => {}
                }
            }
        };

        let (run, ()) = tokio::join!(trace, relay);
        run
    }

    /// Full speed test, logging each distinct phase message once
    async fn speed_stage(&self, log: &mut Transcript<'_>) -> SpeedTestResult {
        let (tx, mut rx) = ProgressSender::<SpeedProgress>::channel();
        let test = async move {
            let result = self.speed.perform_speed_test(&tx).await;
            drop(tx);
            result
        };

        let relay = async {
            let mut last: Option<String> = None;
            while let Some(progress) = rx.recv().await {
                let message = progress.event.message;
                if last.as_deref() != Some(message.as_str()) {
                    log.line(format!("{}{}", INDENT, message));
                    last = Some(message);
                }
            }
        };

        let (result, ()) = tokio::join!(test, relay);
        result
    }
}

fn describe_snapshot(log: &mut Transcript<'_>, snapshot: &NetworkSnapshot) {
    log.line(format!("{}Hostname: {}", INDENT, snapshot.hostname));
    for iface in &snapshot.interfaces {
        log.line(format!(
            "{}Interface: {}, IP: {}, MAC: {}, Status: {}",
            INDENT,
            iface.name,
            iface.ipv4.map_or_else(|| "N/A".to_string(), |ip| ip.to_string()),
            iface.mac.as_deref().unwrap_or("N/A"),
            iface.admin_status
        ));
    }
    log.line(format!("{}Gateway: {}", INDENT, or_na(&snapshot.gateways)));
    log.line(format!("{}DNS Servers: {}", INDENT, or_na(&snapshot.dns_servers)));
    for check in &snapshot.connection_checks {
        log.line(format!("{}{}: {}", INDENT, check.description, check.status));
    }
}

/// Summary lines; an error was already relayed as the final phase message
fn describe_speed(log: &mut Transcript<'_>, result: &SpeedTestResult) {
    if result.error.is_some() {
        return;
    }
    if result.cancelled {
        log.line(format!("{}Speed test cancelled.", INDENT));
        return;
    }

    let mbps = |value: Option<f64>| {
        value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2} Mbps", v))
    };
    log.line(format!("{}Download: {}", INDENT, mbps(result.download_mbps)));
    log.line(format!("{}Upload: {}", INDENT, mbps(result.upload_mbps)));
    log.line(format!(
        "{}Ping: {}",
        INDENT,
        result.ping_ms.map_or_else(|| "N/A".to_string(), |ms| format!("{:.2} ms", ms))
    ));
    if let Some(server) = &result.server {
        log.line(format!(
            "{}Server: {} - {} ({})",
            INDENT, server.sponsor, server.name, server.country
        ));
    }
}

fn or_na(values: &[String]) -> String {
    if values.is_empty() {
        "N/A".to_string()
    } else {
        values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::fake::FakeRunner;
    use crate::command::CommandSpec;
    use crate::detector::InterfaceAddr;
    use crate::error::{AppError, Result};
    use crate::platform::LinuxPlatform;
    use crate::probe::fake::FakeProbes;
    use crate::progress::drain;
    use crate::speedtest::fake::{FailAt, FakeClient};
    use std::net::Ipv4Addr;

    fn no_addresses() -> Result<Vec<InterfaceAddr>> {
        Err(AppError::io("getifaddrs failed"))
    }

    fn eth0() -> Result<Vec<InterfaceAddr>> {
        Ok(vec![InterfaceAddr {
            name: "eth0".to_string(),
            ip: Ipv4Addr::new(192, 168, 1, 20),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
        }])
    }

    fn troubleshooter(
        runner: FakeRunner,
        probes: FakeProbes,
        addresses: crate::detector::AddressLister,
        trace: CommandSpec,
        speed: FakeClient,
    ) -> Troubleshooter {
        let runner = Arc::new(runner);
        let platform = Arc::new(LinuxPlatform);
        let logger = Arc::new(Logger::quiet("TROUBLE"));
        let config = Config::default();

        let detector = NetworkDetector::new(
            runner.clone(),
            platform.clone(),
            Arc::new(probes),
            logger.clone(),
            config.clone(),
        )
        .with_addresses(addresses);
        let pinger =
            PingTester::new(runner, platform.clone(), logger.clone()).with_interval(Duration::ZERO);
        let tracer = TraceRoute::new(platform, logger.clone()).with_command(trace);
        let speed = SpeedTester::new(Arc::new(speed), logger.clone());

        Troubleshooter::new(detector, pinger, tracer, speed, logger, &config)
    }

    #[tokio::test]
    async fn test_everything_failing_still_completes() {
        let trouble = troubleshooter(
            FakeRunner::new(),
            FakeProbes::default(),
            no_addresses,
            CommandSpec::new("no-such-traceroute-binary", Vec::<String>::new()),
            FakeClient::new(FailAt::Server),
        );
        let (tx, mut rx) = ProgressSender::channel();
        let text = trouble.run(&tx).await;

        assert!(text.starts_with("--- Automated Network Troubleshooting ---"));
        assert!(text.contains("Unable to collect network information"));
        assert!(text.contains("Gateway not found, skipping ping test."));
        assert!(text.contains("DNS server not found, skipping ping test."));
        assert!(text.contains("Pinging external host (8.8.8.8)..."));
        assert!(text.contains("Failed to ping external host."));
        assert!(text.contains("command not found"));
        assert!(text.contains("Speedtest Error:"));
        assert!(text.ends_with("--- Troubleshooting Complete ---"));

        let streamed = drain(&mut rx);
        assert_eq!(streamed.join("\n"), text);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_healthy_run_narrates_each_stage() {
        const LINK: &str =
            "2: eth0: <BROADCAST,UP> mtu 1500\\    link/ether 52:54:00:12:34:56 brd ff:ff:ff:ff:ff:ff\n";
        let reply = "64 bytes from x: icmp_seq=1 ttl=64 time=2.00 ms";
        let runner = FakeRunner::new()
            .file("/proc/sys/kernel/hostname", "box\n")
            .file(
                "/proc/net/route",
                "Iface\tDestination\tGateway\tFlags\neth0\t00000000\t0101A8C0\t0003\n",
            )
            .file("/etc/resolv.conf", "nameserver 1.1.1.1\n")
            .on("ip -o link show", 0, LINK)
            .on("ping *", 0, reply);
        let hops = "printf ' 1  192.168.1.1  0.5 ms  0.5 ms\\n 2  * * *\\n'";
        let trace = CommandSpec::new("sh", ["-c", hops]);

        let trouble = troubleshooter(
            runner,
            FakeProbes::online().reach("192.168.1.1", true),
            eth0,
            trace,
            FakeClient::new(FailAt::Nowhere),
        );
        let text = trouble.run(&ProgressSender::disabled()).await;

        assert!(text.contains("    Hostname: box"));
        assert!(text.contains(
            "    Interface: eth0, IP: 192.168.1.20, MAC: 52:54:00:12:34:56, Status: up"
        ));
        assert!(
            text.contains("    Pinging gateway (192.168.1.1)...\n        Success (2.00ms avg)")
        );
        assert!(text.contains("    Pinging primary DNS server (1.1.1.1)..."));
        assert!(text.contains(" 1  192.168.1.1  0.5 ms"));
        assert!(text.contains(" 2  Request timed out"));
        assert!(text.contains("    Download: 93.46 Mbps"));

        let download_lines = text.matches("Testing download speed...").count();
        assert_eq!(download_lines, 1);
    }
}
