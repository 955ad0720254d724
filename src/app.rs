//! Main application orchestration and execution

use crate::{
    actions::SystemActionExecutor,
    cli::{Cli, Command, PortList},
    command::{CommandRunner, SystemCommandRunner},
    config::{display_config_summary, load_config, EnvManager},
    detector::NetworkDetector,
    error::{AppError, Result},
    executor::ProbeSupervisor,
    logging::{Logger, LoggerFactory, ProbeLogger},
    models::{Config, DetectionOutcome},
    connections::ConnectionTable,
    neighbors::{NeighborTable, NetbiosLookup},
    output::{to_json, OutputFormatter, OutputFormatterFactory},
    ping::PingTester,
    platform::{self, PlatformAdapter},
    probe::SystemProbes,
    progress::{ProgressReceiver, ProgressSender},
    scanner::{PortPreset, PortScanner, ScanEvent},
    speedtest::{BandwidthClient, HttpBandwidthClient, SpeedTester, UnavailableClient},
    trace::{TraceEvent, TraceRoute},
    troubleshooter::Troubleshooter,
    types::ProbeKind,
};
use serde_json::json;
use std::io::{IsTerminal, Write};
use std::sync::Arc;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
    config: Config,
    loggers: LoggerFactory,
    formatter: Box<dyn OutputFormatter + Send + Sync>,
    runner: Arc<dyn CommandRunner>,
    platform: Arc<dyn PlatformAdapter>,
    supervisor: Arc<ProbeSupervisor>,
}

/// Print every progress event until the producing task drops its sender
async fn relay<T, F>(rx: &mut ProgressReceiver<T>, mut render: F)
where
    F: FnMut(T),
{
    while let Some(progress) = rx.recv().await {
        render(progress.event);
    }
}

impl App {
    /// Load configuration and build the shared components
    pub async fn new(cli: Cli) -> Result<Self> {
        let config = load_config(cli.clone())?;
        let loggers = LoggerFactory::new(config.clone());

        let runner_logger = ProbeLogger::new(loggers.create_logger("CMD").await);
        let supervisor = ProbeSupervisor::new(loggers.create_logger("SUPERVISOR").await);

        Ok(Self {
            formatter: OutputFormatterFactory::create_formatter(
                config.enable_color,
                config.verbose,
            ),
            runner: Arc::new(SystemCommandRunner::with_logger(runner_logger)),
            platform: platform::current(),
            supervisor: Arc::new(supervisor),
            loggers,
            config,
            cli,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the selected command; `Ok(false)` means it ran but reported failure
    pub async fn run(self) -> Result<bool> {
        let supervisor = self.supervisor.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                supervisor.cancel_all().await;
            }
        });

        if self.config.debug {
            eprintln!("{} v{} ({})", crate::PKG_NAME, crate::VERSION, crate::GIT_COMMIT);
            eprintln!("{}\n", display_config_summary(&self.config));
        }

        let outcome = self.dispatch().await;
        // main reports the error; debug runs also log it with context
        if let (Err(e), true) = (&outcome, self.config.debug) {
            self.loggers
                .create_error_logger()
                .await
                .log_error(e, Some(self.cli.command.name()), Some(self.loggers.session_id()))
                .await;
        }
        outcome
    }

    async fn dispatch(&self) -> Result<bool> {
        match self.cli.command.clone() {
            Command::Status => self.status().await,
            Command::Diagnose => self.diagnose().await,
            Command::Ping { host, .. } => self.ping(host).await,
            Command::Scan { host, ports, preset, .. } => self.scan(host, ports, preset).await,
            Command::Presets => self.presets(),
            Command::Trace { host, .. } => self.trace(host).await,
            Command::Speedtest { .. } => self.speedtest().await,
            Command::Troubleshoot => self.troubleshoot().await,
            Command::Action { action, adapter } => {
                let logger = self.loggers.create_logger("ACTION").await;
                let executor =
                    SystemActionExecutor::new(self.runner.clone(), self.platform.clone(), logger);
                let outcome = executor.execute(action, adapter.as_deref()).await;
                self.emit(&outcome, || self.formatter.format_action_outcome(&outcome))?;
                Ok(outcome.success)
            }
            Command::Arp => {
                let logger = self.loggers.create_logger("ARP").await;
                let entries = NeighborTable::new(self.runner.clone(), self.platform.clone(), logger)
                    .collect()
                    .await;
                self.emit(&entries, || self.formatter.format_neighbors(&entries))?;
                Ok(true)
            }
            Command::Connections => {
                let logger = self.loggers.create_logger("CONNECTIONS").await;
                let table =
                    ConnectionTable::new(self.runner.clone(), self.platform.clone(), logger);
                let connections = table.collect().await;
                self.emit(&connections, || self.formatter.format_connections(&connections))?;
                Ok(true)
            }
            Command::Netbios { ip } => {
                let logger = self.loggers.create_logger("NETBIOS").await;
                let info = NetbiosLookup::new(self.runner.clone(), self.platform.clone(), logger)
                    .lookup(&ip)
                    .await;
                self.emit(&info, || self.formatter.format_netbios(&info))?;
                Ok(info.error.is_none())
            }
            Command::Config { write_example } => self.show_config(write_example.as_deref()),
        }
    }

    /// Print `value` as JSON or through the text renderer
    fn emit<T, F>(&self, value: &T, render: F) -> Result<()>
    where
        T: serde::Serialize + ?Sized,
        F: FnOnce() -> Result<String>,
    {
        let text = if self.cli.json { to_json(value)? } else { render()? };
        println!("{}", text);
        Ok(())
    }

    async fn logger(&self, name: &str) -> Arc<Logger> {
        self.loggers.create_logger(name).await
    }

    async fn detector(&self) -> NetworkDetector {
        let logger = self.logger("DETECT").await;
        let probes = SystemProbes::new(
            &self.config,
            self.runner.clone(),
            self.platform.clone(),
            ProbeLogger::new(logger.clone()),
        );
        NetworkDetector::new(
            self.runner.clone(),
            self.platform.clone(),
            Arc::new(probes),
            logger,
            self.config.clone(),
        )
    }

    /// A client that cannot be built surfaces as the result's `error`
    async fn speed_tester(&self) -> SpeedTester {
        let logger = self.logger("SPEED").await;
        let client: Arc<dyn BandwidthClient> = match HttpBandwidthClient::new(
            &self.config.speedtest_servers,
            self.config.speedtest_chunks,
            self.config.speedtest_chunk_bytes,
            crate::defaults::DEFAULT_SPEEDTEST_TIMEOUT,
        ) {
            Ok(client) => Arc::new(client),
            Err(e) => Arc::new(UnavailableClient::new(&e)),
        };
        SpeedTester::new(client, logger)
    }

    async fn collect(&self) -> Result<(Arc<NetworkDetector>, DetectionOutcome)> {
        let detector = Arc::new(self.detector().await);
        let task_detector = detector.clone();
        let outcome = self
            .supervisor
            .launch(ProbeKind::Detect, move |_cancel| async move { task_detector.collect().await })
            .await
            .wait()
            .await?;
        Ok((detector, outcome))
    }

    async fn status(&self) -> Result<bool> {
        let (_, outcome) = self.collect().await?;
        match &outcome {
            DetectionOutcome::Snapshot(snapshot) => {
                self.emit(&outcome, || {
                    Ok(format!(
                        "{}\n{}",
                        self.formatter.format_header("Network Status")?,
                        self.formatter.format_snapshot(snapshot)?
                    ))
                })?;
                Ok(true)
            }
            DetectionOutcome::Failed { error } => Err(AppError::network(error.clone())),
        }
    }

    async fn diagnose(&self) -> Result<bool> {
        let (detector, outcome) = self.collect().await?;
        let snapshot = match outcome {
            DetectionOutcome::Snapshot(snapshot) => snapshot,
            DetectionOutcome::Failed { error } => return Err(AppError::network(error)),
        };

        let diagnosis = detector.diagnose(&snapshot).await;
        let report = json!({ "snapshot": snapshot, "diagnosis": diagnosis });
        self.emit(&report, || {
            Ok(format!(
                "{}\n{}\n\n{}",
                self.formatter.format_header("Network Diagnosis")?,
                self.formatter.format_snapshot(&snapshot)?,
                self.formatter.format_diagnosis(&diagnosis)?
            ))
        })?;
        Ok(diagnosis.issues.is_empty())
    }

    async fn ping(&self, host: String) -> Result<bool> {
        let logger = self.logger("PING").await;
        let pinger = PingTester::new(self.runner.clone(), self.platform.clone(), logger);
        let (count, timeout) = (self.config.ping_count, self.config.ping_timeout());
        let (tx, mut rx) = ProgressSender::channel();

        let handle = self
            .supervisor
            .launch(ProbeKind::Ping, move |cancel| async move {
                pinger.ping_host(&host, count, timeout, &tx, &cancel).await
            })
            .await;

        let live = !self.cli.json;
        relay(&mut rx, |line: String| {
            if live {
                println!("{}", line);
            }
        })
        .await;
        let result = handle.wait().await?;

        if live && !result.attempts.is_empty() {
            println!();
        }
        self.emit(&result, || self.formatter.format_ping_result(&result))?;
        Ok(result.is_success())
    }

    async fn scan(
        &self,
        host: String,
        ports: Option<PortList>,
        preset: Option<PortPreset>,
    ) -> Result<bool> {
        let ports = match (ports, preset) {
            (Some(PortList(ports)), _) => ports,
            (None, Some(preset)) => preset.ports(),
            (None, None) => PortPreset::Common.ports(),
        };

        let scanner = PortScanner::new(self.logger("SCAN").await);
        let timeout = self.config.scan_timeout();
        let (tx, mut rx) = ProgressSender::channel();
        let target = host.clone();

        let handle = self
            .supervisor
            .launch(ProbeKind::Scan, move |cancel| async move {
                scanner.scan_ports(&target, &ports, timeout, &tx, cancel).await
            })
            .await;

        let show_percent = !self.cli.json && std::io::stderr().is_terminal();
        relay(&mut rx, |event| {
            if let (true, ScanEvent::Progress { percent }) = (show_percent, event) {
                eprint!("\rScanning {}... {:>3}%", host, percent);
                let _ = std::io::stderr().flush();
            }
        })
        .await;
        if show_percent {
            eprintln!();
        }

        let session = handle.wait().await?;
        let report = json!({
            "host": host,
            "stopped": session.is_stopped(),
            "results": session.results,
        });
        self.emit(&report, || self.formatter.format_scan_results(&host, &session))?;
        Ok(true)
    }

    fn presets(&self) -> Result<bool> {
        let presets: Vec<_> = PortPreset::ALL
            .iter()
            .map(|preset| json!({ "name": preset.name(), "ports": preset.ports() }))
            .collect();
        self.emit(&presets, || self.formatter.format_presets())?;
        Ok(true)
    }

    async fn trace(&self, host: String) -> Result<bool> {
        let tracer = TraceRoute::new(self.platform.clone(), self.logger("TRACE").await);
        let (max_hops, wait) = (self.config.trace_max_hops, self.config.trace_wait());
        let (tx, mut rx) = ProgressSender::channel();

        let handle = self
            .supervisor
            .launch(ProbeKind::Trace, move |cancel| async move {
                tracer.with_cancel(cancel).run(&host, max_hops, wait, &tx).await
            })
            .await;

        let live = !self.cli.json;
        let formatter = &self.formatter;
        relay(&mut rx, |event| {
            if !live {
                return;
            }
            let line = match event {
                TraceEvent::Hop(hop) => formatter.format_trace_hop(&hop),
                TraceEvent::Error { message } => formatter.format_error(&message),
                TraceEvent::Finished { .. } => return,
            };
            if let Ok(line) = line {
                println!("{}", line);
            }
        })
        .await;

        let run = handle.wait().await?;
        if self.cli.json {
            println!("{}", to_json(&run)?);
        } else if run.error.is_none() {
            println!("{}", self.formatter.format_trace_run(&run)?);
        }
        Ok(run.error.is_none())
    }

    async fn speedtest(&self) -> Result<bool> {
        let tester = self.speed_tester().await;
        let (tx, mut rx) = ProgressSender::channel();

        let handle = self
            .supervisor
            .launch(ProbeKind::SpeedTest, move |cancel| async move {
                tester.with_cancel(cancel).perform_speed_test(&tx).await
            })
            .await;

        let live = !self.cli.json;
        let mut last_message = String::new();
        relay(&mut rx, |progress| {
            if live && progress.message != last_message {
                eprintln!("[{:>3}%] {}", progress.percent, progress.message);
                last_message = progress.message;
            }
        })
        .await;

        let result = handle.wait().await?;
        self.emit(&result, || self.formatter.format_speed_result(&result))?;
        Ok(result.error.is_none())
    }

    async fn troubleshoot(&self) -> Result<bool> {
        let ping_logger = self.logger("PING").await;
        let troubleshooter = Troubleshooter::new(
            self.detector().await,
            PingTester::new(self.runner.clone(), self.platform.clone(), ping_logger),
            TraceRoute::new(self.platform.clone(), self.logger("TRACE").await),
            self.speed_tester().await,
            self.logger("TROUBLESHOOT").await,
            &self.config,
        );
        let (tx, mut rx) = ProgressSender::channel();

        let handle = self
            .supervisor
            .launch(ProbeKind::Troubleshoot, move |cancel| async move {
                troubleshooter.with_cancel(cancel).run(&tx).await
            })
            .await;

        let live = !self.cli.json;
        relay(&mut rx, |line: String| {
            if live {
                println!("{}", line);
            }
        })
        .await;

        let transcript = handle.wait().await?;
        if self.cli.json {
            println!("{}", to_json(&json!({ "transcript": transcript }))?);
        }
        Ok(true)
    }

    fn show_config(&self, write_example: Option<&std::path::Path>) -> Result<bool> {
        if let Some(path) = write_example {
            EnvManager::save_example_env_file(path)?;
            println!(
                "{}",
                self.formatter
                    .format_success(&format!("Wrote example settings to {}", path.display()))?
            );
            return Ok(true);
        }

        self.emit(&self.config, || Ok(display_config_summary(&self.config)))?;

        if let Some(path) = &self.cli.env_file {
            for warning in EnvManager::check_env_file(path)? {
                eprintln!("{}", self.formatter.format_warning(&warning)?);
            }
        }
        Ok(true)
    }
}
