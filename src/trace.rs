//! Streaming traceroute
//!
//! Spawns the OS traceroute utility and emits each parsed hop as soon as its
//! line is read. Stopping kills the child process.

use crate::command::CommandSpec;
use crate::logging::Logger;
use crate::models::TraceHop;
use crate::platform::PlatformAdapter;
use crate::progress::ProgressSender;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::time;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Hop(TraceHop),
    Error { message: String },
    Finished { hops: usize, stopped: bool },
}

/// Everything one trace produced
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceRun {
    pub target: String,
    pub hops: Vec<TraceHop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub stopped: bool,
}

pub struct TraceRoute {
    platform: Arc<dyn PlatformAdapter>,
    logger: Arc<Logger>,
    cancel: CancellationToken,
    command: Option<CommandSpec>,
}

enum Stop {
    Exited,
    Cancelled,
    Failed(String),
}

impl TraceRoute {
    pub fn new(platform: Arc<dyn PlatformAdapter>, logger: Arc<Logger>) -> Self {
        Self {
            platform,
            logger,
            cancel: CancellationToken::new(),
            command: None,
        }
    }

    /// Share an externally owned cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run `command` instead of the platform traceroute
    pub fn with_command(mut self, command: CommandSpec) -> Self {
        self.command = Some(command);
        self
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Per-line read timeout: three probes' worth of waiting plus slack
    pub fn line_timeout(wait: Duration) -> Duration {
        wait * 3 + Duration::from_secs(5)
    }

    pub async fn run(
        &self,
        target: &str,
        max_hops: u32,
        wait: Duration,
        progress: &ProgressSender<TraceEvent>,
    ) -> TraceRun {
        let mut run = TraceRun {
            target: target.to_string(),
            ..TraceRun::default()
        };

        if target.trim().is_empty() {
            return self.fail(run, "Target must not be empty".to_string(), progress);
        }

        let spec = self
            .command
            .clone()
            .unwrap_or_else(|| self.platform.trace_command(target, max_hops, wait));

        self.logger
            .info(&format!("Tracing route to {}", target))
            .field("command", spec.to_string())
            .log()
            .await;

        let mut child = match spec.to_tokio().spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return self.fail(run, format!("{} command not found", spec.program), progress);
            }
            Err(e) => {
                let message = format!("Failed to start {}: {}", spec.program, e);
                return self.fail(run, message, progress);
            }
        };

        let stop = self
            .read_hops(&mut child, Self::line_timeout(wait), &mut run, progress)
            .await;

        match stop {
            Stop::Exited => match child.wait().await {
                Ok(status) if !status.success() && run.hops.is_empty() => {
                    let message = format!(
                        "Traceroute finished with error code {}",
                        status.code().unwrap_or(-1)
                    );
                    run.error = Some(message.clone());
                    progress.emit(TraceEvent::Error { message });
                }
                Ok(_) => {}
                Err(e) => run.error = Some(e.to_string()),
            },
            Stop::Cancelled => {
                run.stopped = true;
                terminate(&mut child).await;
            }
            Stop::Failed(message) => {
                terminate(&mut child).await;
                run.error = Some(message.clone());
                progress.emit(TraceEvent::Error { message });
            }
        }

        self.logger
            .debug(&format!("Trace to {} finished with {} hops", target, run.hops.len()))
            .field("stopped", run.stopped)
            .log()
            .await;

        progress.emit(TraceEvent::Finished {
            hops: run.hops.len(),
            stopped: run.stopped,
        });
        run
    }

    async fn read_hops(
        &self,
        child: &mut Child,
        line_timeout: Duration,
        run: &mut TraceRun,
        progress: &ProgressSender<TraceEvent>,
    ) -> Stop {
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Stop::Failed("traceroute output was not captured".to_string());
        };
        let mut out_lines = BufReader::new(stdout).lines();
        let mut err_lines = BufReader::new(stderr).lines();
        let mut err_open = true;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Stop::Cancelled,
                next = time::timeout(line_timeout, out_lines.next_line()) => match next {
                    Ok(Ok(Some(line))) => {
                        if let Some(hop) = self.platform.parse_trace_line(&line) {
                            run.hops.push(hop.clone());
                            progress.emit(TraceEvent::Hop(hop));
                        }
                    }
                    Ok(Ok(None)) => return Stop::Exited,
                    Ok(Err(e)) => {
                        return Stop::Failed(format!("Failed to read traceroute output: {}", e));
                    }
                    Err(_) => {
                        return Stop::Failed(format!(
                            "No traceroute output for {} seconds",
                            line_timeout.as_secs()
                        ))
                    }
                },
                line = err_lines.next_line(), if err_open => match line {
                    Ok(Some(line)) => {
                        if let Some(hop) = self.platform.parse_trace_line(&line) {
                            run.hops.push(hop.clone());
                            progress.emit(TraceEvent::Hop(hop));
                        }
                    }
                    _ => err_open = false,
                },
            }
        }
    }

    fn fail(
        &self,
        mut run: TraceRun,
        message: String,
        progress: &ProgressSender<TraceEvent>,
    ) -> TraceRun {
        run.error = Some(message.clone());
        progress.emit(TraceEvent::Error { message });
        progress.emit(TraceEvent::Finished { hops: 0, stopped: false });
        run
    }
}

/// Kill the child and reap it
async fn terminate(child: &mut Child) {
    let _ = child.start_kill();
    let _ = child.wait().await;
}
