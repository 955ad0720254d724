//! Ping tester: repeated single echo requests through the OS `ping` utility

use crate::command::CommandRunner;
use crate::logging::Logger;
use crate::models::{PingAttempt, PingResult};
use crate::platform::{PingReply, PlatformAdapter};
use crate::progress::ProgressSender;
use crate::stats::ping_statistics;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pause between consecutive attempts
pub const PING_INTERVAL: Duration = Duration::from_secs(1);

/// Extra time the runner is given on top of the ping's own reply timeout
const RUNNER_GRACE: Duration = Duration::from_secs(1);

pub struct PingTester {
    runner: Arc<dyn CommandRunner>,
    platform: Arc<dyn PlatformAdapter>,
    logger: Arc<Logger>,
    interval: Duration,
}

impl PingTester {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        platform: Arc<dyn PlatformAdapter>,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            runner,
            platform,
            logger,
            interval: PING_INTERVAL,
        }
    }

    /// Override the pause between attempts
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// One echo request; the returned attempt never carries an error
    pub async fn ping_once(&self, host: &str, sequence: u32, timeout: Duration) -> PingAttempt {
        let spec = self.platform.ping_command(host, timeout);
        match self.runner.run(&spec, timeout + RUNNER_GRACE).await {
            Ok(output) => match self.platform.parse_ping_reply(output.exit_code, &output.stdout) {
                PingReply::Reply { time_ms, ttl } => PingAttempt::reply(sequence, time_ms, ttl),
                PingReply::NoReply => PingAttempt::timeout(sequence, "no reply"),
                PingReply::Unparsable => {
                    self.logger
                        .debug("Ping exited successfully but no round-trip time was found")
                        .field("host", host)
                        .field("output", output.stdout.trim())
                        .log()
                        .await;
                    PingAttempt::timeout(sequence, "unparsable reply")
                }
            },
            Err(e) => PingAttempt::timeout(sequence, e.to_string()),
        }
    }

    /// Ping `host` `count` times, sequentially, pausing between attempts
    ///
    /// A human-readable line is emitted after every attempt. Cancellation stops
    /// the run early and abandons the attempt in flight; statistics cover the
    /// attempts that completed.
    pub async fn ping_host(
        &self,
        host: &str,
        count: u32,
        timeout: Duration,
        progress: &ProgressSender<String>,
        cancel: &CancellationToken,
    ) -> PingResult {
        let host = host.trim();
        if host.is_empty() {
            return PingResult::failed(host, "Host must not be empty");
        }

        self.logger
            .debug(&format!("Pinging {} ({} attempts)", host, count))
            .field("host", host)
            .field("count", count)
            .log()
            .await;

        let mut attempts = Vec::with_capacity(count as usize);
        for sequence in 1..=count {
            if cancel.is_cancelled() {
                break;
            }

            // Dropping the in-flight runner future kills the ping child
            let attempt = tokio::select! {
                _ = cancel.cancelled() => break,
                attempt = self.ping_once(host, sequence, timeout) => attempt,
            };
            progress.emit(attempt_line(host, &attempt));
            attempts.push(attempt);

            if sequence < count {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
        }

        let statistics = ping_statistics(&attempts);
        self.logger
            .info(&format!(
                "Ping {} finished: {}/{} replies",
                host, statistics.received, statistics.sent
            ))
            .field("success_rate", statistics.success_rate)
            .log()
            .await;

        PingResult {
            host: host.to_string(),
            attempts,
            statistics,
            error: None,
        }
    }
}

/// `Reply from 8.8.8.8: time=12.0ms TTL=117` or `Request timeout for 8.8.8.8`
pub fn attempt_line(host: &str, attempt: &PingAttempt) -> String {
    match attempt.time_ms {
        Some(time) => {
            let mut line = format!("Reply from {}: time={:.1}ms", host, time);
            if let Some(ttl) = attempt.ttl {
                line.push_str(&format!(" TTL={}", ttl));
            }
            line
        }
        None => format!("Request timeout for {}", host),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::fake::FakeRunner;
    use crate::models::AttemptStatus;
    use crate::platform::LinuxPlatform;
    use crate::progress::drain;

    fn tester(runner: FakeRunner) -> PingTester {
        PingTester::new(Arc::new(runner), Arc::new(LinuxPlatform), Arc::new(Logger::quiet("PING")))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_host_counts() {
        let reply = "64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=3.5 ms";
        let runner = FakeRunner::new().on("ping -c 1 -W 2 10.0.0.1", 0, reply);
        let (tx, mut rx) = ProgressSender::channel();

        let result = tester(runner)
            .ping_host("10.0.0.1", 3, Duration::from_secs(2), &tx, &CancellationToken::new())
            .await;

        assert_eq!(result.statistics.sent, 3);
        assert_eq!(result.statistics.received, 3);
        assert_eq!(result.statistics.success_rate, 100.0);
        let lines = drain(&mut rx);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Reply from 10.0.0.1: time=3.5ms TTL=64");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparsable_and_no_reply_are_timeouts() {
        let runner = FakeRunner::new()
            .on("ping -c 1 -W 1 a.host", 0, "garbled")
            .on("ping -c 1 -W 1 b.host", 1, "");
        let ping = tester(runner);

        let unparsable = ping.ping_once("a.host", 1, Duration::from_secs(1)).await;
        assert_eq!(unparsable.status, AttemptStatus::Timeout);
        assert_eq!(unparsable.detail.as_deref(), Some("unparsable reply"));

        let lost = ping.ping_once("b.host", 1, Duration::from_secs(1)).await;
        assert_eq!(lost.detail.as_deref(), Some("no reply"));
    }

    #[tokio::test]
    async fn test_empty_host_fails_immediately() {
        let runner = FakeRunner::new();
        let ping = tester(runner);
        let (progress, cancel) = (ProgressSender::disabled(), CancellationToken::new());
        let result = ping
            .ping_host("  ", 4, Duration::from_secs(1), &progress, &cancel)
            .await;
        assert!(result.error.is_some());
        assert_eq!(result.statistics.sent, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_failure_is_recorded() {
        let ping = tester(FakeRunner::new().fail("ping *", "ping not found"));
        let (progress, cancel) = (ProgressSender::disabled(), CancellationToken::new());
        let result = ping
            .ping_host("10.0.0.1", 2, Duration::from_secs(1), &progress, &cancel)
            .await;
        assert_eq!(result.statistics.lost, 2);
        assert!(result.error.is_none());
        assert!(result.attempts[0].detail.as_deref().unwrap().contains("not found"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ping = tester(FakeRunner::new().on("ping *", 0, "time=1 ms"));
        let result = ping
            .ping_host("10.0.0.1", 4, Duration::from_secs(1), &ProgressSender::disabled(), &cancel)
            .await;
        assert_eq!(result.statistics.sent, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_abandons_attempt_in_flight() {
        let runner = FakeRunner::new()
            .on("ping *", 0, "64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=1.0 ms")
            .slow(Duration::from_secs(3));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let result = tester(runner)
            .ping_host("10.0.0.1", 4, Duration::from_secs(2), &ProgressSender::disabled(), &cancel)
            .await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(result.statistics.sent, 0);
        assert!(result.attempts.is_empty());
    }

    #[test]
    fn test_attempt_line() {
        assert_eq!(
            attempt_line("h", &PingAttempt::timeout(1, "no reply")),
            "Request timeout for h"
        );
        assert_eq!(
            attempt_line("h", &PingAttempt::reply(1, 0.5, None)),
            "Reply from h: time=0.5ms"
        );
    }
}
