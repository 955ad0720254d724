//! Speed tester: drives a bandwidth client through its measurement phases

pub mod client;

use crate::error::AppError;
use crate::logging::Logger;
use crate::models::{round2, SpeedTestResult};
use crate::progress::ProgressSender;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use client::{
    BandwidthClient, ChunkCallback, HttpBandwidthClient, SpeedServer, UnavailableClient,
};

pub const MSG_INIT: &str = "Initializing speed test...";
pub const MSG_SERVER: &str = "Finding best server...";
pub const MSG_PING: &str = "Testing ping...";
pub const MSG_DOWNLOAD: &str = "Testing download speed...";
pub const MSG_UPLOAD: &str = "Testing upload speed...";
pub const MSG_DONE: &str = "Speed test completed!";

/// Phase progress: a percentage in 0..=100 and what is happening
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeedProgress {
    pub percent: u8,
    pub message: String,
}

/// Maps chunk completion into `start..=end`, forwarding only steps of at least 5
pub struct PhaseThrottle {
    start: u8,
    end: u8,
    last: AtomicU8,
}

impl PhaseThrottle {
    pub const MIN_STEP: u8 = 5;

    pub fn new(start: u8, end: u8) -> Self {
        Self {
            start,
            end,
            last: AtomicU8::new(start),
        }
    }

    /// Percentage to report for `completed` of `total` chunks, if it moved enough
    pub fn update(&self, completed: u32, total: u32) -> Option<u8> {
        if total == 0 {
            return None;
        }
        let span = u32::from(self.end - self.start);
        let progress = self.start as u32 + completed.min(total) * span / total;
        let progress = progress.min(u32::from(self.end)) as u8;

        let last = self.last.load(Ordering::Acquire);
        if progress >= last.saturating_add(Self::MIN_STEP) {
            self.last.store(progress, Ordering::Release);
            Some(progress)
        } else {
            None
        }
    }
}

pub struct SpeedTester {
    client: Arc<dyn BandwidthClient>,
    logger: Arc<Logger>,
    cancel: CancellationToken,
}

impl SpeedTester {
    pub fn new(client: Arc<dyn BandwidthClient>, logger: Arc<Logger>) -> Self {
        Self {
            client,
            logger,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Request cooperative cancellation; checked between phases and chunks
    pub fn stop_test(&self) {
        self.cancel.cancel();
    }

    /// Run every phase in order; never fails, errors land in `result.error`
    pub async fn perform_speed_test(
        &self,
        progress: &ProgressSender<SpeedProgress>,
    ) -> SpeedTestResult {
        let mut result = SpeedTestResult::default();
        let emit = |percent: u8, message: &str| {
            progress.emit(SpeedProgress {
                percent,
                message: message.to_string(),
            })
        };

        emit(10, MSG_INIT);
        if self.stopped(&mut result) {
            return result;
        }

        emit(20, MSG_SERVER);
        let server = match self.client.best_server().await {
            Ok(server) => server,
            Err(e) => return self.fail(result, e, progress).await,
        };
        self.logger
            .info(&format!("Selected speed test server {}", server.info.name))
            .field("url", server.url.as_str())
            .log()
            .await;
        result.server = Some(server.info.clone());
        if self.stopped(&mut result) {
            return result;
        }

        emit(30, MSG_PING);
        match self.client.latency(&server).await {
            Ok(ms) => result.ping_ms = Some(round2(ms)),
            Err(e) => return self.fail(result, e, progress).await,
        }
        if self.stopped(&mut result) {
            return result;
        }

        emit(40, MSG_DOWNLOAD);
        let throttle = PhaseThrottle::new(40, 70);
        let on_chunk = |done: u32, total: u32| {
            if let Some(percent) = throttle.update(done, total) {
                emit(percent, MSG_DOWNLOAD);
            }
        };
        match self.client.download(&server, &on_chunk, &self.cancel).await {
            Ok(bps) => result.download_mbps = Some(round2(bps / 1_000_000.0)),
            Err(e) => return self.fail(result, e, progress).await,
        }
        if self.stopped(&mut result) {
            return result;
        }

        emit(70, MSG_UPLOAD);
        let throttle = PhaseThrottle::new(70, 95);
        let on_chunk = |done: u32, total: u32| {
            if let Some(percent) = throttle.update(done, total) {
                emit(percent, MSG_UPLOAD);
            }
        };
        match self.client.upload(&server, &on_chunk, &self.cancel).await {
            Ok(bps) => result.upload_mbps = Some(round2(bps / 1_000_000.0)),
            Err(e) => return self.fail(result, e, progress).await,
        }

        emit(100, MSG_DONE);
        self.logger
            .info("Speed test completed")
            .field("download_mbps", result.download_mbps)
            .field("upload_mbps", result.upload_mbps)
            .field("ping_ms", result.ping_ms)
            .log()
            .await;
        result
    }

    fn stopped(&self, result: &mut SpeedTestResult) -> bool {
        if self.cancel.is_cancelled() {
            result.cancelled = true;
        }
        result.cancelled
    }

    async fn fail(
        &self,
        mut result: SpeedTestResult,
        error: AppError,
        progress: &ProgressSender<SpeedProgress>,
    ) -> SpeedTestResult {
        if matches!(error, AppError::Cancelled(_)) {
            result.cancelled = true;
            return result;
        }

        let message = match &error {
            AppError::SpeedTest(m) => format!("Speedtest Error: {}", m),
            other => format!("Speedtest Error: {}", other),
        };
        self.logger.warn(&message).error_info(&error).log().await;
        progress.emit(SpeedProgress {
            percent: 100,
            message: message.clone(),
        });
        result.error = Some(message);
        result
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted bandwidth client

    use super::*;
    use crate::error::Result;
    use crate::models::ServerInfo;
    use async_trait::async_trait;

    #[derive(Clone, Copy, PartialEq)]
    pub enum FailAt {
        Nowhere,
        Server,
        Download,
    }

    pub struct FakeClient {
        pub fail_at: FailAt,
        pub chunks: u32,
        /// Cancel this token once the download has run
        pub cancel_after_download: Option<CancellationToken>,
    }

    impl FakeClient {
        pub fn new(fail_at: FailAt) -> Self {
            Self { fail_at, chunks: 20, cancel_after_download: None }
        }
    }

    #[async_trait]
    impl BandwidthClient for FakeClient {
        async fn best_server(&self) -> Result<SpeedServer> {
            if self.fail_at == FailAt::Server {
                return Err(AppError::speed_test("Unable to connect to servers to test latency."));
            }
            Ok(SpeedServer {
                url: url::Url::parse("http://speed.test").unwrap(),
                info: ServerInfo {
                    name: "Test".to_string(),
                    sponsor: "Example ISP".to_string(),
                    country: "NL".to_string(),
                    distance_km: 0.0,
                },
                latency_ms: 5.0,
            })
        }

        async fn latency(&self, _server: &SpeedServer) -> Result<f64> {
            Ok(12.346)
        }

        async fn download(
            &self,
            _s: &SpeedServer,
            on_chunk: ChunkCallback<'_>,
            _c: &CancellationToken,
        ) -> Result<f64> {
            if self.fail_at == FailAt::Download {
                return Err(AppError::network("connection reset"));
            }
            for i in 1..=self.chunks {
                on_chunk(i, self.chunks);
            }
            if let Some(token) = &self.cancel_after_download {
                token.cancel();
            }
            Ok(93_456_000.0)
        }

        async fn upload(
            &self,
            _s: &SpeedServer,
            on_chunk: ChunkCallback<'_>,
            _c: &CancellationToken,
        ) -> Result<f64> {
            for i in 1..=self.chunks {
                on_chunk(i, self.chunks);
            }
            Ok(11_000_000.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{FailAt, FakeClient};
    use super::*;
    use crate::progress::drain;

    fn tester(client: FakeClient) -> SpeedTester {
        SpeedTester::new(Arc::new(client), Arc::new(Logger::quiet("SPEED")))
    }

    #[tokio::test]
    async fn test_full_run() {
        let (tx, mut rx) = ProgressSender::channel();
        let result = tester(FakeClient::new(FailAt::Nowhere)).perform_speed_test(&tx).await;

        assert_eq!(result.download_mbps, Some(93.46));
        assert_eq!(result.upload_mbps, Some(11.0));
        assert_eq!(result.ping_ms, Some(12.35));
        assert!(result.is_complete());

        let events = drain(&mut rx);
        let percents: Vec<u8> = events.iter().map(|e| e.percent).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
        assert_eq!(events.last().unwrap().message, MSG_DONE);
        assert!(events.iter().all(|e| e.percent <= 100));
    }

    #[tokio::test]
    async fn test_error_keeps_partial_fields() {
        let (tx, mut rx) = ProgressSender::channel();
        let result = tester(FakeClient::new(FailAt::Download)).perform_speed_test(&tx).await;

        assert_eq!(result.ping_ms, Some(12.35));
        assert!(result.server.is_some());
        assert!(result.download_mbps.is_none());
        assert!(result.error.as_deref().unwrap().starts_with("Speedtest Error:"));

        let last = drain(&mut rx).pop().unwrap();
        assert_eq!(last.percent, 100);
    }

    #[tokio::test]
    async fn test_server_failure() {
        let result = tester(FakeClient::new(FailAt::Server))
            .perform_speed_test(&ProgressSender::disabled())
            .await;
        assert!(result.server.is_none());
        assert_eq!(
            result.error.as_deref(),
            Some("Speedtest Error: Unable to connect to servers to test latency.")
        );
    }

    #[tokio::test]
    async fn test_unbuildable_client_reports_error() {
        let cause = AppError::config("No speed test servers configured");
        let client = Arc::new(UnavailableClient::new(&cause));
        let tester = SpeedTester::new(client, Arc::new(Logger::quiet("SPEED")));
        let (tx, mut rx) = ProgressSender::channel();
        let result = tester.perform_speed_test(&tx).await;

        let error = result.error.as_deref().unwrap();
        assert!(error.starts_with("Speedtest Error:"));
        assert!(error.contains("No speed test servers configured"));
        assert!(!result.cancelled);
        assert_eq!(drain(&mut rx).pop().unwrap().percent, 100);
    }

    #[tokio::test]
    async fn test_cancel_between_phases() {
        let cancel = CancellationToken::new();
        let mut client = FakeClient::new(FailAt::Nowhere);
        client.cancel_after_download = Some(cancel.clone());

        let result = tester(client)
            .with_cancel(cancel)
            .perform_speed_test(&ProgressSender::disabled())
            .await;
        assert!(result.cancelled);
        assert!(result.download_mbps.is_some());
        assert!(result.upload_mbps.is_none());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_throttle_steps_and_cap() {
        let throttle = PhaseThrottle::new(40, 70);
        let emitted: Vec<u8> = (1..=20).filter_map(|i| throttle.update(i, 20)).collect();
        assert!(emitted.windows(2).all(|w| w[1] >= w[0] + PhaseThrottle::MIN_STEP));
        assert_eq!(emitted.last(), Some(&70));
        assert!(emitted.iter().all(|p| (40..=70).contains(p)));
    }
}
