//! Bandwidth measurement client
//!
//! `HttpBandwidthClient` talks to Cloudflare-style speed endpoints:
//! `GET /meta` for server details, `GET /__down?bytes=N` for download and
//! `POST /__up` for upload.

use crate::error::{AppError, Result};
use crate::models::{round2, ServerInfo};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Called after each transferred chunk with `(completed, total)`
pub type ChunkCallback<'a> = &'a (dyn Fn(u32, u32) + Send + Sync);

/// A measurement server chosen by `best_server`
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedServer {
    pub url: Url,
    pub info: ServerInfo,
    /// Round trip measured while selecting the server
    pub latency_ms: f64,
}

#[async_trait]
pub trait BandwidthClient: Send + Sync {
    async fn best_server(&self) -> Result<SpeedServer>;

    /// Round-trip latency in milliseconds
    async fn latency(&self, server: &SpeedServer) -> Result<f64>;

    /// Download throughput in bits per second
    async fn download(
        &self,
        server: &SpeedServer,
        on_chunk: ChunkCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<f64>;

    /// Upload throughput in bits per second
    async fn upload(
        &self,
        server: &SpeedServer,
        on_chunk: ChunkCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<f64>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerMeta {
    colo: Option<String>,
    city: Option<String>,
    country: Option<String>,
    as_organization: Option<String>,
}

pub struct HttpBandwidthClient {
    http: Client,
    servers: Vec<Url>,
    chunks: u32,
    chunk_bytes: u64,
}

const LATENCY_SAMPLES: usize = 3;

impl HttpBandwidthClient {
    pub fn new(
        servers: &[String],
        chunks: u32,
        chunk_bytes: u64,
        timeout: Duration,
    ) -> Result<Self> {
        if servers.is_empty() {
            return Err(AppError::config("No speed test servers configured"));
        }
        let servers = servers
            .iter()
            .map(|s| Url::parse(s))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::speed_test(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            servers,
            chunks: chunks.max(1),
            chunk_bytes,
        })
    }

    fn endpoint(base: &Url, path: &str) -> Url {
        let mut url = base.clone();
        url.set_path(&format!("{}/{}", base.path().trim_end_matches('/'), path));
        url
    }

    /// Time one empty download request
    async fn round_trip(&self, base: &Url) -> Result<f64> {
        let mut url = Self::endpoint(base, "__down");
        url.set_query(Some("bytes=0"));

        let started = Instant::now();
        self.http.get(url).send().await?.error_for_status()?.bytes().await?;
        Ok(started.elapsed().as_secs_f64() * 1000.0)
    }

    async fn probe_server(&self, base: &Url) -> Result<SpeedServer> {
        let started = Instant::now();
        let response = self
            .http
            .get(Self::endpoint(base, "meta"))
            .send()
            .await?
            .error_for_status()?;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        let meta: ServerMeta = response.json().await.unwrap_or_default();

        let host = base.host_str().unwrap_or("unknown").to_string();
        let name = match (meta.city, meta.colo) {
            (Some(city), Some(colo)) => format!("{} ({})", city, colo),
            (Some(city), None) => city,
            (None, Some(colo)) => colo,
            (None, None) => host.clone(),
        };

        Ok(SpeedServer {
            url: base.clone(),
            info: ServerInfo {
                name,
                sponsor: meta.as_organization.unwrap_or(host),
                country: meta.country.unwrap_or_else(|| "Unknown".to_string()),
                distance_km: 0.0,
            },
            latency_ms,
        })
    }
}

fn bits_per_second(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64().max(1e-6);
    bytes as f64 * 8.0 / secs
}

#[async_trait]
impl BandwidthClient for HttpBandwidthClient {
    async fn best_server(&self) -> Result<SpeedServer> {
        let mut best: Option<SpeedServer> = None;
        let mut last_error = None;

        for base in &self.servers {
            match self.probe_server(base).await {
                Ok(server) if best.as_ref().map_or(true, |b| server.latency_ms < b.latency_ms) => {
                    best = Some(server)
                }
                Ok(_) => {}
                Err(e) => last_error = Some(e),
            }
        }

        best.ok_or_else(|| {
            AppError::speed_test(format!(
                "Unable to reach any speed test server{}",
                last_error.map(|e| format!(": {}", e)).unwrap_or_default()
            ))
        })
    }

    async fn latency(&self, server: &SpeedServer) -> Result<f64> {
        let mut best = f64::MAX;
        for _ in 0..LATENCY_SAMPLES {
            best = best.min(self.round_trip(&server.url).await?);
        }
        Ok(round2(best))
    }

    async fn download(
        &self,
        server: &SpeedServer,
        on_chunk: ChunkCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<f64> {
        let mut url = Self::endpoint(&server.url, "__down");
        url.set_query(Some(&format!("bytes={}", self.chunk_bytes)));

        let started = Instant::now();
        let mut total: u64 = 0;
        for chunk in 1..=self.chunks {
            if cancel.is_cancelled() {
                return Err(AppError::cancelled("download stopped"));
            }
            let response = self.http.get(url.clone()).send().await?.error_for_status()?;
            let mut body = response.bytes_stream();
            while let Some(piece) = body.next().await {
                total += piece?.len() as u64;
            }
            on_chunk(chunk, self.chunks);
        }

        Ok(bits_per_second(total, started.elapsed()))
    }

    async fn upload(
        &self,
        server: &SpeedServer,
        on_chunk: ChunkCallback<'_>,
        cancel: &CancellationToken,
    ) -> Result<f64> {
        let url = Self::endpoint(&server.url, "__up");
        let payload = vec![0u8; self.chunk_bytes as usize];

        let started = Instant::now();
        let mut total: u64 = 0;
        for chunk in 1..=self.chunks {
            if cancel.is_cancelled() {
                return Err(AppError::cancelled("upload stopped"));
            }
            self.http
                .post(url.clone())
                .body(payload.clone())
                .send()
                .await?
                .error_for_status()?;
            total += payload.len() as u64;
            on_chunk(chunk, self.chunks);
        }

        Ok(bits_per_second(total, started.elapsed()))
    }
}

/// Stands in when the HTTP client could not be built; every phase fails with the cause
pub struct UnavailableClient {
    reason: String,
}

impl UnavailableClient {
    pub fn new(error: &AppError) -> Self {
        Self {
            reason: error.to_string(),
        }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(AppError::speed_test(self.reason.clone()))
    }
}

#[async_trait]
impl BandwidthClient for UnavailableClient {
    async fn best_server(&self) -> Result<SpeedServer> {
        self.fail()
    }

    async fn latency(&self, _server: &SpeedServer) -> Result<f64> {
        self.fail()
    }

    async fn download(
        &self,
        _server: &SpeedServer,
        _on_chunk: ChunkCallback<'_>,
        _cancel: &CancellationToken,
    ) -> Result<f64> {
        self.fail()
    }

    async fn upload(
        &self,
        _server: &SpeedServer,
        _on_chunk: ChunkCallback<'_>,
        _cancel: &CancellationToken,
    ) -> Result<f64> {
        self.fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_paths() {
        let base = Url::parse("https://speed.example.com").unwrap();
        assert_eq!(
            HttpBandwidthClient::endpoint(&base, "__down").as_str(),
            "https://speed.example.com/__down"
        );

        let nested = Url::parse("http://127.0.0.1:8080/speed/").unwrap();
        assert_eq!(
            HttpBandwidthClient::endpoint(&nested, "meta").as_str(),
            "http://127.0.0.1:8080/speed/meta"
        );
    }

    #[test]
    fn test_bits_per_second() {
        assert_eq!(bits_per_second(1_000_000, Duration::from_secs(1)), 8_000_000.0);
    }

    #[test]
    fn test_requires_servers() {
        assert!(HttpBandwidthClient::new(&[], 1, 10, Duration::from_secs(1)).is_err());
        let bad = ["not a url".to_string()];
        assert!(HttpBandwidthClient::new(&bad, 1, 10, Duration::from_secs(1)).is_err());
    }
}
