//! Connectivity probe primitives
//!
//! The detector only talks to `ConnectivityProbe`, so its classification
//! logic can be driven by canned answers in tests.

pub mod tcp;

use crate::command::CommandRunner;
use crate::error::{AppError, Result};
use crate::logging::ProbeLogger;
use crate::models::Config;
use crate::platform::{PingReply, PlatformAdapter};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use trust_dns_resolver::{system_conf, TokioAsyncResolver};

pub use tcp::{can_connect, probe_port};

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Raw TCP reachability of a public resolver AND a successful HTTP fetch
    async fn internet(&self) -> Result<bool>;

    /// One echo request to `host`
    async fn ping_reachable(&self, host: &str, timeout: Duration) -> Result<bool>;

    /// Whether `hostname` resolves to at least one address
    async fn resolves(&self, hostname: &str) -> Result<bool>;
}

/// Probes backed by real sockets, HTTP and the OS ping utility
pub struct SystemProbes {
    runner: Arc<dyn CommandRunner>,
    platform: Arc<dyn PlatformAdapter>,
    /// A client that failed to build turns the Internet check into an error
    http: std::result::Result<Client, String>,
    check_addr: String,
    check_url: String,
    timeout: Duration,
    logger: ProbeLogger,
}

impl SystemProbes {
    pub fn new(
        config: &Config,
        runner: Arc<dyn CommandRunner>,
        platform: Arc<dyn PlatformAdapter>,
        logger: ProbeLogger,
    ) -> Self {
        let timeout = crate::defaults::INTERNET_CHECK_TIMEOUT;
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e));

        Self {
            runner,
            platform,
            http,
            check_addr: config.internet_check_addr.clone(),
            check_url: config.internet_check_url.clone(),
            timeout,
            logger,
        }
    }

    async fn lookup(&self, hostname: &str) -> Result<usize> {
        match system_conf::read_system_conf() {
            Ok((config, opts)) => {
                let resolver = TokioAsyncResolver::tokio(config, opts);
                let response = resolver.lookup_ip(hostname).await?;
                Ok(response.iter().count())
            }
            Err(e) => {
                // No usable resolver configuration; fall back to the OS resolver
                self.logger.log_degraded("system DNS configuration", &AppError::from(e)).await;
                let addrs = tokio::net::lookup_host((hostname, 0)).await?;
                Ok(addrs.count())
            }
        }
    }
}

#[async_trait]
impl ConnectivityProbe for SystemProbes {
    async fn internet(&self) -> Result<bool> {
        let http = self.http.as_ref().map_err(|e| AppError::network(e.clone()))?;
        if let Err(e) = can_connect(&self.check_addr, self.timeout).await {
            self.logger.log_connection(&self.check_addr, false, Some(&e.to_string())).await;
            return Ok(false);
        }
        self.logger.log_connection(&self.check_addr, true, None).await;

        match http.get(&self.check_url).send().await {
            Ok(_) => {
                self.logger.log_connection(&self.check_url, true, None).await;
                Ok(true)
            }
            Err(e) => {
                self.logger.log_connection(&self.check_url, false, Some(&e.to_string())).await;
                Ok(false)
            }
        }
    }

    async fn ping_reachable(&self, host: &str, timeout: Duration) -> Result<bool> {
        let spec = self.platform.ping_command(host, timeout);
        let output = self.runner.run(&spec, timeout + Duration::from_secs(1)).await?;
        let reply = self.platform.parse_ping_reply(output.exit_code, &output.stdout);
        Ok(matches!(reply, PingReply::Reply { .. }))
    }

    async fn resolves(&self, hostname: &str) -> Result<bool> {
        match self.lookup(hostname).await {
            Ok(count) => Ok(count > 0),
            Err(e) => {
                self.logger.log_connection(hostname, false, Some(&e.to_string())).await;
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted connectivity answers for detector and troubleshooter tests

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeProbes {
        pub internet: Option<bool>,
        /// Hosts that answer pings; unknown hosts do not
        pub reachable: HashMap<String, bool>,
        /// Hosts whose ping fails outright, as when the runner times out
        pub broken: Vec<String>,
        pub resolves: Option<bool>,
        pub pinged: Mutex<Vec<String>>,
    }

    impl FakeProbes {
        pub fn online() -> Self {
            Self {
                internet: Some(true),
                resolves: Some(true),
                ..Self::default()
            }
        }

        pub fn reach(mut self, host: &str, up: bool) -> Self {
            self.reachable.insert(host.to_string(), up);
            self
        }

        pub fn broken(mut self, host: &str) -> Self {
            self.broken.push(host.to_string());
            self
        }
    }

    #[async_trait]
    impl ConnectivityProbe for FakeProbes {
        async fn internet(&self) -> Result<bool> {
            self.internet.ok_or_else(|| AppError::internal("internet probe unavailable"))
        }

        async fn ping_reachable(&self, host: &str, _timeout: Duration) -> Result<bool> {
            self.pinged.lock().unwrap().push(host.to_string());
            if self.broken.iter().any(|h| h == host) {
                return Err(AppError::timeout("ping runner timed out"));
            }
            Ok(self.reachable.get(host).copied().unwrap_or(false))
        }

        async fn resolves(&self, _hostname: &str) -> Result<bool> {
            self.resolves.ok_or_else(|| AppError::dns_resolution("resolver unavailable"))
        }
    }
}
