//! Network detector: snapshot collection and rule-based diagnosis
//!
//! `collect` gathers hostname, interfaces, gateways and DNS servers and runs
//! the Internet, Local Network and DNS Resolution checks concurrently.
//! `diagnose` folds a snapshot into issues, see [`diagnosis`].

pub mod diagnosis;

use crate::command::CommandRunner;
use crate::error::{AppError, Result};
use crate::logging::{Logger, ProbeLogger};
use crate::models::{
    ConnectionCheck, ConnectionStatus, Config, DetectionOutcome, Diagnosis, Interface,
    NetworkSnapshot,
};
use crate::platform::PlatformAdapter;
use crate::probe::ConnectivityProbe;
use chrono::Utc;
use if_addrs::IfAddr;
use ipnet::Ipv4Net;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;

const UNKNOWN_HOSTNAME: &str = "Unknown";

/// One IPv4 address bound to an interface
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceAddr {
    pub name: String,
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

/// Enumerates interface addresses; swapped out in tests
pub type AddressLister = fn() -> Result<Vec<InterfaceAddr>>;

/// IPv4 addresses of every interface, as reported by the OS
pub fn system_addresses() -> Result<Vec<InterfaceAddr>> {
    let addrs = if_addrs::get_if_addrs()
        .map_err(|e| AppError::io(format!("Failed to enumerate interfaces: {}", e)))?;

    Ok(addrs
        .into_iter()
        .filter_map(|iface| match iface.addr {
            IfAddr::V4(v4) => Some(InterfaceAddr {
                name: iface.name,
                ip: v4.ip,
                netmask: v4.netmask,
            }),
            IfAddr::V6(_) => None,
        })
        .collect())
}

pub struct NetworkDetector {
    runner: Arc<dyn CommandRunner>,
    platform: Arc<dyn PlatformAdapter>,
    probes: Arc<dyn ConnectivityProbe>,
    logger: Arc<Logger>,
    probe_logger: ProbeLogger,
    config: Config,
    addresses: AddressLister,
}

impl NetworkDetector {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        platform: Arc<dyn PlatformAdapter>,
        probes: Arc<dyn ConnectivityProbe>,
        logger: Arc<Logger>,
        config: Config,
    ) -> Self {
        Self {
            runner,
            platform,
            probes,
            probe_logger: ProbeLogger::new(logger.clone()),
            logger,
            config,
            addresses: system_addresses,
        }
    }

    /// Replace the interface address enumeration
    pub fn with_addresses(mut self, addresses: AddressLister) -> Self {
        self.addresses = addresses;
        self
    }

    /// Capture the current network configuration and connectivity
    ///
    /// Gateway and DNS discovery failures leave those lists empty. Only when
    /// neither the hostname nor the interfaces can be determined is the whole
    /// pass reported as failed.
    pub async fn collect(&self) -> DetectionOutcome {
        let started = Instant::now();

        let (hostname, interfaces) = match (self.hostname().await, self.interfaces().await) {
            (Err(host_err), Err(iface_err)) => {
                let error = format!(
                    "Unable to determine hostname ({}) or interfaces ({})",
                    host_err, iface_err
                );
                self.logger.error(&error).error_info(&iface_err).log().await;
                return DetectionOutcome::Failed { error };
            }
            (hostname, interfaces) => {
                let hostname = match hostname {
                    Ok(name) => name,
                    Err(e) => {
                        self.probe_logger.log_degraded("hostname", &e).await;
                        UNKNOWN_HOSTNAME.to_string()
                    }
                };
                let interfaces = match interfaces {
                    Ok(list) => list,
                    Err(e) => {
                        self.probe_logger.log_degraded("network interfaces", &e).await;
                        Vec::new()
                    }
                };
                (hostname, interfaces)
            }
        };

        let gateways = self.gateways().await;
        let dns_servers = self.dns_servers().await;
        let connection_checks = self.connection_checks(&gateways).await;

        for check in &connection_checks {
            self.probe_logger
                .log_check(&check.description, &check.status.to_string())
                .await;
        }

        let snapshot = NetworkSnapshot {
            hostname,
            gateways,
            dns_servers,
            interfaces,
            connection_checks,
            timestamp: Utc::now(),
        };

        self.logger
            .info("Network snapshot collected")
            .field("interfaces", snapshot.interfaces.len())
            .field("gateways", &snapshot.gateways)
            .elapsed(started.elapsed())
            .log()
            .await;

        DetectionOutcome::Snapshot(snapshot)
    }

    /// Apply the diagnosis rules to a snapshot, re-probing where a rule needs it
    pub async fn diagnose(&self, snapshot: &NetworkSnapshot) -> Diagnosis {
        let issues = diagnosis::evaluate(snapshot, self.probes.as_ref(), &self.config).await;
        let diagnosis = Diagnosis::from_issues(issues);

        self.logger
            .info(&format!("Diagnosis: {}", diagnosis.status))
            .field("issues", diagnosis.issues.len())
            .log()
            .await;

        diagnosis
    }

    async fn hostname(&self) -> Result<String> {
        let text = self
            .runner
            .fetch(&self.platform.hostname_source(), crate::defaults::COMMAND_TIMEOUT)
            .await?;
        let name = text.trim();
        if name.is_empty() {
            return Err(AppError::parse("hostname is empty"));
        }
        Ok(name.to_string())
    }

    /// IPv4 interfaces merged with link-layer details by name
    async fn interfaces(&self) -> Result<Vec<Interface>> {
        let addresses = (self.addresses)()?;

        let links = match self
            .runner
            .fetch(&self.platform.link_source(), crate::defaults::COMMAND_TIMEOUT)
            .await
        {
            Ok(text) => self.platform.parse_links(&text),
            Err(e) => {
                self.probe_logger.log_degraded("link-layer details", &e).await;
                Vec::new()
            }
        };

        let mut interfaces: Vec<Interface> = Vec::new();
        for addr in addresses {
            // First IPv4 address wins for interfaces carrying several
            if interfaces.iter().any(|iface| iface.name == addr.name) {
                continue;
            }
            let mut iface = Interface::new(addr.name, Some(addr.ip));
            iface.network = Ipv4Net::with_netmask(addr.ip, addr.netmask)
                .ok()
                .map(|net| net.trunc());
            interfaces.push(iface);
        }

        for link in links {
            match interfaces.iter_mut().find(|iface| iface.name == link.name) {
                Some(iface) => {
                    iface.mac = link.mac;
                    iface.admin_status = link.admin;
                }
                None => {
                    let mut iface = Interface::new(link.name, None);
                    iface.mac = link.mac;
                    iface.admin_status = link.admin;
                    interfaces.push(iface);
                }
            }
        }

        Ok(interfaces)
    }

    async fn gateways(&self) -> Vec<String> {
        match self
            .runner
            .fetch(&self.platform.gateway_source(), crate::defaults::COMMAND_TIMEOUT)
            .await
        {
            Ok(text) => self.platform.parse_gateways(&text),
            Err(e) => {
                self.probe_logger.log_degraded("default gateway", &e).await;
                Vec::new()
            }
        }
    }

    async fn dns_servers(&self) -> Vec<String> {
        match self
            .runner
            .fetch(&self.platform.dns_source(), crate::defaults::COMMAND_TIMEOUT)
            .await
        {
            Ok(text) => self.platform.parse_dns_servers(&text),
            Err(e) => {
                self.probe_logger.log_degraded("DNS servers", &e).await;
                Vec::new()
            }
        }
    }

    /// Internet, Local Network and DNS Resolution, each in its own task
    async fn connection_checks(&self, gateways: &[String]) -> Vec<ConnectionCheck> {
        let internet = {
            let probes = self.probes.clone();
            tokio::spawn(async move {
                probes.internet().await.map(|up| {
                    if up {
                        ConnectionStatus::Connected
                    } else {
                        ConnectionStatus::Disconnected
                    }
                })
            })
        };

        let local = {
            let probes = self.probes.clone();
            let gateways = gateways.to_vec();
            let logger = self.probe_logger.clone();
            tokio::spawn(async move {
                local_network_status(probes.as_ref(), &gateways, &logger).await
            })
        };

        let dns = {
            let probes = self.probes.clone();
            let hostname = self.config.dns_check_hostname.clone();
            tokio::spawn(async move {
                probes.resolves(&hostname).await.map(|ok| {
                    if ok {
                        ConnectionStatus::Working
                    } else {
                        ConnectionStatus::Failed
                    }
                })
            })
        };

        let (internet, local, dns) = tokio::join!(internet, local, dns);

        vec![
            ConnectionCheck::new(
                ConnectionCheck::INTERNET,
                self.settle(ConnectionCheck::INTERNET, internet).await,
            ),
            ConnectionCheck::new(
                ConnectionCheck::LOCAL_NETWORK,
                self.settle(ConnectionCheck::LOCAL_NETWORK, local).await,
            ),
            ConnectionCheck::new(
                ConnectionCheck::DNS_RESOLUTION,
                self.settle(ConnectionCheck::DNS_RESOLUTION, dns).await,
            ),
        ]
    }

    /// Collapse a check task's outcome; errors and panics become `Error`
    async fn settle(
        &self,
        check: &str,
        joined: std::result::Result<Result<ConnectionStatus>, tokio::task::JoinError>,
    ) -> ConnectionStatus {
        match joined.map_err(AppError::from).and_then(|status| status) {
            Ok(status) => status,
            Err(e) => {
                self.logger
                    .warn(&format!("{} check failed: {}", check, e))
                    .error_info(&e)
                    .log()
                    .await;
                ConnectionStatus::Error
            }
        }
    }
}

/// Ping gateways in order; the first answer means the local network is up
///
/// A gateway whose ping cannot run counts as silent and the next one is tried.
async fn local_network_status(
    probes: &dyn ConnectivityProbe,
    gateways: &[String],
    logger: &ProbeLogger,
) -> Result<ConnectionStatus> {
    for gateway in gateways {
        match probes
            .ping_reachable(gateway, crate::defaults::GATEWAY_PING_TIMEOUT)
            .await
        {
            Ok(true) => return Ok(ConnectionStatus::Connected),
            Ok(false) => {}
            Err(e) => {
                logger
                    .log_degraded(&format!("reachability of gateway {}", gateway), &e)
                    .await;
            }
        }
    }
    Ok(ConnectionStatus::Disconnected)
}
