//! Neighboring hosts: the ARP table and remote NetBIOS name tables

use crate::command::CommandRunner;
use crate::logging::{Logger, ProbeLogger};
use crate::models::{NeighborEntry, NetbiosInfo};
use crate::platform::{windows::parse_nbtstat, PlatformAdapter};
use std::net::Ipv4Addr;
use std::sync::Arc;

pub struct NeighborTable {
    runner: Arc<dyn CommandRunner>,
    platform: Arc<dyn PlatformAdapter>,
    logger: ProbeLogger,
}

impl NeighborTable {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        platform: Arc<dyn PlatformAdapter>,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            runner,
            platform,
            logger: ProbeLogger::new(logger),
        }
    }

    /// Current neighbor entries; empty when the table cannot be read
    pub async fn collect(&self) -> Vec<NeighborEntry> {
        match self
            .runner
            .fetch(&self.platform.arp_source(), crate::defaults::COMMAND_TIMEOUT)
            .await
        {
            Ok(text) => self.platform.parse_neighbors(&text),
            Err(e) => {
                self.logger.log_degraded("ARP table", &e).await;
                Vec::new()
            }
        }
    }
}

pub struct NetbiosLookup {
    runner: Arc<dyn CommandRunner>,
    platform: Arc<dyn PlatformAdapter>,
    logger: ProbeLogger,
}

impl NetbiosLookup {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        platform: Arc<dyn PlatformAdapter>,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            runner,
            platform,
            logger: ProbeLogger::new(logger),
        }
    }

    /// Query the NetBIOS name table of `ip`; failures land in `error`
    pub async fn lookup(&self, ip: &str) -> NetbiosInfo {
        let ip = ip.trim();
        if ip.parse::<Ipv4Addr>().is_err() {
            return NetbiosInfo::failed(ip, format!("Invalid IPv4 address: {}", ip));
        }
        let Some(spec) = self.platform.netbios_command(ip) else {
            let reason = format!("NetBIOS lookup is not supported on {}", self.platform.kind());
            return NetbiosInfo::failed(ip, reason);
        };

        let output = match self.runner.run(&spec, crate::defaults::COMMAND_TIMEOUT).await {
            Ok(output) => output,
            Err(e) => {
                self.logger.log_degraded("NetBIOS names", &e).await;
                return NetbiosInfo::failed(ip, e.to_string());
            }
        };

        let (names, mac) = parse_nbtstat(&output.stdout);
        if names.is_empty() {
            return NetbiosInfo::failed(ip, "Host not found");
        }
        NetbiosInfo {
            ip: ip.to_string(),
            names,
            mac,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::fake::FakeRunner;
    use crate::platform::{LinuxPlatform, WindowsPlatform};

    fn netbios(runner: FakeRunner, platform: Arc<dyn PlatformAdapter>) -> NetbiosLookup {
        NetbiosLookup::new(Arc::new(runner), platform, Arc::new(Logger::quiet("NETBIOS")))
    }

    #[tokio::test]
    async fn test_netbios_lookup() {
        let runner = FakeRunner::new().on(
            "nbtstat -A 192.168.1.30",
            0,
            "    FILESERVER     <00>  UNIQUE      Registered\n    MAC Address = 00-1A-2B-3C-4D-5E\n",
        );
        let info = netbios(runner, Arc::new(WindowsPlatform)).lookup("192.168.1.30").await;
        assert!(info.error.is_none());
        assert_eq!(info.names[0].name, "FILESERVER");
        assert_eq!(info.mac.as_deref(), Some("00:1a:2b:3c:4d:5e"));
    }

    #[tokio::test]
    async fn test_netbios_failures() {
        let unknown = FakeRunner::new().on("nbtstat *", 0, "    Host not found.\n");
        let info = netbios(unknown, Arc::new(WindowsPlatform)).lookup("192.168.1.31").await;
        assert_eq!(info.error.as_deref(), Some("Host not found"));

        let info = netbios(FakeRunner::new(), Arc::new(WindowsPlatform)).lookup("fileserver").await;
        assert!(info.error.unwrap().starts_with("Invalid IPv4 address"));

        let runner = FakeRunner::new();
        let info = netbios(runner, Arc::new(LinuxPlatform)).lookup("192.168.1.30").await;
        assert!(info.error.unwrap().contains("not supported"));
    }

    #[tokio::test]
    async fn test_linux_table() {
        let runner = FakeRunner::new().file(
            "/proc/net/arp",
            "IP address       HW type     Flags       HW address            Mask     Device\n\
192.168.1.1      0x1         0x2         a4:91:b1:00:11:22     *        eth0\n\
192.168.1.9      0x1         0x0         00:00:00:00:00:00     *        eth0\n",
        );
        let logger = Arc::new(Logger::quiet("ARP"));
        let table = NeighborTable::new(Arc::new(runner), Arc::new(LinuxPlatform), logger);
        let entries = table.collect().await;

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ip, "192.168.1.1");
        assert_eq!(entries[0].interface.as_deref(), Some("eth0"));
    }

    #[tokio::test]
    async fn test_unreadable_table_is_empty() {
        let table = NeighborTable::new(
            Arc::new(FakeRunner::new()),
            Arc::new(WindowsPlatform),
            Arc::new(Logger::quiet("ARP")),
        );
        assert!(table.collect().await.is_empty());
    }
}
