//! Established TCP/UDP connections and the processes that own them

use crate::command::CommandRunner;
use crate::logging::{Logger, ProbeLogger};
use crate::models::ActiveConnection;
use crate::platform::PlatformAdapter;
use std::sync::Arc;

pub struct ConnectionTable {
    runner: Arc<dyn CommandRunner>,
    platform: Arc<dyn PlatformAdapter>,
    logger: ProbeLogger,
}

impl ConnectionTable {
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

    /// Established connections; empty when the socket listing cannot be run
    ///
    /// `lsof` exits nonzero when nothing matches, so the listing is parsed
    /// whatever the exit status.
    pub async fn collect(&self) -> Vec<ActiveConnection> {
        let spec = self.platform.connections_command();
        let mut connections = match self.runner.run(&spec, crate::defaults::COMMAND_TIMEOUT).await {
            Ok(output) => self.platform.parse_connections(&output.stdout),
            Err(e) => {
                self.logger.log_degraded("active connections", &e).await;
                return Vec::new();
            }
        };

        if connections.iter().any(|c| c.process.is_none() && c.pid.is_some()) {
            self.name_owners(&mut connections).await;
        }
        connections
    }

    /// Fill in process names from the platform's process listing
    async fn name_owners(&self, connections: &mut [ActiveConnection]) {
        let Some(spec) = self.platform.process_names_command() else { return };
        let names = match self.runner.run(&spec, crate::defaults::COMMAND_TIMEOUT).await {
            Ok(output) => self.platform.parse_process_names(&output.stdout),
            Err(e) => {
                self.logger.log_degraded("process names", &e).await;
                return;
            }
        };

        for connection in connections.iter_mut().filter(|c| c.process.is_none()) {
            connection.process = connection.pid.and_then(|pid| names.get(&pid).cloned());
        }
    }
}
