//! Maintenance actions: renew or release the DHCP lease, flush DNS, reset Winsock

use crate::command::CommandRunner;
use crate::logging::Logger;
use crate::platform::PlatformAdapter;
use crate::types::SystemAction;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Actions can block on DHCP negotiation for a while
const ACTION_TIMEOUT: Duration = Duration::from_secs(60);

pub const WINDOWS_ONLY: &str = "This feature is only available on Windows.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: SystemAction,
    pub success: bool,
    /// Command stdout followed by stderr, or why nothing ran
    pub output: String,
}

pub struct SystemActionExecutor {
    runner: Arc<dyn CommandRunner>,
    platform: Arc<dyn PlatformAdapter>,
    logger: Arc<Logger>,
}

impl SystemActionExecutor {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        platform: Arc<dyn PlatformAdapter>,
        logger: Arc<Logger>,
    ) -> Self {
        Self { runner, platform, logger }
    }

    /// Run `action`, optionally scoped to one adapter; never fails
    pub async fn execute(&self, action: SystemAction, adapter: Option<&str>) -> ActionOutcome {
        let adapter = adapter.map(str::trim).filter(|name| !name.is_empty());

        let Some(spec) = self.platform.action_command(action, adapter) else {
            crate::log_info!(
                self.logger,
                "{} is not supported on {}",
                action.label(),
                self.platform.kind()
            );
            return ActionOutcome {
                action,
                success: false,
                output: WINDOWS_ONLY.to_string(),
            };
        };

        self.logger
            .info(&format!("Running {}", action.label()))
            .field("command", spec.to_string())
            .log()
            .await;

        match self.runner.run(&spec, ACTION_TIMEOUT).await {
            Ok(output) => ActionOutcome {
                action,
                success: output.success(),
                output: output.combined(),
            },
            Err(e) => {
                self.logger.warn(&format!("{} failed", action.label())).error_info(&e).log().await;
                ActionOutcome {
                    action,
                    success: false,
                    output: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::fake::FakeRunner;
    use crate::platform::{LinuxPlatform, WindowsPlatform};

    fn executor(runner: FakeRunner, platform: Arc<dyn PlatformAdapter>) -> SystemActionExecutor {
        SystemActionExecutor::new(Arc::new(runner), platform, Arc::new(Logger::quiet("ACTION")))
    }

    #[tokio::test]
    async fn test_flush_dns_on_windows() {
        let flushed = "Successfully flushed the DNS Resolver Cache.";
        let runner = FakeRunner::new().on("ipconfig /flushdns", 0, flushed);
        let outcome = executor(runner, Arc::new(WindowsPlatform))
            .execute(SystemAction::FlushDns, None)
            .await;

        assert!(outcome.success);
        assert!(outcome.output.contains("Successfully flushed"));
    }

    #[tokio::test]
    async fn test_renew_targets_adapter() {
        let runner = FakeRunner::new().on("ipconfig /renew Ethernet", 0, "renewed");
        let exec = executor(runner, Arc::new(WindowsPlatform));
        let outcome = exec.execute(SystemAction::Renew, Some("Ethernet")).await;
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_winsock_unsupported_off_windows() {
        let outcome = executor(FakeRunner::new(), Arc::new(LinuxPlatform))
            .execute(SystemAction::ResetWinsock, None)
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.output, WINDOWS_ONLY);
    }

    #[tokio::test]
    async fn test_failures_are_reported_not_raised() {
        let runner = FakeRunner::new().on("dhclient -r", 2, "");
        let exec = executor(runner, Arc::new(LinuxPlatform));

        let outcome = exec.execute(SystemAction::Release, Some("  ")).await;
        assert!(!outcome.success);

        let outcome = exec.execute(SystemAction::FlushDns, None).await;
        assert!(!outcome.success);
        assert!(outcome.output.contains("not found"));
    }
}
