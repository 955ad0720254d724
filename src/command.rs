//! OS command execution
//!
//! Every external utility (ping, ipconfig, ip, arp, ...) is run through the
//! `CommandRunner` trait so probe logic can be exercised against canned output.

use crate::error::{AppError, Result};
use crate::logging::ProbeLogger;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

/// Windows `CREATE_NO_WINDOW` process creation flag
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Program plus arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Build a tokio command with the platform defaults applied
    pub fn to_tokio(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);
        command
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Where a piece of system information is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Command(CommandSpec),
    File(PathBuf),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Command(spec) => write!(f, "`{}`", spec),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout followed by stderr
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, killing it if `timeout` elapses
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput>;

    async fn read_file(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::io(format!("{}: {}", path.display(), e)))
    }

    /// Fetch the text behind a source; a command must exit successfully
    async fn fetch(&self, source: &Source, timeout: Duration) -> Result<String> {
        match source {
            Source::Command(spec) => {
                let output = self.run(spec, timeout).await?;
                if output.success() {
                    Ok(output.stdout)
                } else {
                    Err(AppError::command(format!(
                        "`{}` exited with {:?}: {}",
                        spec,
                        output.exit_code,
                        output.stderr.trim()
                    )))
                }
            }
            Source::File(path) => self.read_file(path).await,
        }
    }
}

/// Runs real processes with tokio
pub struct SystemCommandRunner {
    logger: Option<ProbeLogger>,
}

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self { logger: None }
    }

    pub fn with_logger(logger: ProbeLogger) -> Self {
        Self { logger: Some(logger) }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput> {
        let started = Instant::now();
        let child = spec.to_tokio().spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                AppError::command(format!("{} not found", spec.program))
            }
            _ => AppError::command(format!("failed to start {}: {}", spec.program, e)),
        })?;

        // Dropping the child on timeout kills it (kill_on_drop)
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AppError::timeout(format!(
                    "`{}` did not finish within {:?}",
                    spec, timeout
                )))
            }
        };

        let output = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if let Some(logger) = &self.logger {
            logger.log_command(&spec.argv(), output.exit_code, started.elapsed()).await;
        }

        Ok(output)
    }
}
