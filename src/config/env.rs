//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::models::Config;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENV_FILE: &str = ".env";

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load a settings file into the process environment
    ///
    /// An explicit path must exist; the default `.env` is optional. Variables
    /// already set in the environment win over the file. Returns the file
    /// that was loaded, if any.
    pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_ENV_FILE), false),
        };

        if !path.exists() {
            if required {
                return Err(AppError::config(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            return Ok(None);
        }

        dotenv::from_path(&path).map_err(|e| {
            AppError::config(format!("Failed to load {}: {}", path.display(), e))
        })?;
        Ok(Some(path))
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        let mut content = String::from(
            "# Network Diagnostics Toolkit Configuration\n\
             #\n\
             # Values here are used as defaults and can be overridden by\n\
             # environment variables and command-line arguments.\n\n",
        );

        for (var, description, example) in Self::get_supported_env_vars() {
            content.push_str(&format!("# {}\n# {}={}\n\n", description, var, example));
        }

        content
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Check one variable by applying it to a default configuration
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        if !Self::get_supported_env_vars().iter().any(|(name, _, _)| *name == key) {
            return Ok(());
        }

        let mut config = Config::default();
        config.merge_from_lookup(|k| (k == key).then(|| value.to_string()))?;
        config.validate()
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("NDT_PING_COUNT", "Echo requests per ping run (1-100)", "4"),
            ("NDT_PING_TIMEOUT", "Per-request ping timeout in seconds (1-60)", "2"),
            ("NDT_SCAN_TIMEOUT_MS", "Per-port connect timeout in milliseconds (10-60000)", "1000"),
            ("NDT_TRACE_MAX_HOPS", "Maximum traceroute hops (1-64)", "30"),
            ("NDT_TRACE_WAIT", "Seconds to wait for each traceroute hop (1-30)", "1"),
            (
                "NDT_SPEEDTEST_SERVERS",
                "Comma-separated speed test server URLs",
                "https://speed.cloudflare.com",
            ),
            ("NDT_SPEEDTEST_CHUNKS", "Chunks per download/upload phase (1-100)", "10"),
            ("NDT_SPEEDTEST_CHUNK_BYTES", "Bytes per speed test chunk", "2500000"),
            ("NDT_INTERNET_CHECK_ADDR", "TCP endpoint for the internet check", "8.8.8.8:53"),
            (
                "NDT_INTERNET_CHECK_URL",
                "HTTP fallback for the internet check",
                "http://www.google.com",
            ),
            ("NDT_DNS_CHECK_HOST", "Hostname resolved by the DNS check", "google.com"),
            ("NDT_EXTERNAL_HOST", "Known-good host pinged during diagnosis", "8.8.8.8"),
            ("NDT_ENABLE_COLOR", "Enable colored output", "true"),
            (
                "NDT_LOG_FORMAT",
                "Diagnostic log format on stderr (console, json, compact)",
                "console",
            ),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<26} {}\n", var, description));
            help.push_str(&format!("  {:<26} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate a settings file without loading it, one warning per bad line
    pub fn check_env_file(path: &Path) -> Result<Vec<String>> {
        let entries = dotenv::from_path_iter(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut warnings = Vec::new();
        for entry in entries {
            match entry {
                Ok((key, value)) => {
                    if let Err(e) = Self::validate_env_var(&key, &value) {
                        warnings.push(format!("{}: {}", key, e));
                    }
                }
                Err(e) => warnings.push(format!("Unreadable line: {}", e)),
            }
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_example_content_lists_every_variable() {
        let content = EnvManager::create_example_env_content();

        for (var, _, _) in EnvManager::get_supported_env_vars() {
            assert!(content.contains(&format!("# {}=", var)), "missing {}", var);
        }
    }

    #[test]
    fn test_save_example_file() {
        let temp_file = NamedTempFile::new().unwrap();
        EnvManager::save_example_env_file(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("Network Diagnostics Toolkit Configuration"));
    }

    #[test]
    fn test_validate_env_var() {
        assert!(EnvManager::validate_env_var("NDT_PING_COUNT", "5").is_ok());
        let servers = "https://a.test,http://b.test";
        assert!(EnvManager::validate_env_var("NDT_SPEEDTEST_SERVERS", servers).is_ok());
        assert!(EnvManager::validate_env_var("NDT_ENABLE_COLOR", "false").is_ok());
        assert!(EnvManager::validate_env_var("SOMETHING_ELSE", "whatever").is_ok());

        assert!(EnvManager::validate_env_var("NDT_PING_COUNT", "0").is_err());
        assert!(EnvManager::validate_env_var("NDT_PING_COUNT", "many").is_err());
        assert!(EnvManager::validate_env_var("NDT_TRACE_MAX_HOPS", "65").is_err());
        assert!(EnvManager::validate_env_var("NDT_SPEEDTEST_SERVERS", "ftp://a.test").is_err());
        assert!(EnvManager::validate_env_var("NDT_INTERNET_CHECK_ADDR", "8.8.8.8").is_err());
        assert!(EnvManager::validate_env_var("NDT_ENABLE_COLOR", "maybe").is_err());
        assert!(EnvManager::validate_env_var("NDT_LOG_FORMAT", "json").is_ok());
        assert!(EnvManager::validate_env_var("NDT_LOG_FORMAT", "syslog").is_err());
    }

    #[test]
    fn test_check_env_file_reports_bad_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "NDT_PING_COUNT=3").unwrap();
        writeln!(file, "NDT_SCAN_TIMEOUT_MS=1").unwrap();
        file.flush().unwrap();

        let warnings = EnvManager::check_env_file(file.path()).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("NDT_SCAN_TIMEOUT_MS"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = EnvManager::load_env_file(Some(Path::new("/nonexistent/ndt.env"))).unwrap_err();
        assert_eq!(err.category(), "CONFIG");
    }

    #[test]
    fn test_display_env_help() {
        let help = EnvManager::display_env_help();
        assert!(help.contains("NDT_EXTERNAL_HOST"));
        assert!(help.contains("Configuration Priority"));
    }
}
