//! Output formatting and display system
//!
//! Human-readable rendering of snapshots, diagnoses and probe results,
//! with colored and plain variants, plus the JSON rendering used by `--json`.

mod colored;
mod formatter;

pub use colored::{ColorScheme, ColoredFormatter, PerformanceLevel};
pub use formatter::{
    Alignment, Cell, Column, FormattingOptions, OutputFormatter, PlainFormatter, RowData,
    TableFormat, Tone, FULL_SCAN_LISTING_LIMIT,
};

use crate::error::{AppError, Result};
use serde::Serialize;

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(
        enable_color: bool,
        verbose: bool,
    ) -> Box<dyn OutputFormatter + Send + Sync> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            table_borders: true,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter + Send + Sync> {
        Self::create_formatter(false, true)
    }
}

/// Pretty-printed JSON for any result type
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::parse(format!("Failed to serialize output: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnosis, HealthStatus};

    #[test]
    fn test_factory_respects_color_flag() {
        let formatter = OutputFormatterFactory::create_plain_formatter();
        assert_eq!(formatter.format_error("x").unwrap(), "ERROR: x");

        let formatter = OutputFormatterFactory::create_formatter(true, false);
        assert!(formatter.format_error("x").unwrap().starts_with('✗'));
    }

    #[test]
    fn test_json_uses_snake_case_status() {
        let json = to_json(&Diagnosis::from_issues(vec![])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(HealthStatus::Ok.to_string(), "ok");
    }
}
