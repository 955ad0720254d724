//! Colored formatter implementation with terminal color support
//!
//! Wraps the plain formatter with an ANSI palette and adds status symbols to
//! headers and messages.

use super::formatter::{FormattingOptions, OutputFormatter, PlainFormatter, Tone};
use crate::{
    actions::ActionOutcome,
    error::Result,
    models::{
        ActiveConnection, Diagnosis, NeighborEntry, NetbiosInfo, NetworkSnapshot, PingResult,
        SpeedTestResult, TraceHop,
    },
    scanner::ScanSession,
    trace::TraceRun,
};
use colored::*;

/// Latency classification for color coding
#[derive(Debug, Clone, PartialEq)]
pub enum PerformanceLevel {
    Excellent,  // < 50ms
    Good,       // 50-100ms
    Fair,       // 100-300ms
    Poor,       // >= 300ms
}

impl PerformanceLevel {
    /// Determine performance level from response time in milliseconds
    pub fn from_response_time(time_ms: f64) -> Self {
        if time_ms < 50.0 {
            Self::Excellent
        } else if time_ms < 100.0 {
            Self::Good
        } else if time_ms < 300.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Excellent | Self::Good => Tone::Good,
            Self::Fair => Tone::Warning,
            Self::Poor => Tone::Bad,
        }
    }

    /// Get descriptive text
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::Cyan,
            muted: Color::BrightBlack,
        }
    }
}

impl ColorScheme {
    pub fn color(&self, tone: Tone) -> Color {
        match tone {
            Tone::Header => self.header,
            Tone::Good => self.success,
            Tone::Warning => self.warning,
            Tone::Bad => self.error,
            Tone::Info => self.info,
            Tone::Muted => self.muted,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    inner: PlainFormatter,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        let inner = if options.enable_color {
            PlainFormatter::painted(options, color_scheme.clone())
        } else {
            PlainFormatter::new(options)
        };
        Self { inner, color_scheme }
    }

    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.inner.options().enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    /// Check if terminal supports colors
    pub fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err()
            && std::env::var("TERM").map(|term| term != "dumb").unwrap_or(true)
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let rule = "─".repeat(title.chars().count() + 4);
        Ok(format!(
            "{}\n  {}\n{}",
            self.colorize(&rule, self.color_scheme.muted),
            self.colorize(title, self.color_scheme.header).bold(),
            self.colorize(&rule, self.color_scheme.muted)
        ))
    }

    fn format_snapshot(&self, snapshot: &NetworkSnapshot) -> Result<String> {
        self.inner.format_snapshot(snapshot)
    }

    fn format_diagnosis(&self, diagnosis: &Diagnosis) -> Result<String> {
        self.inner.format_diagnosis(diagnosis)
    }

    fn format_ping_result(&self, result: &PingResult) -> Result<String> {
        self.inner.format_ping_result(result)
    }

    fn format_scan_results(&self, host: &str, session: &ScanSession) -> Result<String> {
        self.inner.format_scan_results(host, session)
    }

    fn format_trace_hop(&self, hop: &TraceHop) -> Result<String> {
        self.inner.format_trace_hop(hop)
    }

    fn format_trace_run(&self, run: &TraceRun) -> Result<String> {
        self.inner.format_trace_run(run)
    }

    fn format_speed_result(&self, result: &SpeedTestResult) -> Result<String> {
        self.inner.format_speed_result(result)
    }

    fn format_neighbors(&self, entries: &[NeighborEntry]) -> Result<String> {
        self.inner.format_neighbors(entries)
    }

    fn format_connections(&self, connections: &[ActiveConnection]) -> Result<String> {
        self.inner.format_connections(connections)
    }

    fn format_netbios(&self, info: &NetbiosInfo) -> Result<String> {
        self.inner.format_netbios(info)
    }

    fn format_action_outcome(&self, outcome: &ActionOutcome) -> Result<String> {
        let label = outcome.action.label();
        let mut output = if outcome.success {
            self.format_success(&format!("{} completed", label))?
        } else {
            self.format_error(&format!("{} failed", label))?
        };
        let detail = outcome.output.trim();
        if !detail.is_empty() {
            output.push('\n');
            output.push_str(&self.colorize(detail, self.color_scheme.muted).to_string());
        }
        Ok(output)
    }

    fn format_presets(&self) -> Result<String> {
        self.inner.format_presets()
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("✗ {}", self.colorize(error, self.color_scheme.error)))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("⚠ {}", self.colorize(warning, self.color_scheme.warning)))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("✓ {}", self.colorize(message, self.color_scheme.success)))
    }
}
