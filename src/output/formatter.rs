//! Core formatting traits and implementations
//!
//! This module defines the output formatting interface and provides
//! a plain text implementation with table formatting capabilities.

use super::colored::{ColorScheme, PerformanceLevel};
use crate::{
    actions::ActionOutcome,
    error::{AppError, Result},
    models::{
        ActiveConnection, ConnectionCheck, Diagnosis, HealthStatus, HopStatus, NeighborEntry,
        NetbiosInfo, NetworkSnapshot, PingResult, PortStatus, Severity, SpeedTestResult, TraceHop,
    },
    scanner::{PortPreset, ScanSession},
    trace::TraceRun,
};
use colored::Colorize;
use std::fmt::Write as _;

/// Scans with more results than this list open ports only unless verbose
pub const FULL_SCAN_LISTING_LIMIT: usize = 32;

const NOT_AVAILABLE: &str = "N/A";

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Hostname, gateways, DNS servers, interfaces and connection checks
    fn format_snapshot(&self, snapshot: &NetworkSnapshot) -> Result<String>;

    /// Overall health followed by every issue and its suggested fix
    fn format_diagnosis(&self, diagnosis: &Diagnosis) -> Result<String>;

    /// Ping statistics summary
    fn format_ping_result(&self, result: &PingResult) -> Result<String>;

    /// Port table plus a one-line summary
    fn format_scan_results(&self, host: &str, session: &ScanSession) -> Result<String>;

    /// A single traceroute hop, as streamed
    fn format_trace_hop(&self, hop: &TraceHop) -> Result<String>;

    /// Closing line of a traceroute
    fn format_trace_run(&self, run: &TraceRun) -> Result<String>;

    fn format_speed_result(&self, result: &SpeedTestResult) -> Result<String>;

    fn format_neighbors(&self, entries: &[NeighborEntry]) -> Result<String>;

    fn format_connections(&self, connections: &[ActiveConnection]) -> Result<String>;

    /// Remote NetBIOS name table, or the lookup error
    fn format_netbios(&self, info: &NetbiosInfo) -> Result<String>;

    fn format_action_outcome(&self, outcome: &ActionOutcome) -> Result<String>;

    /// The named port presets and the ports they cover
    fn format_presets(&self) -> Result<String>;

    /// Format error messages
    fn format_error(&self, error: &str) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;

    /// Format success messages
    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Enable verbose mode with detailed information
    pub verbose_mode: bool,
    /// Show table borders
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Show borders around table
    pub show_borders: bool,
    /// Show header row
    pub show_header: bool,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    /// Column header
    pub header: String,
    /// Column alignment
    pub alignment: Alignment,
    /// Minimum width
    pub min_width: usize,
    /// Maximum width
    pub max_width: usize,
}

impl Column {
    pub fn left(header: &str, min_width: usize, max_width: usize) -> Self {
        Self {
            header: header.to_string(),
            alignment: Alignment::Left,
            min_width,
            max_width,
        }
    }

    pub fn right(header: &str, min_width: usize, max_width: usize) -> Self {
        Self {
            alignment: Alignment::Right,
            ..Self::left(header, min_width, max_width)
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// Semantic color of a piece of output; the palette decides the actual color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Header,
    Good,
    Warning,
    Bad,
    Info,
    Muted,
}

/// A table cell; the tone is applied after padding so widths stay exact
#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub tone: Option<Tone>,
}

impl Cell {
    pub fn toned(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone: Some(tone),
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Self { text, tone: None }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

/// Row data for table formatting
pub type RowData = Vec<Cell>;

fn format_failed(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn joined_or_na(values: &[String]) -> String {
    if values.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        values.join(", ")
    }
}

/// Plain text formatter implementation
///
/// Given a palette it paints its output; `ColoredFormatter` builds on that.
pub struct PlainFormatter {
    options: FormattingOptions,
    palette: Option<ColorScheme>,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            options,
            palette: None,
        }
    }

    /// A formatter that colors its output with `palette`
    pub fn painted(options: FormattingOptions, palette: ColorScheme) -> Self {
        Self {
            options,
            palette: Some(palette),
        }
    }

    pub fn options(&self) -> &FormattingOptions {
        &self.options
    }

    pub(crate) fn paint(&self, text: &str, tone: Tone) -> String {
        match &self.palette {
            Some(palette) if tone == Tone::Header => {
                text.bold().color(palette.color(tone)).to_string()
            }
            Some(palette) => text.color(palette.color(tone)).to_string(),
            None => text.to_string(),
        }
    }

    fn section(&self, title: &str) -> String {
        format!("{}\n{}", self.paint(title, Tone::Header), "-".repeat(title.chars().count()))
    }

    /// Create a table with the given format and data
    fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> Result<String> {
        if rows.is_empty() {
            return Ok(String::new());
        }

        let column_widths = self.calculate_column_widths(format, rows);
        let border = self.create_horizontal_border(&column_widths);
        let mut output = String::new();

        if format.show_header && !format.columns.is_empty() {
            if format.show_borders {
                writeln!(output, "{}", border).map_err(format_failed)?;
            }

            let headers: RowData = format
                .columns
                .iter()
                .map(|c| Cell::toned(c.header.clone(), Tone::Header))
                .collect();
            let header_row = self.create_row(&headers, &column_widths, format);
            writeln!(output, "{}", header_row).map_err(format_failed)?;

            if format.show_borders {
                writeln!(output, "{}", border).map_err(format_failed)?;
            }
        }

        for row in rows {
            let line = self.create_row(row, &column_widths, format);
            writeln!(output, "{}", line).map_err(format_failed)?;
        }

        if format.show_borders {
            write!(output, "{}", border).map_err(format_failed)?;
        }

        Ok(output.trim_end_matches('\n').to_string())
    }

    /// Calculate optimal column widths
    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        format
            .columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let content = rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.text.chars().count())
                    .max()
                    .unwrap_or(0);
                content
                    .max(col.min_width)
                    .max(col.header.chars().count())
                    .min(col.max_width)
            })
            .collect()
    }

    /// Create a table row
    fn create_row(&self, data: &[Cell], widths: &[usize], format: &TableFormat) -> String {
        let mut row = String::new();

        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format
                .columns
                .get(idx)
                .map(|c| &c.alignment)
                .unwrap_or(&Alignment::Left);

            let padded = self.align_text(&cell.text, width, alignment);
            let painted = match cell.tone {
                Some(tone) => self.paint(&padded, tone),
                None => padded,
            };

            if format.show_borders {
                row.push(' ');
            }
            row.push_str(&painted);
            if format.show_borders {
                row.push_str(" |");
            } else {
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    /// Create horizontal border for table
    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::new();

        if !widths.is_empty() {
            border.push('+');
            for &width in widths {
                border.push_str(&"-".repeat(width + 2));
                border.push('+');
            }
        }

        border
    }

    /// Align text within specified width
    fn align_text(&self, text: &str, width: usize, alignment: &Alignment) -> String {
        let len = text.chars().count();
        if len >= width {
            return text.chars().take(width).collect();
        }

        let padding = width - len;
        match alignment {
            Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
            Alignment::Right => format!("{}{}", " ".repeat(padding), text),
            Alignment::Center => {
                let left_pad = padding / 2;
                let right_pad = padding - left_pad;
                format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
            }
        }
    }

    /// Format a latency in milliseconds, colored by how good it is
    fn format_latency(&self, ms: f64) -> String {
        let level = PerformanceLevel::from_response_time(ms);
        self.paint(&format!("{:.2} ms", ms), level.tone())
    }

    /// Format percentage with appropriate precision
    fn format_percentage(&self, percentage: f64) -> String {
        if percentage >= 99.95 {
            "100.0%".to_string()
        } else if percentage < 0.05 {
            "0.0%".to_string()
        } else {
            format!("{:.1}%", percentage)
        }
    }

    fn check_line(&self, check: &ConnectionCheck) -> String {
        let tone = if check.status.is_healthy() { Tone::Good } else { Tone::Bad };
        format!(
            "  {:<21} {}",
            format!("{}:", check.description),
            self.paint(&check.status.to_string(), tone)
        )
    }

    fn port_status_cell(&self, status: PortStatus) -> Cell {
        let tone = match status {
            PortStatus::Open => Tone::Good,
            PortStatus::Closed => Tone::Muted,
            PortStatus::Error => Tone::Bad,
        };
        Cell::toned(status.to_string(), tone)
    }

    fn speed_line(&self, label: &str, value: Option<String>) -> String {
        let value = match value {
            Some(value) => self.paint(&value, Tone::Info),
            None => self.paint(NOT_AVAILABLE, Tone::Muted),
        };
        format!("{:<10}{}", format!("{}:", label), value)
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.chars().count() + 4);

        writeln!(output, "{}", border).map_err(format_failed)?;
        writeln!(output, "  {}  ", self.paint(title, Tone::Header)).map_err(format_failed)?;
        write!(output, "{}", border).map_err(format_failed)?;

        Ok(output)
    }

    fn format_snapshot(&self, snapshot: &NetworkSnapshot) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "Hostname:    {}", snapshot.hostname).map_err(format_failed)?;
        writeln!(output, "Gateways:    {}", joined_or_na(&snapshot.gateways))
            .map_err(format_failed)?;
        writeln!(output, "DNS Servers: {}", joined_or_na(&snapshot.dns_servers))
            .map_err(format_failed)?;
        if self.options.verbose_mode {
            writeln!(
                output,
                "Captured:    {}",
                snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            )
            .map_err(format_failed)?;
        }

        writeln!(output, "\n{}", self.section("Interfaces")).map_err(format_failed)?;
        if snapshot.interfaces.is_empty() {
            writeln!(output, "{}", self.paint("No interfaces found.", Tone::Muted))
                .map_err(format_failed)?;
        } else {
            let table = TableFormat {
                columns: vec![
                    Column::left("Name", 4, 24),
                    Column::left("IPv4", 4, 15),
                    Column::left("Network", 7, 18),
                    Column::left("MAC", 3, 17),
                    Column::left("Status", 6, 8),
                ],
                show_borders: self.options.table_borders,
                show_header: true,
            };

            let rows: Vec<RowData> = snapshot
                .interfaces
                .iter()
                .map(|iface| {
                    let ip_tone = if iface.is_apipa() {
                        Tone::Warning
                    } else if iface.is_active() {
                        Tone::Good
                    } else {
                        Tone::Muted
                    };
                    vec![
                        Cell::from(iface.name.as_str()),
                        Cell::toned(or_na(iface.ipv4.map(|ip| ip.to_string())), ip_tone),
                        Cell::from(or_na(iface.network.map(|net| net.to_string()))),
                        Cell::from(or_na(iface.mac.clone())),
                        Cell::from(iface.admin_status.to_string()),
                    ]
                })
                .collect();
            writeln!(output, "{}", self.create_table(&table, &rows)?).map_err(format_failed)?;
        }

        write!(output, "\n{}", self.section("Connection Checks")).map_err(format_failed)?;
        for check in &snapshot.connection_checks {
            write!(output, "\n{}", self.check_line(check)).map_err(format_failed)?;
        }

        Ok(output)
    }

    fn format_diagnosis(&self, diagnosis: &Diagnosis) -> Result<String> {
        let mut output = String::new();

        let (label, tone) = match diagnosis.status {
            HealthStatus::Ok => ("HEALTHY", Tone::Good),
            HealthStatus::Warning => ("WARNING", Tone::Warning),
            HealthStatus::Critical => ("CRITICAL", Tone::Bad),
        };
        write!(output, "Network Health: {}", self.paint(label, tone)).map_err(format_failed)?;

        if diagnosis.issues.is_empty() {
            write!(output, "\n  {}", self.paint("No issues detected.", Tone::Muted))
                .map_err(format_failed)?;
            return Ok(output);
        }

        for issue in &diagnosis.issues {
            let marker = match issue.severity {
                Severity::Critical => self.paint("[CRITICAL]", Tone::Bad),
                Severity::Warning => self.paint("[WARNING]", Tone::Warning),
            };
            write!(output, "\n  {} {}", marker, issue.message).map_err(format_failed)?;
            if self.options.verbose_mode {
                write!(output, " ({})", issue.issue_type.as_str()).map_err(format_failed)?;
            }
            if let Some(solution) = &issue.solution {
                write!(output, "\n      Solution: {}", solution).map_err(format_failed)?;
            }
        }

        Ok(output)
    }

    fn format_ping_result(&self, result: &PingResult) -> Result<String> {
        if let Some(error) = &result.error {
            return self.format_error(error);
        }

        let stats = &result.statistics;
        let mut output = String::new();

        writeln!(output, "--- {} ping statistics ---", result.host).map_err(format_failed)?;
        let loss = self.format_percentage(100.0 - stats.success_rate);
        let loss = if stats.lost == 0 {
            self.paint(&loss, Tone::Good)
        } else if stats.received == 0 {
            self.paint(&loss, Tone::Bad)
        } else {
            self.paint(&loss, Tone::Warning)
        };
        write!(
            output,
            "{} packets transmitted, {} received, {} packet loss",
            stats.sent, stats.received, loss
        )
        .map_err(format_failed)?;

        if let (Some(min), Some(avg), Some(max)) = (stats.min, stats.avg, stats.max) {
            write!(
                output,
                "\nrtt min/avg/max/stddev = {:.2}/{:.2}/{:.2}/{:.2} ms",
                min, avg, max, stats.stddev
            )
            .map_err(format_failed)?;
            if self.options.verbose_mode {
                let level = PerformanceLevel::from_response_time(avg);
                write!(
                    output,
                    "\nAverage latency: {} ({})",
                    self.format_latency(avg),
                    level.description()
                )
                .map_err(format_failed)?;
            }
        }

        Ok(output)
    }

    fn format_scan_results(&self, host: &str, session: &ScanSession) -> Result<String> {
        let mut output = String::new();
        let results = &session.results;

        let list_all = self.options.verbose_mode || results.len() <= FULL_SCAN_LISTING_LIMIT;
        let listed: Vec<_> = if list_all {
            results.iter().collect()
        } else {
            session.open_ports().collect()
        };

        if !listed.is_empty() {
            let table = TableFormat {
                columns: vec![
                    Column::right("Port", 4, 5),
                    Column::left("State", 6, 6),
                    Column::left("Service", 7, 48),
                ],
                show_borders: self.options.table_borders,
                show_header: true,
            };
            let rows: Vec<RowData> = listed
                .iter()
                .map(|r| {
                    let detail = match (&r.service, &r.error) {
                        (_, Some(error)) => error.clone(),
                        (Some(service), None) => service.clone(),
                        (None, None) => String::new(),
                    };
                    vec![
                        Cell::from(r.port.to_string()),
                        self.port_status_cell(r.status),
                        Cell::from(detail),
                    ]
                })
                .collect();
            writeln!(output, "{}", self.create_table(&table, &rows)?).map_err(format_failed)?;
        }

        let count = |status: PortStatus| results.iter().filter(|r| r.status == status).count();
        write!(
            output,
            "{}: {} open, {} closed, {} errors ({} ports scanned)",
            host,
            self.paint(&count(PortStatus::Open).to_string(), Tone::Good),
            count(PortStatus::Closed),
            count(PortStatus::Error),
            results.len()
        )
        .map_err(format_failed)?;
        if session.is_stopped() {
            write!(output, " {}", self.paint("[stopped]", Tone::Warning)).map_err(format_failed)?;
        }

        Ok(output)
    }

    fn format_trace_hop(&self, hop: &TraceHop) -> Result<String> {
        let line = match (hop.status, hop.latency) {
            (HopStatus::Timeout, _) => self.paint(&hop.to_string(), Tone::Muted),
            (HopStatus::Ok, Some(crate::models::HopLatency::Millis(ms))) => {
                let level = PerformanceLevel::from_response_time(ms);
                format!(
                    "{:>2}  {}  {}",
                    hop.hop,
                    hop.ip,
                    self.paint(&format!("{:.1} ms", ms), level.tone())
                )
            }
            (HopStatus::Ok, _) => hop.to_string(),
        };
        Ok(line)
    }

    fn format_trace_run(&self, run: &TraceRun) -> Result<String> {
        if let Some(error) = &run.error {
            return self.format_error(error);
        }
        if run.stopped {
            return Ok(self.paint(
                &format!("Traceroute to {} stopped after {} hops.", run.target, run.hops.len()),
                Tone::Warning,
            ));
        }
        Ok(format!("Traceroute to {} complete: {} hops.", run.target, run.hops.len()))
    }

    fn format_speed_result(&self, result: &SpeedTestResult) -> Result<String> {
        let mut lines = vec![
            self.speed_line("Download", result.download_mbps.map(|v| format!("{:.2} Mbps", v))),
            self.speed_line("Upload", result.upload_mbps.map(|v| format!("{:.2} Mbps", v))),
            self.speed_line("Ping", result.ping_ms.map(|v| format!("{:.2} ms", v))),
            self.speed_line(
                "Server",
                result.server.as_ref().map(|s| {
                    if self.options.verbose_mode {
                        format!("{} ({}, {})", s.name, s.sponsor, s.country)
                    } else {
                        s.name.clone()
                    }
                }),
            ),
        ];

        if result.cancelled {
            lines.push(self.format_warning("Speed test cancelled.")?);
        } else if let Some(error) = &result.error {
            lines.push(self.format_error(error)?);
        }

        Ok(lines.join("\n"))
    }

    fn format_neighbors(&self, entries: &[NeighborEntry]) -> Result<String> {
        if entries.is_empty() {
            return Ok(self.paint("No ARP entries found.", Tone::Muted));
        }

        let table = TableFormat {
            columns: vec![
                Column::left("IP Address", 10, 39),
                Column::left("MAC Address", 11, 17),
                Column::left("Type", 4, 10),
                Column::left("Interface", 9, 24),
            ],
            show_borders: self.options.table_borders,
            show_header: true,
        };
        let rows: Vec<RowData> = entries
            .iter()
            .map(|e| {
                vec![
                    Cell::from(e.ip.as_str()),
                    Cell::from(e.mac.as_str()),
                    Cell::from(e.entry_type.as_str()),
                    Cell::from(e.interface.clone().unwrap_or_default()),
                ]
            })
            .collect();

        let mut output = self.create_table(&table, &rows)?;
        write!(output, "\n{} entries", entries.len()).map_err(format_failed)?;
        Ok(output)
    }

    fn format_connections(&self, connections: &[ActiveConnection]) -> Result<String> {
        if connections.is_empty() {
            return Ok(self.paint("No established connections found.", Tone::Muted));
        }

        let table = TableFormat {
            columns: vec![
                Column::left("Proto", 5, 5),
                Column::left("Local Address", 13, 47),
                Column::left("Remote Address", 14, 47),
                Column::right("PID", 3, 8),
                Column::left("Process", 7, 32),
            ],
            show_borders: self.options.table_borders,
            show_header: true,
        };
        let rows: Vec<RowData> = connections
            .iter()
            .map(|c| {
                vec![
                    Cell::from(c.protocol.as_str()),
                    Cell::from(c.local.as_str()),
                    Cell::from(c.remote.as_str()),
                    Cell::from(c.pid.map(|p| p.to_string()).unwrap_or_default()),
                    Cell::from(c.process.clone().unwrap_or_else(|| "Unknown".to_string())),
                ]
            })
            .collect();

        let mut output = self.create_table(&table, &rows)?;
        write!(output, "\n{} connections", connections.len()).map_err(format_failed)?;
        Ok(output)
    }

    fn format_netbios(&self, info: &NetbiosInfo) -> Result<String> {
        if let Some(error) = &info.error {
            return self.format_error(&format!("NetBIOS lookup for {} failed: {}", info.ip, error));
        }

        let table = TableFormat {
            columns: vec![
                Column::left("Name", 4, 16),
                Column::left("Suffix", 6, 6),
                Column::left("Type", 4, 6),
                Column::left("Status", 6, 16),
            ],
            show_borders: self.options.table_borders,
            show_header: true,
        };
        let rows: Vec<RowData> = info
            .names
            .iter()
            .map(|n| {
                vec![
                    Cell::from(n.name.as_str()),
                    Cell::from(format!("<{}>", n.suffix)),
                    Cell::from(n.kind.as_str()),
                    Cell::from(n.status.as_str()),
                ]
            })
            .collect();

        let mut output = self.create_table(&table, &rows)?;
        if let Some(mac) = &info.mac {
            write!(output, "\nMAC Address: {}", mac).map_err(format_failed)?;
        }
        Ok(output)
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
            write!(output, "\n{}", detail).map_err(format_failed)?;
        }
        Ok(output)
    }

    fn format_presets(&self) -> Result<String> {
        let table = TableFormat {
            columns: vec![
                Column::left("Preset", 6, 20),
                Column::right("Count", 5, 5),
                Column::left("Ports", 5, 60),
            ],
            show_borders: self.options.table_borders,
            show_header: true,
        };

        let rows: Vec<RowData> = PortPreset::ALL
            .iter()
            .map(|preset| {
                let ports = preset.ports();
                let listing = match (ports.first(), ports.last()) {
                    (Some(first), Some(last)) if ports.len() > 12 => format!("{}-{}", first, last),
                    _ => ports.iter().map(u32::to_string).collect::<Vec<_>>().join(", "),
                };
                vec![
                    Cell::toned(preset.name(), Tone::Info),
                    Cell::from(ports.len().to_string()),
                    Cell::from(listing),
                ]
            })
            .collect();

        self.create_table(&table, &rows)
    }

    fn format_error(&self, error: &str) -> Result<String> {
        Ok(format!("{} {}", self.paint("ERROR:", Tone::Bad), error))
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("{} {}", self.paint("WARNING:", Tone::Warning), warning))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", self.paint("SUCCESS:", Tone::Good), message))
    }
}
