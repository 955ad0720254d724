//! Error handling for the network diagnostics toolkit

use thiserror::Error;

/// Custom error types for the network diagnostics toolkit
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// DNS resolution errors
    #[error("DNS resolution error: {0}")]
    DnsResolution(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (command output, URLs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// External OS command could not be started or failed
    #[error("Command error: {0}")]
    Command(String),

    /// Operation was cancelled by the caller
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Speed test backend errors
    #[error("Speed test error: {0}")]
    SpeedTest(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new DNS resolution error
    pub fn dns_resolution<S: Into<String>>(message: S) -> Self {
        Self::DnsResolution(message.into())
    }

    /// Create a new HTTP request error
    pub fn http_request<S: Into<String>>(message: S) -> Self {
        Self::HttpRequest(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new command error
    pub fn command<S: Into<String>>(message: S) -> Self {
        Self::Command(message.into())
    }

    /// Create a new cancellation error
    pub fn cancelled<S: Into<String>>(message: S) -> Self {
        Self::Cancelled(message.into())
    }

    /// Create a new speed test error
    pub fn speed_test<S: Into<String>>(message: S) -> Self {
        Self::SpeedTest(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Same kind of error with `context` prepended to its message
    pub fn prefixed(self, context: &str) -> Self {
        let wrap = |message: String| format!("{}: {}", context, message);
        match self {
            Self::Config(m) => Self::Config(wrap(m)),
            Self::Network(m) => Self::Network(wrap(m)),
            Self::DnsResolution(m) => Self::DnsResolution(wrap(m)),
            Self::HttpRequest(m) => Self::HttpRequest(wrap(m)),
            Self::Timeout(m) => Self::Timeout(wrap(m)),
            Self::Validation(m) => Self::Validation(wrap(m)),
            Self::Io(m) => Self::Io(wrap(m)),
            Self::Parse(m) => Self::Parse(wrap(m)),
            Self::Command(m) => Self::Command(wrap(m)),
            Self::Cancelled(m) => Self::Cancelled(wrap(m)),
            Self::SpeedTest(m) => Self::SpeedTest(wrap(m)),
            Self::Internal(m) => Self::Internal(wrap(m)),
        }
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Network(_) => "NETWORK",
            Self::DnsResolution(_) => "DNS",
            Self::HttpRequest(_) => "HTTP",
            Self::Timeout(_) => "TIMEOUT",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Command(_) => "COMMAND",
            Self::Cancelled(_) => "CANCELLED",
            Self::SpeedTest(_) => "SPEEDTEST",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Errors caused by the network or a remote server, worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::DnsResolution(_)
                | Self::HttpRequest(_)
                | Self::Timeout(_)
                | Self::SpeedTest(_)
        )
    }

    /// What the user can try next, if anything
    pub fn suggestion(&self) -> Option<&'static str> {
        let hint = match self {
            Self::Config(_) => "Check the settings file (`ndt config`) and command line arguments.",
            Self::Network(_) => "Run `ndt diagnose` to locate the failing link.",
            Self::DnsResolution(_) => {
                "Try `ndt action flush-dns` or switch to a public resolver (8.8.8.8, 1.1.1.1)."
            }
            Self::HttpRequest(_) => "The server may be down or blocking requests.",
            Self::Timeout(_) => "Raise the timeout (see `ndt config`) or check the connection.",
            Self::Validation(_) => "Check host names, port lists and numeric arguments.",
            Self::Io(_) => "Check that the file exists and is readable.",
            Self::Command(_) => {
                "Make sure ping, traceroute/tracert and ipconfig/ip are installed and on PATH."
            }
            Self::SpeedTest(_) => "Try again later or pass a different `--server`.",
            Self::Internal(_) => "This is a bug; please report it with the output of `--debug`.",
            Self::Parse(_) | Self::Cancelled(_) => return None,
        };
        Some(hint)
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1,
            Self::Network(_)
            | Self::DnsResolution(_)
            | Self::HttpRequest(_)
            | Self::SpeedTest(_) => 2,
            Self::Timeout(_) => 3,
            Self::Command(_) => 4,
            Self::Io(_) => 5,
            Self::Cancelled(_) => 130,
            Self::Internal(_) => 99,
        }
    }

    fn color(&self) -> colored::Color {
        use colored::Color;
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => Color::Red,
            Self::Network(_)
            | Self::DnsResolution(_)
            | Self::HttpRequest(_)
            | Self::SpeedTest(_) => Color::Yellow,
            Self::Timeout(_) | Self::Cancelled(_) => Color::Blue,
            Self::Command(_) => Color::Magenta,
            Self::Io(_) => Color::Cyan,
            Self::Internal(_) => Color::BrightRed,
        }
    }

    /// `[CATEGORY] message`, colored by category when `use_color` is set
    pub fn format_for_console(&self, use_color: bool) -> String {
        if !use_color {
            return format!("[{}] {}", self.category(), self);
        }

        use colored::Colorize;
        let color = self.color();
        format!(
            "[{}] {}",
            self.category().color(color).bold(),
            self.to_string().color(color)
        )
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::TimedOut => Self::timeout(error.to_string()),
            _ => Self::io(error.to_string()),
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if error.is_connect() || error.is_request() {
            Self::network(error.to_string())
        } else {
            Self::http_request(error.to_string())
        }
    }
}

impl From<trust_dns_resolver::error::ResolveError> for AppError {
    fn from(error: trust_dns_resolver::error::ResolveError) -> Self {
        Self::dns_resolution(error.to_string())
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

macro_rules! parse_error_from {
    ($($source:ty => $what:literal),* $(,)?) => {
        $(
            impl From<$source> for AppError {
                fn from(error: $source) -> Self {
                    Self::parse(format!(concat!($what, " parse error: {}"), error))
                }
            }
        )*
    };
}

parse_error_from! {
    std::num::ParseIntError => "Integer",
    std::num::ParseFloatError => "Float",
    std::str::ParseBoolError => "Boolean",
    std::net::AddrParseError => "IP address",
}

impl From<tokio::task::JoinError> for AppError {
    fn from(error: tokio::task::JoinError) -> Self {
        if error.is_cancelled() {
            Self::cancelled(error.to_string())
        } else {
            Self::internal(format!("Task failed: {}", error))
        }
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().prefixed(&f()))
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for user-facing error output
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Render an error the way `report_error` prints it
    ///
    /// Verbose mode adds the suggestion and, for transient failures, a retry hint.
    pub fn render(&self, error: &AppError) -> String {
        let mut out = error.format_for_console(self.use_color);
        if !self.verbose {
            return out;
        }

        if let Some(suggestion) = error.suggestion() {
            out.push_str(&format!("\n\nSuggestion: {}", suggestion));
        }
        if error.is_transient() {
            let hint = "This looks temporary; running the command again may succeed.";
            out.push_str("\n\n");
            if self.use_color {
                use colored::Colorize;
                out.push_str(&hint.green().to_string());
            } else {
                out.push_str(hint);
            }
        }

        out
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", self.render(error));
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}
