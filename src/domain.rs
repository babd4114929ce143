use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use clap::Parser;
use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use tracing_subscriber::util::TryInitError;

use crate::client::FetchOutcome;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/table-data";
pub const DEFAULT_LOG_FILE: &str = "~/.local/state/reltable/reltable.log";

pub const HELP_TEXT: &str = "q: Quit | ←/p: Prev | →/n: Next | [ ]: Status | /: Filter | c: Clear | r: Reload";

#[derive(Debug)]
pub enum RTError {
    IoError(Error),
    InvalidPageSize(u32),
    InvalidEndpoint(url::ParseError),
    HttpClient(reqwest::Error),
    LoggingSetup(TryInitError),
}

impl fmt::Display for RTError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RTError::IoError(err) => write!(f, "io error: {err}"),
            RTError::InvalidPageSize(size) => {
                write!(f, "page size must be a positive number, got {size}")
            }
            RTError::InvalidEndpoint(err) => write!(f, "invalid endpoint url: {err}"),
            RTError::HttpClient(err) => write!(f, "could not build http client: {err}"),
            RTError::LoggingSetup(err) => write!(f, "could not set up logging: {err}"),
        }
    }
}

impl std::error::Error for RTError {}

impl From<Error> for RTError {
    fn from(err: Error) -> Self {
        RTError::IoError(err)
    }
}

impl From<url::ParseError> for RTError {
    fn from(err: url::ParseError) -> Self {
        RTError::InvalidEndpoint(err)
    }
}

impl From<reqwest::Error> for RTError {
    fn from(err: reqwest::Error) -> Self {
        RTError::HttpClient(err)
    }
}

impl From<TryInitError> for RTError {
    fn from(err: TryInitError) -> Self {
        RTError::LoggingSetup(err)
    }
}

/// Configuration handed to the table view by its host. Immutable once the
/// model is built.
#[derive(Parser, Setters, Debug, Clone)]
#[command(version, about = "Browse the records related to a parent object, page by page.")]
#[setters(strip_option, into)]
pub struct ViewConfig {
    /// Data service endpoint the table requests pages from
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Identifier of the parent record whose related rows are shown
    #[arg(long)]
    pub record_id: Option<String>,

    /// Name of the server side table configuration
    #[arg(long)]
    pub config_name: Option<String>,

    /// Header text shown above the table
    #[arg(long, default_value = "Related Records")]
    pub table_header: String,

    /// Number of rows requested per page
    #[arg(long, default_value_t = 10)]
    pub per_page: u32,

    /// Label of the status filter
    #[arg(long, default_value = "Status")]
    pub filter_name: String,

    /// Timeout for a single data request, in seconds
    #[arg(long, default_value_t = 30)]
    pub request_timeout: u64,

    /// Terminal event poll interval, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub event_poll_time: u64,

    /// File the log is written to
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            record_id: None,
            config_name: None,
            table_header: "Related Records".to_string(),
            per_page: 10,
            filter_name: "Status".to_string(),
            request_timeout: 30,
            event_poll_time: 100,
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl ViewConfig {
    /// Log file path with `~` and environment variables expanded.
    pub fn log_path(&self) -> PathBuf {
        match shellexpand::full(&self.log_file) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => PathBuf::from(&self.log_file),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Warning,
    Error,
    Info,
    Success,
}

impl fmt::Display for ToastVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToastVariant::Warning => "warning",
            ToastVariant::Error => "error",
            ToastVariant::Info => "info",
            ToastVariant::Success => "success",
        };
        f.write_str(name)
    }
}

/// Notification event delivered to the host. Fire and forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub variant: ToastVariant,
}

#[derive(Debug)]
pub enum Message {
    Quit,
    PreviousPage,
    NextPage,
    PreviousOption,
    NextOption,
    EditFilter,
    ClearFilter,
    Reload,
    RawKey(KeyEvent),
    Loaded(FetchOutcome),
}
