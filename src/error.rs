//! Error types for sanmar_inventory
//!
//! One enum per stage of a run. `RunError` wraps them and decides the
//! process exit code.

use crate::models::Backend;
use std::path::PathBuf;
use thiserror::Error;

/// Style discovery failed. Never fatal on its own: callers degrade to an
/// empty style set and log the error as a warning.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// HTTP request for a listing page or product search failed
    #[error("failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Listing page or product search answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    /// Listing page served a bot-block page instead of content
    #[error("listing page {url} rejected the scripted request")]
    Rejected { url: String },
    /// Product search answered with something other than search results
    #[error("unexpected product search response from {url}: {source}")]
    SearchFormat {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    /// Styles file could not be read
    #[error("failed to read styles file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Inventory lookup against one of the SOAP backends failed
#[derive(Debug, Error)]
pub enum InventoryQueryError {
    /// The HTTP client itself could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// HTTP request failed (network error, timeout, etc.)
    #[error("{backend} request for style {style} failed: {source}")]
    Network {
        backend: Backend,
        style: String,
        #[source]
        source: reqwest::Error,
    },
    /// Non-success status without a SOAP fault in the body
    #[error("{backend} returned HTTP {status} for style {style}")]
    HttpStatus {
        backend: Backend,
        style: String,
        status: reqwest::StatusCode,
    },
    /// Response was not the XML we expected
    #[error("malformed {backend} response for style {style}: {reason}")]
    Malformed {
        backend: Backend,
        style: String,
        reason: String,
    },
    /// Remote service reported a fault (bad credentials, unknown style, ...)
    #[error("{backend} fault for style {style}: {message}")]
    Fault {
        backend: Backend,
        style: String,
        message: String,
    },
    /// Every style in a skip-and-warn run failed
    #[error("{backend} failed for every requested style: {}", styles.join(", "))]
    AllStylesFailed {
        backend: Backend,
        styles: Vec<String>,
    },
}

/// Writing the output file failed
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported output format: {0} (expected csv or xlsx)")]
    UnsupportedFormat(String),
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("XLSX encoding failed: {0}")]
    Xlsx(#[from] zip::result::ZipError),
}

/// Settings could not be loaded or are incomplete for the chosen backend
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credentials: {} (set them in the environment or a .env file)", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Fatal outcome of a run, prefixed with the stage that failed
#[derive(Debug, Error)]
pub enum RunError {
    #[error("resolution: provide one of --url, --styles or --styles-file")]
    NoSource,
    #[error("resolution: no styles found (the site may block scripted requests; try --styles or --styles-file)")]
    NoStyles,
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("query: {0}")]
    Query(#[from] InventoryQueryError),
    #[error("query: no inventory rows returned")]
    NoRows,
    #[error("export: {0}")]
    Export(#[from] ExportError),
}

impl RunError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::NoStyles => 1,
            RunError::NoSource => 2,
            RunError::Config(_) => 3,
            RunError::Query(_) | RunError::NoRows => 4,
            RunError::Export(_) => 5,
        }
    }
}

/// Result alias for a whole run
pub type Result<T> = std::result::Result<T, RunError>;
