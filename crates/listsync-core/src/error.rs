//! Core error types for listsync-core.
//!
//! Each layer owns a thiserror enum describing what can go wrong there;
//! [`CoreError`] folds them together for callers that only report.

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::ReconcileError;

/// Core error type for listsync-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Local contact cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Registration source errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Per-record failures collected during reconciliation
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),
}

/// Errors produced while building, sending or decoding API requests.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Base URL is unusable (unparsable, or missing its trailing slash)
    #[error("Invalid client configuration: {0}")]
    Configuration(String),

    /// Request path could not be resolved against the base URL
    #[error("Cannot resolve request path {path:?}: {source}")]
    Url {
        path: String,
        #[source]
        source: url::ParseError,
    },

    /// Request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The cancellation token fired before or during the call
    #[error("Request cancelled")]
    Cancelled,

    /// Network-level failure
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Server returned HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        details: Vec<ErrorDetail>,
    },

    /// Response body does not match the expected shape
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Update requested for a record that was never created remotely
    #[error("Cannot update {resource} without a remote ID")]
    MissingId { resource: &'static str },

    /// Payload rejected locally before it was sent
    #[error("Invalid payload: {0}")]
    Validation(String),

    /// The server handed back a cursor that was already followed
    #[error("Pagination cursor {cursor:?} was returned twice")]
    PaginationLoop { cursor: String },

    /// One layer of context naming the operation that failed
    #[error("{operation} failed: {source}")]
    Operation {
        operation: String,
        #[source]
        source: Box<ApiError>,
    },
}

/// One entry of the error array the service returns on rejected requests.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub error_key: String,
    #[serde(default)]
    pub error_message: String,
}

impl ApiError {
    /// Whether this error (or the one it wraps) is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            ApiError::Cancelled => true,
            ApiError::Operation { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// HTTP status of a rejected request, looking through operation context.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Operation { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Wrap with the name of the operation that failed.
    pub fn during(self, operation: impl Into<String>) -> Self {
        ApiError::Operation {
            operation: operation.into(),
            source: Box::new(self),
        }
    }
}

/// Adds operation context to API results.
pub trait OperationContext<T> {
    fn during(self, operation: &str) -> Result<T, ApiError>;
}

impl<T> OperationContext<T> for Result<T, ApiError> {
    fn during(self, operation: &str) -> Result<T, ApiError> {
        self.map_err(|e| e.during(operation))
    }
}

/// Local contact cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache file missing or unreadable
    #[error("Failed to read contact cache at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache file could not be written
    #[error("Failed to write contact cache to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache file exists but does not decode
    #[error("Contact cache at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Cache could not be serialized
    #[error("Failed to encode contact cache: {0}")]
    Encode(#[source] serde_json::Error),

    /// Contact has no email address to key it by
    #[error("Contact {} has no email address and cannot be cached", .id.as_deref().unwrap_or("<new>"))]
    Unindexable { id: Option<String> },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Configuration directory could not be determined or created
    #[error("Cannot access configuration directory: {0}")]
    DataDir(String),

    /// OS keyring failure
    #[error("Credential store error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Errors from the registration spreadsheet and export directory.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Filesystem failure
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Workbook could not be opened or read
    #[error("Failed to read spreadsheet {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    /// Header row lacks a required column
    #[error("Spreadsheet is missing the '{0}' column")]
    MissingColumn(String),

    /// Downloads directory has no files
    #[error("No exports found in {0}")]
    NoExports(PathBuf),

    /// Export link could not be fetched
    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Export link has no usable file name
    #[error("Cannot derive a file name from {0}")]
    InvalidLink(String),

    /// The cancellation token fired during a download
    #[error("Download cancelled")]
    Cancelled,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
