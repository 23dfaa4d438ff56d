//! Error types for archive queries.
//!
//! [`QueryError`] covers every way a request to an archive service can fail:
//! rejected parameters (caught before anything touches the network), HTTP
//! failures, undecodable payloads and unresolvable object names.
//!
//! # Error Categories
//!
//! | Variant | Raised when | Recoverable? |
//! |---------|-------------|--------------|
//! | [`InvalidRelease`](QueryError::InvalidRelease) | Unknown data release tag | No |
//! | [`InvalidTable`](QueryError::InvalidTable) | Table not published for the release | No |
//! | [`InvalidFormat`](QueryError::InvalidFormat) | Unsupported output format | No |
//! | [`InvalidParameter`](QueryError::InvalidParameter) | Bad coordinate, size, filter, option combination | No |
//! | [`UnknownColumns`](QueryError::UnknownColumns) | Requested columns missing from the schema | No |
//! | [`EmptyQuery`](QueryError::EmptyQuery) | Search without any constraint | No |
//! | [`HttpStatus`](QueryError::HttpStatus) | Non-2xx response | 5xx only |
//! | [`Transport`](QueryError::Transport) | Connection, TLS, timeout, body read | Yes |
//! | [`Parse`](QueryError::Parse) | Payload cannot be decoded | No |
//! | [`UnknownObject`](QueryError::UnknownObject) | Name resolver found no candidates | No |
//! | [`Io`](QueryError::Io) | Writing a downloaded file failed | No |
//!
//! The library never retries. [`QueryError::is_recoverable`] only tells the
//! caller whether re-issuing the same request could plausibly succeed.

use thiserror::Error;

/// Unified error type for archive queries.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Release tag is not one of the published data releases.
    #[error("Bad value for release '{release}' (must be one of {allowed})")]
    InvalidRelease { release: String, allowed: String },

    /// Table does not exist in the given release.
    #[error("Bad value for table '{table}' (for {release} must be one of {allowed})")]
    InvalidTable {
        table: String,
        release: String,
        allowed: String,
    },

    /// Output format is not supported by the endpoint.
    #[error("Bad value for format '{format}' (must be one of {allowed})")]
    InvalidFormat { format: String, allowed: String },

    /// A parameter failed validation.
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    /// Requested columns that are not in the published schema.
    #[error("Some columns not found in table: {}", .columns.join(", "))]
    UnknownColumns { columns: Vec<String> },

    /// A search was issued without any constraint.
    #[error("You must specify some parameters for search")]
    EmptyQuery,

    /// The server answered with a non-success status.
    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// The request never produced a complete response.
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The payload could not be decoded.
    #[error("Parse error ({format}): {message}")]
    Parse { format: String, message: String },

    /// The name resolver returned no candidates.
    #[error("Unknown object '{name}'")]
    UnknownObject { name: String },

    /// Local file I/O failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

/// Convenience alias for `Result<T, QueryError>`.
pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// Creates an [`InvalidRelease`](Self::InvalidRelease) error.
    pub fn invalid_release(release: &str, allowed: &[&str]) -> Self {
        Self::InvalidRelease {
            release: release.to_string(),
            allowed: allowed.join(", "),
        }
    }

    /// Creates an [`InvalidTable`](Self::InvalidTable) error.
    pub fn invalid_table(table: &str, release: &str, allowed: &[&str]) -> Self {
        Self::InvalidTable {
            table: table.to_string(),
            release: release.to_string(),
            allowed: allowed.join(", "),
        }
    }

    /// Creates an [`InvalidFormat`](Self::InvalidFormat) error.
    pub fn invalid_format(format: &str, allowed: &[&str]) -> Self {
        Self::InvalidFormat {
            format: format.to_string(),
            allowed: allowed.join(", "),
        }
    }

    /// Creates an [`InvalidParameter`](Self::InvalidParameter) error.
    pub fn invalid_parameter(name: &str, message: &str) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    pub fn unknown_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        Self::UnknownColumns {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Creates an [`HttpStatus`](Self::HttpStatus) error.
    pub fn http_status(url: &str, status: u16) -> Self {
        Self::HttpStatus {
            url: url.to_string(),
            status,
        }
    }

    /// Creates a [`Transport`](Self::Transport) error.
    pub fn transport(url: &str, message: &str) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a [`Parse`](Self::Parse) error for the named payload format.
    pub fn parse(format: &str, message: &str) -> Self {
        Self::Parse {
            format: format.to_string(),
            message: message.to_string(),
        }
    }

    pub fn unknown_object(name: &str) -> Self {
        Self::UnknownObject {
            name: name.to_string(),
        }
    }

    pub fn io(path: &str, message: &str) -> Self {
        Self::Io {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Returns `true` for failures raised before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRelease { .. }
                | Self::InvalidTable { .. }
                | Self::InvalidFormat { .. }
                | Self::InvalidParameter { .. }
                | Self::UnknownColumns { .. }
                | Self::EmptyQuery
        )
    }

    /// Returns `true` if re-issuing the same request might succeed.
    ///
    /// Transport failures and server-side (5xx) statuses qualify; client
    /// errors and validation failures never do.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
