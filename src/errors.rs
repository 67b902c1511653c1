/*!
 * Error types for the subforge application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while reading, editing or writing subtitles
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubtitleError {
    /// Content could not be parsed by any parser for its format
    #[error("Failed to parse {format} subtitles: {message}")]
    Parse {
        /// Format that was attempted
        format: String,
        /// Parser diagnostic
        message: String,
    },

    /// File extension or format name is not supported
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    /// A time cell edit did not match hh:mm:ss.zzz
    #[error("Invalid time '{0}', expected hh:mm:ss.zzz")]
    TimeFormat(String),

    /// Writing a subtitle file failed
    #[error("Failed to save subtitles to {path}: {message}")]
    Serialize {
        /// Destination path
        path: String,
        /// Underlying failure
        message: String,
    },

    /// An edit referenced a cue id that is not in the collection
    #[error("Unknown cue id: {0}")]
    UnknownCue(String),

    /// Reading a subtitle file failed
    #[error("File error: {0}")]
    Io(String),
}

/// Errors raised by the table projection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Row {row} is out of range (row count {row_count})")]
    RowOutOfRange { row: usize, row_count: usize },

    #[error("Column {0} is out of range")]
    ColumnOutOfRange(usize),

    #[error("Table is read-only")]
    ReadOnly,

    #[error("Edit rejected: {0}")]
    Edit(#[from] SubtitleError),
}

/// Errors raised by the optimization session state machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A run is already in progress
    #[error("An optimization run is already in progress")]
    AlreadyRunning,

    /// No subtitle file has been loaded yet
    #[error("No subtitle file loaded")]
    NoTask,
}

/// Errors produced by a background worker run
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Error from the LLM provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The model answered with something that is not a usable mapping
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    /// The run was cancelled
    #[error("Run cancelled")]
    Cancelled,

    /// Any other failure
    #[error("{0}")]
    Failed(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the table projection
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Error from the optimization session
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The optimization run reported an error
    #[error("Optimization failed: {0}")]
    Optimization(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
