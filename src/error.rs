use std::path::PathBuf;
use thiserror::Error;

/// The main error type for loanfetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dataset reference '{input}': {message}")]
    InvalidDatasetRef { input: String, message: String },

    #[error("Missing credentials: {message}")]
    MissingCredentials { message: String },

    #[error("Failed to parse credentials file {path}: {source}")]
    CredentialsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Remote API error for dataset '{dataset}': {message}")]
    RemoteApi { dataset: String, message: String },

    #[error("Not authorized to download dataset '{dataset}' (check your credentials)")]
    Unauthorized { dataset: String },

    #[error("Dataset '{dataset}' was not found")]
    DatasetNotFound { dataset: String },

    #[error("Failed to extract archive {path}: {message}")]
    Archive { path: PathBuf, message: String },

    #[error("Failed to list files under {path}: {message}")]
    ManifestWalk { path: PathBuf, message: String },

    #[error("Failed to create destination directory {path}: {source}")]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to summarize CSV {path}: {source}")]
    CsvSummary {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to render report as JSON: {0}")]
    ReportJson(#[source] serde_json::Error),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
}
