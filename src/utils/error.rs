// src/utils/error.rs
use thiserror::Error;

// Missing fragments, unresolved hotspot links, empty content roots and
// unmatched grid shapes are not errors: the core degrades instead.

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No document to process")]
    NoDocument,

    #[error("Invalid selection rectangle: {0}")]
    InvalidRect(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error {status} for {url}")]
    Http { status: reqwest::StatusCode, url: String },

    #[error("Request timed out after {seconds}s: {url}")]
    Timeout { url: String, seconds: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read environment map {path}: {source}")]
    EnvironmentMapIo { path: String, source: std::io::Error },

    #[error("Invalid environment map {path}: {reason}")]
    EnvironmentMapFormat { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Fetching failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
