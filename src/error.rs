//! Error types for dump-extract

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a dump and extracting rows
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Dump file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read dump file: {path}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dump file {path} is not UTF-16LE text: {message}")]
    Encoding { path: PathBuf, message: String },

    #[error("Malformed value list for table {table} at line {line}: {message} (in: {text})")]
    MalformedValueList {
        table: String,
        line: usize,
        text: String,
        message: String,
    },

    #[error("Malformed CREATE TABLE for {table} at line {line}: {message}")]
    MalformedSchema {
        table: String,
        line: usize,
        message: String,
    },

    #[error("Column {column} is not declared for table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },
}

impl ExtractError {
    /// Map an I/O error on `path` to `FileNotFound` or `ReadError`
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            ExtractError::FileNotFound { path }
        } else {
            ExtractError::ReadError { path, source }
        }
    }

    /// True for errors confined to a single statement; the scan can continue past them.
    pub fn is_line_error(&self) -> bool {
        matches!(self, ExtractError::MalformedValueList { .. })
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, ExtractError>;
