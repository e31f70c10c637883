//! Error types for pdfannots

use thiserror::Error;

/// Result type alias for pdfannots
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pdfannots
#[derive(Error, Debug)]
pub enum Error {
    /// PDF file (or input directory) not found
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// PDF is password protected and no password was provided
    #[error("PDF is password protected")]
    PasswordRequired,

    /// Incorrect password provided
    #[error("Incorrect password")]
    IncorrectPassword,

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// Invalid file name pattern for directory inputs
    #[error("Invalid file pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Whether the error was caused by encryption (missing or wrong password).
    pub fn is_password_error(&self) -> bool {
        matches!(self, Error::PasswordRequired | Error::IncorrectPassword)
    }
}
