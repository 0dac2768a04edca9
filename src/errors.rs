/*!
 * Error types for the annoconv application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that abort the conversion of a single file
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Input bytes are not valid UTF-8
    #[error("Unsupported encoding, input must be UTF-8: {0}")]
    Encoding(String),

    /// Required markers or elements are missing, or the content cannot be parsed
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The requested target format has no encoder
    #[error("Unsupported target format: {0}")]
    UnsupportedTarget(String),
}

/// Non-fatal problems noticed while decoding
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionWarning {
    /// Referenced media could not be probed, a fallback duration was used instead
    #[error("Media file '{media}' could not be read ({reason}), using fallback duration {fallback_secs}s")]
    MissingMedia {
        /// Media reference as written in the document
        media: String,
        /// Why probing failed
        reason: String,
        /// Duration substituted for the media length
        fallback_secs: f64,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from decoding or encoding an annotation
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
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
