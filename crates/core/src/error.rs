//! Error types for the lens-core library.
//!
//! Runtime failures (configuration, the Vision API, image encoding, UI) are
//! reported through [`AppError`]. Contract violations such as passing an
//! index that does not belong to the current block list are panics instead.

use thiserror::Error;

/// Errors that can occur within the lens-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable was not found.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Image processing or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// The Vision API reported an error for the annotated image.
    #[error("Vision API error: {0}")]
    VisionApi(String),

    /// The Vision API answered with a non-success HTTP status.
    #[error("Vision API returned {status}: {message}")]
    VisionStatus {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the body, or the raw body.
        message: String,
    },

    /// Rate limited by the Vision API.
    #[error("Rate limited by Vision API, please retry later")]
    RateLimited,

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// UI-related errors (rendering, window management).
    #[error("UI error: {0}")]
    Ui(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a Vision API error with the given message.
    pub fn vision(msg: impl Into<String>) -> Self {
        Self::VisionApi(msg.into())
    }

    /// Creates a UI error with the given message.
    pub fn ui(msg: impl Into<String>) -> Self {
        Self::Ui(msg.into())
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
