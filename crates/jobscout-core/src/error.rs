use thiserror::Error;

/// Application-wide error types for jobscout.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request or bounded wait timed out.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// The driven browser session failed (launch, navigation, element lookup).
    #[error("Browser error: {0}")]
    BrowserError(String),

    /// A single posting or result card could not be turned into a record.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// Completion API call failed.
    #[error("LLM error (HTTP {status_code}): {message}")]
    LlmError { message: String, status_code: u16 },

    /// HTML-to-Markdown conversion failed.
    #[error("Cleaner error: {0}")]
    CleanerError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Returns true for failures of the transport to a remote source
    /// (as opposed to malformed data coming back from it).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_)
                | AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::BrowserError(_)
        )
    }
}
