use thiserror::Error;

/// Errors that can occur within a `ReviewProvider` implementation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The review source returned a specific error message (e.g., unknown app id).
    #[error("API error: {0}")]
    Api(String),

    /// The listing parameters were invalid for this specific provider.
    #[error("Invalid listing for provider: {0}")]
    Validation(String),

    /// An internal error occurred while mapping source data.
    #[error("Internal provider error: {0}")]
    Internal(String),
}
