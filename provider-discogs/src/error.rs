//! Error types for the Discogs provider

use thiserror::Error;

/// Discogs provider errors
#[derive(Error, Debug)]
pub enum DiscogsError {
    /// Token rejected or missing
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Discogs API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    #[error("Release not found: {release_id}")]
    ReleaseNotFound { release_id: u64 },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

/// Result type for Discogs operations
pub type Result<T> = std::result::Result<T, DiscogsError>;

impl From<DiscogsError> for bridge_traits::error::BridgeError {
    fn from(error: DiscogsError) -> Self {
        use bridge_traits::error::BridgeError;

        match error {
            DiscogsError::AuthenticationFailed(msg) => {
                BridgeError::OperationFailed(format!("Discogs authentication failed: {}", msg))
            }
            DiscogsError::ApiError {
                status_code,
                message,
            } => BridgeError::OperationFailed(format!(
                "Discogs API error (status {}): {}",
                status_code, message
            )),
            DiscogsError::RateLimitExceeded {
                retry_after_seconds,
            } => BridgeError::OperationFailed(format!(
                "Discogs rate limit exceeded, retry after {} seconds",
                retry_after_seconds
            )),
            DiscogsError::ReleaseNotFound { release_id } => {
                BridgeError::OperationFailed(format!("Discogs release not found: {}", release_id))
            }
            DiscogsError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Discogs parse error: {}", msg))
            }
            DiscogsError::NetworkError(msg) => {
                BridgeError::OperationFailed(format!("Discogs network error: {}", msg))
            }
            DiscogsError::Bridge(e) => e,
        }
    }
}
