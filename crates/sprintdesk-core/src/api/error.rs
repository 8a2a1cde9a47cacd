use thiserror::Error;

/// Errors surfaced by the API layer and the session on top of it.
///
/// `Clone` so a single refresh outcome can be handed to every caller that
/// awaited the same in-flight exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Session refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            400 | 422 => ApiError::Validation(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Whether the server rejected the credential itself.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthorized | ApiError::AccessDenied(_) | ApiError::Validation(_)
        )
    }

    /// Short message suitable for a status line or form error.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized | ApiError::RefreshFailed(_) => {
                "Session expired. Please log in again.".to_string()
            }
            ApiError::RateLimited => {
                "Server is busy. Please wait a moment and try again.".to_string()
            }
            ApiError::NetworkError(_) => "Network error. Check your connection.".to_string(),
            ApiError::MalformedCredential(_) => {
                "The server sent an unexpected login response.".to_string()
            }
            other => format!("Error: {}", other),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::InvalidResponse(e.to_string())
        } else {
            ApiError::NetworkError(e.to_string())
        }
    }
}
