//! Cloud client error types.

/// Errors produced while talking to the OpenAPI.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error {code}: {message}")]
    Api { code: i32, message: String },

    #[error("failed to sign request: {0}")]
    Signing(String),

    #[error("token acquisition paused for {0}s after repeated failures")]
    RateLimited(i64),
}

impl CloudError {
    /// Vendor code reported when the access token is no longer valid.
    pub const TOKEN_INVALID: i32 = 1010;

    pub fn is_token_invalid(&self) -> bool {
        matches!(self, CloudError::Api { code, .. } if *code == Self::TOKEN_INVALID)
    }
}
