use thiserror::Error;

/// Errors raised by the device-authorization flow and the token cache.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Client registration failed: {0}")]
    Registration(String),
    #[error("Device authorization failed: {0}")]
    DeviceAuthorization(String),
    #[error("Authorization pending")]
    AuthorizationPending,
    #[error("Provider asked to slow down")]
    SlowDown,
    #[error("Access denied")]
    AccessDenied,
    #[error("Device code expired before authorization completed")]
    ExpiredToken,
    #[error("Token request rejected: {code}: {description}")]
    TokenRejected { code: String, description: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AuthError {
    /// Whether the token exchange should simply be attempted again.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::AuthorizationPending)
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
