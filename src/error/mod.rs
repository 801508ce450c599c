//! Error types for sso-profiles.

use std::path::PathBuf;

use strum::Display;
use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for every stage of the profile pipeline.
#[derive(Error, Debug)]
pub enum SsoError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Portal error (status {status}): {message}")]
    Portal { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed config store at line {line}: {message}")]
    ConfigParse { line: usize, message: String },

    #[error("Failed to back up config store {}: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config store {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Broad error category for choosing a user-facing hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    Network,
    Storage,
    Configuration,
}

impl SsoError {
    /// Create a portal error from an HTTP status and response body.
    pub fn portal(status: u16, message: impl Into<String>) -> Self {
        Self::Portal {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth(AuthError::Network(_)) => ErrorCategory::Network,
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::Portal { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                _ => ErrorCategory::Network,
            },
            Self::Network(_) => ErrorCategory::Network,
            Self::Io(_) | Self::Backup { .. } | Self::Write { .. } => ErrorCategory::Storage,
            Self::Serialization(_) => ErrorCategory::Network,
            Self::Configuration(_) | Self::ConfigParse { .. } => ErrorCategory::Configuration,
        }
    }

    /// Short actionable hint shown under the error message.
    pub fn hint(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Authentication => {
                "Check the portal URL; delete the cached token to force a fresh login"
            }
            ErrorCategory::Network => "Check connectivity to the identity provider and retry",
            ErrorCategory::Storage => {
                "The previous config was left in place; check permissions and free space"
            }
            ErrorCategory::Configuration => "Fix the config file or command-line options and retry",
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SsoError>;
