//! Run configuration: defaults, home-relative paths, validation.
//!
//! Layering is defaults < environment (including `.env`) < command-line
//! flags. The CLI resolves the first two through clap's `env` support; this
//! module owns the defaults and the checks.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;

use crate::auth::providers::sso_oidc::default_oidc_endpoint;
use crate::auth::store::default_cache_dir;
use crate::error::{Result, SsoError};
use crate::portal::default_portal_endpoint;

pub const DEFAULT_NAMESPACE: &str = "sso";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_CLIENT_NAME: &str = "profile_manager";
pub const DEFAULT_CONFIG_FILE: &str = ".aws/config";

/// Everything one profile-sync run needs.
///
/// # Example
/// ```
/// use sso_profiles::config::SsoConfig;
///
/// let config = SsoConfig::builder()
///     .portal_url("https://example.awsapps.com/start")
///     .build();
/// assert_eq!(config.namespace, "sso");
/// assert_eq!(config.oidc_endpoint(), "https://oidc.us-east-1.amazonaws.com");
/// config.validate()?;
/// # Ok::<(), sso_profiles::error::SsoError>(())
/// ```
#[derive(Debug, Clone, Builder)]
pub struct SsoConfig {
    /// IAM Identity Center access portal (start URL).
    #[builder(into)]
    pub portal_url: String,
    #[builder(into, default = DEFAULT_NAMESPACE.to_string())]
    pub namespace: String,
    #[builder(into, default = DEFAULT_REGION.to_string())]
    pub region: String,
    #[builder(into, default = default_config_path())]
    pub config_path: PathBuf,
    #[builder(into, default = default_cache_dir())]
    pub cache_dir: PathBuf,
    #[builder(into, default = DEFAULT_CLIENT_NAME.to_string())]
    pub client_name: String,
    /// Override for the OIDC endpoint, mainly for tests.
    #[builder(into)]
    pub oidc_endpoint: Option<String>,
    /// Override for the portal endpoint, mainly for tests.
    #[builder(into)]
    pub portal_endpoint: Option<String>,
    #[builder(default = Duration::from_secs(1))]
    pub poll_interval: Duration,
    #[builder(default)]
    pub dry_run: bool,
}

impl SsoConfig {
    pub fn oidc_endpoint(&self) -> String {
        self.oidc_endpoint
            .clone()
            .unwrap_or_else(|| default_oidc_endpoint(&self.region))
    }

    pub fn portal_endpoint(&self) -> String {
        self.portal_endpoint
            .clone()
            .unwrap_or_else(|| default_portal_endpoint(&self.region))
    }

    /// Reject values that would produce unusable or unsafe profile names.
    pub fn validate(&self) -> Result<()> {
        if !(self.portal_url.starts_with("https://") || self.portal_url.starts_with("http://")) {
            return Err(SsoError::Configuration(format!(
                "portal URL must start with https:// (got `{}`)",
                self.portal_url
            )));
        }
        if self.namespace.is_empty() {
            return Err(SsoError::Configuration("namespace must not be empty".into()));
        }
        if self
            .namespace
            .chars()
            .any(|c| c.is_whitespace() || c == '[' || c == ']')
        {
            return Err(SsoError::Configuration(format!(
                "namespace `{}` must not contain whitespace or brackets",
                self.namespace
            )));
        }
        if self.region.trim().is_empty() {
            return Err(SsoError::Configuration("region must not be empty".into()));
        }
        if self.client_name.is_empty()
            || self
                .client_name
                .contains(|c: char| c == '/' || c == '\\' || c == '.')
        {
            return Err(SsoError::Configuration(format!(
                "client name `{}` must be a plain file stem",
                self.client_name
            )));
        }
        Ok(())
    }
}

/// `~/.aws/config`, or `$AWS_CONFIG_FILE` resolved against the home directory.
pub fn default_config_path() -> PathBuf {
    match std::env::var_os("AWS_CONFIG_FILE") {
        Some(value) if !value.is_empty() => resolve_home_relative(Path::new(&value)),
        _ => home_relative(DEFAULT_CONFIG_FILE),
    }
}

/// Absolute paths are kept; relative ones are taken from the home directory.
pub fn resolve_home_relative(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if let Ok(rest) = path.strip_prefix("~") {
        return home_dir().join(rest);
    }
    home_dir().join(path)
}

fn home_relative(relative: &str) -> PathBuf {
    home_dir().join(relative)
}

fn home_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
