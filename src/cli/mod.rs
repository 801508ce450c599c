//! CLI entry point for sso-profiles.

pub mod browser;
pub mod configure;

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{resolve_home_relative, SsoConfig, DEFAULT_NAMESPACE, DEFAULT_REGION};

/// Generate AWS CLI profiles for every account and role an IAM Identity
/// Center login grants.
#[derive(Parser, Debug)]
#[command(name = "sso-profiles", version)]
pub struct Cli {
    /// Access portal URL, e.g. https://my-org.awsapps.com/start
    #[arg(env = "SSO_PORTAL_URL")]
    pub portal_url: String,

    /// Prefix for generated profile names.
    ///
    /// Only sections named `[profile <NAMESPACE>-...]` are owned and pruned;
    /// a section such as `[profile ssoadmin]` is never touched for `sso`.
    #[arg(short, long, env = "SSO_PROFILE_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Region of the Identity Center instance, also written as the profile region
    #[arg(short, long, env = "SSO_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// AWS config file to update (default ~/.aws/config)
    #[arg(long, env = "AWS_CONFIG_FILE")]
    pub config_path: Option<PathBuf>,

    /// Token cache directory (default ~/.aws/sso/cache)
    #[arg(long, env = "SSO_CACHE_DIR", hide = true)]
    pub cache_dir: Option<PathBuf>,

    #[arg(long, env = "SSO_OIDC_ENDPOINT", hide = true)]
    pub oidc_endpoint: Option<String>,

    #[arg(long, env = "SSO_PORTAL_ENDPOINT", hide = true)]
    pub portal_endpoint: Option<String>,

    /// Print the verification link instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Show what would change without writing the config file
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default `tracing` filter directive for the requested verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    pub fn to_config(&self) -> SsoConfig {
        let mut config = SsoConfig::builder()
            .portal_url(self.portal_url.clone())
            .namespace(self.namespace.clone())
            .region(self.region.clone())
            .dry_run(self.dry_run)
            .maybe_oidc_endpoint(self.oidc_endpoint.clone())
            .maybe_portal_endpoint(self.portal_endpoint.clone())
            .build();
        if let Some(path) = &self.config_path {
            config.config_path = resolve_home_relative(path);
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = resolve_home_relative(dir);
        }
        config
    }
}
