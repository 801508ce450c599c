//! sso-profiles: AWS CLI profiles from an IAM Identity Center login.
//!
//! Logs in through the OAuth2 device-authorization grant, lists every
//! account and role the login can assume, and rewrites the `[profile ...]`
//! sections of the AWS config file that belong to one namespace. Sections
//! outside that namespace are left untouched.
//!
//! # Quick Start
//!
//! ```no_run
//! use sso_profiles::auth::LogVerificationPrompt;
//! use sso_profiles::cli::configure::ProfileSync;
//! use sso_profiles::config::SsoConfig;
//!
//! # async fn example() -> sso_profiles::error::Result<()> {
//! let config = SsoConfig::builder()
//!     .portal_url("https://my-org.awsapps.com/start")
//!     .build();
//! let report = ProfileSync::new(config)?.run(&LogVerificationPrompt).await?;
//! println!("{} profiles added", report.plan.inserted.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod portal;
pub mod profile;
pub mod store;
pub mod util;
