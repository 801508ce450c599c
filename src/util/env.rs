//! Scoped removal of ambient AWS credential variables.

use std::ffi::OsString;

/// Variables that can make the AWS tooling pick up stale credentials.
pub const AMBIENT_CREDENTIAL_VARS: [&str; 6] = [
    "AWS_PROFILE",
    "AWS_DEFAULT_PROFILE",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_SECURITY_TOKEN",
];

/// Removes a set of environment variables and puts them back on drop.
///
/// Restoration happens on every exit path, including `?` returns and
/// panics that unwind. Must not be held across threads that read the
/// environment concurrently.
///
/// # Example
/// ```
/// use sso_profiles::util::env::EnvScrubGuard;
///
/// let guard = EnvScrubGuard::ambient_credentials();
/// assert!(std::env::var_os("AWS_SESSION_TOKEN").is_none());
/// drop(guard);
/// ```
#[derive(Debug)]
pub struct EnvScrubGuard {
    saved: Vec<(String, Option<OsString>)>,
}

impl EnvScrubGuard {
    pub fn scrub(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| {
                let previous = std::env::var_os(key);
                if previous.is_some() {
                    tracing::debug!(variable = key, "unsetting ambient variable for this run");
                    std::env::remove_var(key);
                }
                ((*key).to_string(), previous)
            })
            .collect();
        Self { saved }
    }

    pub fn ambient_credentials() -> Self {
        Self::scrub(&AMBIENT_CREDENTIAL_VARS)
    }
}

impl Drop for EnvScrubGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}
