//! Verification prompts for the device-authorization step.

use std::process::{Command, Stdio};

use crate::auth::{DeviceAuthorization, VerificationPrompt};

/// Prints the verification link and user code to stderr, then tries to
/// open the link in the default browser unless disabled.
#[derive(Debug, Clone, Copy)]
pub struct BrowserPrompt {
    open_browser: bool,
}

impl BrowserPrompt {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl VerificationPrompt for BrowserPrompt {
    fn prompt(&self, authorization: &DeviceAuthorization) {
        eprintln!("🔗 Visit: {}", authorization.verification_uri_complete);
        eprintln!("📋 Confirm code: {}", authorization.user_code);
        if self.open_browser {
            if let Err(err) = open_url(&authorization.verification_uri_complete) {
                tracing::debug!(error = %err, "could not launch a browser");
                eprintln!("   (could not open a browser, open the link manually)");
            }
        }
        eprintln!("⏳ Waiting for authorization...");
    }
}

/// Hand `url` to the platform opener without waiting for it to exit.
pub fn open_url(url: &str) -> std::io::Result<()> {
    let mut command = opener_command(url);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

fn opener_command(url: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(url);
        command
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", url]);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(url);
        command
    }
}
