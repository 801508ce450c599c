//! sso-profiles binary entry point.

use sso_profiles::cli::{configure, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // A missing .env is the normal case.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = configure::handle_configure(&cli).await {
        tracing::debug!(category = %e.category(), "run failed");
        eprintln!("Error: {e}");
        eprintln!("Hint: {}", e.hint());
        std::process::exit(1);
    }
}
