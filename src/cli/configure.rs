//! The profile sync pipeline and its CLI handler.

use std::sync::Arc;

use crate::auth::providers::sso_oidc::SsoOidcClient;
use crate::auth::{
    BearerToken, DeviceAuthClient, FileTokenCache, LoginOutcome, TokenCache, VerificationPrompt,
};
use crate::cli::browser::BrowserPrompt;
use crate::cli::Cli;
use crate::config::SsoConfig;
use crate::error::Result;
use crate::portal::{ResourceEnumerator, ResourceTuple};
use crate::profile::{synthesize, ProfileSet};
use crate::store::{read_store, ReconcileReport, Reconciler, StoreWriter};
use crate::util::env::EnvScrubGuard;
use crate::util::retry::PollPolicy;

/// Login, enumerate, synthesize, reconcile.
///
/// Each step is exposed separately so the CLI can report progress between
/// them; [`ProfileSync::run`] chains them for library callers.
pub struct ProfileSync {
    config: SsoConfig,
    auth: DeviceAuthClient,
    portal: ResourceEnumerator,
    writer: Option<Box<dyn StoreWriter>>,
}

impl ProfileSync {
    /// Build a pipeline backed by the on-disk token cache.
    pub fn new(config: SsoConfig) -> Result<Self> {
        let cache = Arc::new(FileTokenCache::new(config.cache_dir.clone()));
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: SsoConfig, cache: Arc<dyn TokenCache>) -> Result<Self> {
        config.validate()?;
        let auth = DeviceAuthClient::new(
            SsoOidcClient::new(config.oidc_endpoint()),
            cache,
            config.client_name.clone(),
        )
        .with_poll_policy(PollPolicy::unbounded(config.poll_interval));
        let portal = ResourceEnumerator::new(config.portal_endpoint());
        Ok(Self {
            config,
            auth,
            portal,
            writer: None,
        })
    }

    /// Replace the atomic file writer used for the final store write.
    pub fn with_writer(mut self, writer: Box<dyn StoreWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn config(&self) -> &SsoConfig {
        &self.config
    }

    /// Parse the config store without changing it; returns its section count.
    pub fn check_store(&self) -> Result<usize> {
        let (_, store) = read_store(&self.config.config_path)?;
        Ok(store.len())
    }

    pub async fn login(&self, prompt: &dyn VerificationPrompt) -> Result<LoginOutcome> {
        Ok(self.auth.login(&self.config.portal_url, prompt).await?)
    }

    pub async fn enumerate(&self, token: &BearerToken) -> Result<Vec<ResourceTuple>> {
        self.portal.enumerate(token).await
    }

    pub fn synthesize(&self, tuples: &[ResourceTuple]) -> ProfileSet {
        synthesize(
            tuples,
            &self.config.namespace,
            &self.config.portal_url,
            &self.config.region,
        )
    }

    /// Consumes the pipeline since the store writer is moved into the reconciler.
    pub fn reconcile(self, profiles: &ProfileSet) -> Result<ReconcileReport> {
        let mut reconciler =
            Reconciler::new(self.config.namespace.clone()).dry_run(self.config.dry_run);
        if let Some(writer) = self.writer {
            reconciler = reconciler.with_writer(writer);
        }
        reconciler.reconcile(&self.config.config_path, profiles)
    }

    /// Run every step with ambient AWS credentials removed from the environment.
    pub async fn run(self, prompt: &dyn VerificationPrompt) -> Result<ReconcileReport> {
        let _scrub = EnvScrubGuard::ambient_credentials();
        self.check_store()?;
        let outcome = self.login(prompt).await?;
        let tuples = self.enumerate(&outcome.token).await?;
        let profiles = self.synthesize(&tuples);
        self.reconcile(&profiles)
    }
}

/// Handle `sso-profiles <PORTAL_URL>`.
pub async fn handle_configure(cli: &Cli) -> Result<()> {
    let config = cli.to_config();
    let config_path = config.config_path.clone();
    let sync = ProfileSync::new(config)?;
    let _scrub = EnvScrubGuard::ambient_credentials();

    eprintln!("📝 Reading config {}", config_path.display());
    let sections = sync.check_store()?;
    tracing::debug!(sections, "config store parsed");

    eprintln!("🔐 Logging in to {}", sync.config().portal_url);
    let outcome = sync.login(&BrowserPrompt::new(!cli.no_browser)).await?;
    if outcome.from_cache {
        eprintln!("✅ Using cached login (expires {})", outcome.token.expires_at);
    } else {
        eprintln!("✅ Login successful");
    }

    eprintln!("🔎 Listing accounts and roles...");
    let tuples = sync.enumerate(&outcome.token).await?;
    let profiles = sync.synthesize(&tuples);
    eprintln!("   {} role(s) found, {} profile(s)", tuples.len(), profiles.len());

    eprintln!("📝 Updating config {}", config_path.display());
    let report = sync.reconcile(&profiles)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &ReconcileReport) {
    let plan = &report.plan;
    if !report.written {
        eprintln!("Dry run, nothing written.");
        for name in &plan.inserted {
            eprintln!("  + [{name}]");
        }
        for name in &plan.updated {
            eprintln!("  ~ [{name}]");
        }
        for name in &plan.removed {
            eprintln!("  - [{name}]");
        }
    }
    if let Some(backup) = &report.backup {
        eprintln!("💾 Backup: {}", backup.display());
    }
    eprintln!(
        "✅ {} added, {} updated, {} unchanged, {} removed",
        plan.inserted.len(),
        plan.updated.len(),
        plan.unchanged.len(),
        plan.removed.len()
    );
}
