//! Make the namespaced profiles in a config store match a profile set.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::atomic::{atomic_write, write_backup};
use super::ini::{ConfigStore, Section};
use crate::error::{Result, SsoError};
use crate::profile::{ProfileSet, PROFILE_SECTION_PREFIX};

/// Destination for the rendered store.
///
/// The default implementation is [`AtomicFileWriter`]; tests substitute
/// writers that fail on purpose.
pub trait StoreWriter: Send + Sync {
    fn write(&self, path: &Path, contents: &[u8]) -> std::io::Result<()>;
}

/// Temp-file-then-rename writer.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomicFileWriter;

impl StoreWriter for AtomicFileWriter {
    fn write(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        atomic_write(path, contents)
    }
}

/// Section-level changes needed to reconcile a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub inserted: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub removed: Vec<String>,
}

impl ReconcilePlan {
    /// Compute the plan without touching the store.
    pub fn compute(store: &ConfigStore, namespace: &str, profiles: &ProfileSet) -> Self {
        let mut plan = Self::default();
        for (name, entry) in profiles {
            let wanted = Section::from_settings(entry.settings());
            match store.section(name) {
                None => plan.inserted.push(name.clone()),
                Some(existing) if existing.lines() == wanted.lines() => {
                    plan.unchanged.push(name.clone())
                }
                Some(_) => plan.updated.push(name.clone()),
            }
        }
        let prefix = namespace_prefix(namespace);
        plan.removed = store
            .section_names()
            .filter(|name| name.starts_with(&prefix) && !profiles.contains_key(*name))
            .map(str::to_string)
            .collect();
        plan
    }

    pub fn is_noop(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Apply merge then prune to `store`.
    pub fn apply(&self, store: &mut ConfigStore, profiles: &ProfileSet) {
        for (name, entry) in profiles {
            store.upsert(name.clone(), Section::from_settings(entry.settings()));
        }
        for name in &self.removed {
            store.remove(name);
        }
    }
}

/// Outcome of a reconcile run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub plan: ReconcilePlan,
    /// Backup of the pre-run store, if the store existed.
    pub backup: Option<PathBuf>,
    /// `false` for dry runs.
    pub written: bool,
}

/// Section prefix owned by `namespace`, e.g. `profile sso-`.
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{PROFILE_SECTION_PREFIX}{namespace}-")
}

/// Read and parse the store at `store_path`.
///
/// Returns the raw bytes (`None` when the file is absent) with the parsed
/// store, so callers can validate a config before doing anything else.
pub fn read_store(store_path: &Path) -> Result<(Option<Vec<u8>>, ConfigStore)> {
    let original = match fs::read(store_path) {
        Ok(bytes) => Some(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %store_path.display(), "config store absent, starting empty");
            None
        }
        Err(err) => return Err(SsoError::Io(err)),
    };

    let store = match &original {
        Some(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|err| {
                SsoError::Configuration(format!(
                    "{} is not valid UTF-8: {err}",
                    store_path.display()
                ))
            })?;
            ConfigStore::parse(text)?
        }
        None => ConfigStore::new(),
    };
    Ok((original, store))
}

/// Load, back up, merge, prune, and atomically rewrite a config store.
///
/// Sections outside the namespace are never modified. The store is written
/// exactly once, after every in-memory change succeeded; if that write
/// fails the original file is left in place next to its backup.
///
/// # Example
/// ```no_run
/// use sso_profiles::portal::ResourceTuple;
/// use sso_profiles::profile::synthesize;
/// use sso_profiles::store::Reconciler;
///
/// let tuples = vec![ResourceTuple::new("123456789011", "Sandbox", "Admin")];
/// let profiles = synthesize(&tuples, "sso", "https://example.awsapps.com/start", "us-east-1");
/// let report = Reconciler::new("sso").reconcile("/home/me/.aws/config".as_ref(), &profiles)?;
/// println!("{} added", report.plan.inserted.len());
/// # Ok::<(), sso_profiles::error::SsoError>(())
/// ```
pub struct Reconciler {
    namespace: String,
    writer: Box<dyn StoreWriter>,
    dry_run: bool,
}

impl Reconciler {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            writer: Box::new(AtomicFileWriter),
            dry_run: false,
        }
    }

    pub fn with_writer(mut self, writer: Box<dyn StoreWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Compute the plan only; no backup, no write.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn reconcile(&self, store_path: &Path, profiles: &ProfileSet) -> Result<ReconcileReport> {
        self.reconcile_at(store_path, profiles, Local::now())
    }

    /// Same as [`Reconciler::reconcile`] with an explicit load time.
    pub fn reconcile_at(
        &self,
        store_path: &Path,
        profiles: &ProfileSet,
        loaded_at: DateTime<Local>,
    ) -> Result<ReconcileReport> {
        let (original, mut store) = read_store(store_path)?;

        let plan = ReconcilePlan::compute(&store, &self.namespace, profiles);
        tracing::info!(
            inserted = plan.inserted.len(),
            updated = plan.updated.len(),
            unchanged = plan.unchanged.len(),
            removed = plan.removed.len(),
            "reconcile plan"
        );
        if self.dry_run {
            return Ok(ReconcileReport {
                plan,
                backup: None,
                written: false,
            });
        }

        let backup = match &original {
            Some(bytes) => {
                let path = write_backup(store_path, bytes, loaded_at).map_err(|source| {
                    SsoError::Backup {
                        path: store_path.to_path_buf(),
                        source,
                    }
                })?;
                tracing::info!(backup = %path.display(), "backed up config store");
                Some(path)
            }
            None => None,
        };

        plan.apply(&mut store, profiles);
        let rendered = store.render();
        self.writer
            .write(store_path, rendered.as_bytes())
            .map_err(|source| SsoError::Write {
                path: store_path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %store_path.display(), sections = store.len(), "wrote config store");

        Ok(ReconcileReport {
            plan,
            backup,
            written: true,
        })
    }
}
