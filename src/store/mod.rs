//! Config store parsing, atomic persistence, and reconciliation.

pub mod atomic;
pub mod ini;
pub mod reconcile;

pub use atomic::{atomic_write, backup_path};
pub use ini::{ConfigStore, Section, SectionLine};
pub use reconcile::{
    namespace_prefix, read_store, AtomicFileWriter, ReconcilePlan, ReconcileReport, Reconciler,
    StoreWriter,
};
