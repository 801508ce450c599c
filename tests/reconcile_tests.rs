mod support;

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, TimeZone};
use pretty_assertions::assert_eq;
use sso_profiles::error::SsoError;
use sso_profiles::portal::ResourceTuple;
use sso_profiles::profile::{synthesize, ProfileSet};
use sso_profiles::store::{ConfigStore, Reconciler};
use support::{FailingWriter, PORTAL_URL};
use tempfile::TempDir;

const EXISTING: &str = "\
# personal settings

[default]
region = eu-west-1
output = json

# kept by hand
[profile other-thing]
region = ap-southeast-2
role_arn = arn:aws:iam::999999999999:role/Thing
source_profile = default

[profile sso-retired-admin]
sso_start_url = https://example.awsapps.com/start
sso_account_id = 444444444444
sso_role_name = Admin
sso_region = us-east-1
region = us-east-1
";

fn loaded_at() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
}

fn profiles(tuples: &[(&str, &str, &str)]) -> ProfileSet {
    let tuples: Vec<ResourceTuple> = tuples
        .iter()
        .map(|(id, name, role)| ResourceTuple::new(*id, *name, *role))
        .collect();
    synthesize(&tuples, "sso", PORTAL_URL, "us-east-1")
}

fn sandbox() -> ProfileSet {
    profiles(&[("123456789011", "Sandbox", "Admin")])
}

fn write_store(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config");
    fs::write(&path, contents).unwrap();
    path
}

fn backups(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains(".bak"))
        .collect();
    names.sort();
    names
}

#[test]
fn sandbox_profile_is_written_to_a_new_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".aws").join("config");

    let report = Reconciler::new("sso")
        .reconcile_at(&path, &sandbox(), loaded_at())
        .unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "\
[profile sso-sandbox-admin]
sso_start_url = https://example.awsapps.com/start
sso_account_id = 123456789011
sso_role_name = Admin
sso_region = us-east-1
region = us-east-1

"
    );
    assert_eq!(report.plan.inserted, vec!["profile sso-sandbox-admin"]);
    assert!(report.backup.is_none());
    assert!(report.written);
    assert!(backups(path.parent().unwrap()).is_empty());
}

#[test]
fn foreign_sections_survive_and_stale_profiles_are_pruned() {
    let dir = TempDir::new().unwrap();
    let path = write_store(&dir, EXISTING);

    let report = Reconciler::new("sso")
        .reconcile_at(&path, &sandbox(), loaded_at())
        .unwrap();

    let store = ConfigStore::parse(&fs::read_to_string(&path).unwrap()).unwrap();
    let names: Vec<&str> = store.section_names().collect();
    assert_eq!(
        names,
        vec!["default", "profile other-thing", "profile sso-sandbox-admin"]
    );
    let other = store.section("profile other-thing").unwrap();
    assert_eq!(
        other.settings().collect::<Vec<_>>(),
        vec![
            ("region", "ap-southeast-2"),
            ("role_arn", "arn:aws:iam::999999999999:role/Thing"),
            ("source_profile", "default"),
        ]
    );
    assert_eq!(report.plan.removed, vec!["profile sso-retired-admin"]);
    let rendered = fs::read_to_string(&path).unwrap();
    assert!(rendered.starts_with("# personal settings\n\n[default]\n"));
    assert!(rendered.contains("# kept by hand\n[profile other-thing]\n"));
}

#[test]
fn pruning_only_touches_missing_pairs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config");
    let both = profiles(&[("1", "Sandbox", "Admin"), ("2", "Prod", "ReadOnly")]);
    Reconciler::new("sso")
        .reconcile_at(&path, &both, loaded_at())
        .unwrap();

    let only_sandbox = profiles(&[("1", "Sandbox", "Admin")]);
    let report = Reconciler::new("sso")
        .reconcile_at(&path, &only_sandbox, loaded_at())
        .unwrap();

    assert_eq!(report.plan.removed, vec!["profile sso-prod-read-only"]);
    assert_eq!(report.plan.unchanged, vec!["profile sso-sandbox-admin"]);
    let store = ConfigStore::parse(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(store.contains("profile sso-sandbox-admin"));
    assert!(!store.contains("profile sso-prod-read-only"));
}

#[test]
fn second_run_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let path = write_store(&dir, EXISTING);
    let wanted = profiles(&[("1", "Sandbox", "Admin"), ("2", "DataLake", "PowerUser")]);

    Reconciler::new("sso")
        .reconcile_at(&path, &wanted, loaded_at())
        .unwrap();
    let first = fs::read(&path).unwrap();
    let report = Reconciler::new("sso")
        .reconcile_at(&path, &wanted, loaded_at())
        .unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second);
    assert!(report.plan.is_noop());
}

#[test]
fn backup_holds_the_pre_run_contents() {
    let dir = TempDir::new().unwrap();
    let path = write_store(&dir, EXISTING);

    let report = Reconciler::new("sso")
        .reconcile_at(&path, &sandbox(), loaded_at())
        .unwrap();

    let backup = report.backup.unwrap();
    assert_eq!(
        backup.file_name().unwrap().to_string_lossy(),
        "config.202610190930.bak"
    );
    assert_eq!(fs::read_to_string(backup).unwrap(), EXISTING);
}

#[test]
fn failed_write_leaves_original_and_backup() {
    let dir = TempDir::new().unwrap();
    let path = write_store(&dir, EXISTING);
    let before = ConfigStore::parse(EXISTING).unwrap();

    let err = Reconciler::new("sso")
        .with_writer(Box::new(FailingWriter))
        .reconcile_at(&path, &sandbox(), loaded_at())
        .unwrap_err();

    assert!(matches!(err, SsoError::Write { .. }));
    let after = ConfigStore::parse(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(after, before);
    assert_eq!(backups(dir.path()), vec!["config.202610190930.bak"]);
}

#[test]
fn dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_store(&dir, EXISTING);

    let report = Reconciler::new("sso")
        .dry_run(true)
        .reconcile_at(&path, &sandbox(), loaded_at())
        .unwrap();

    assert!(!report.written);
    assert!(report.backup.is_none());
    assert_eq!(report.plan.inserted, vec!["profile sso-sandbox-admin"]);
    assert_eq!(fs::read_to_string(&path).unwrap(), EXISTING);
    assert!(backups(dir.path()).is_empty());
}

#[test]
fn malformed_store_is_rejected_before_any_write() {
    let dir = TempDir::new().unwrap();
    let path = write_store(&dir, "region = us-east-1\n[default]\n");

    let err = Reconciler::new("sso")
        .reconcile_at(&path, &sandbox(), loaded_at())
        .unwrap_err();

    assert!(matches!(err, SsoError::ConfigParse { line: 1, .. }));
    assert!(backups(dir.path()).is_empty());
}

#[test]
fn other_namespaces_are_left_alone() {
    let dir = TempDir::new().unwrap();
    let path = write_store(
        &dir,
        "[profile grow-sandbox-admin]\nsso_account_id = 1\n\n[profile ssoadmin]\nregion = us-east-1\n",
    );

    let report = Reconciler::new("sso")
        .reconcile_at(&path, &ProfileSet::new(), loaded_at())
        .unwrap();

    assert!(report.plan.removed.is_empty());
    let store = ConfigStore::parse(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(store.contains("profile grow-sandbox-admin"));
    assert!(store.contains("profile ssoadmin"));
}

#[cfg(unix)]
#[test]
fn backup_failure_aborts_before_touching_the_store() {
    let dir = TempDir::new().unwrap();
    let path = write_store(&dir, EXISTING);
    // A dangling symlink at the backup name defeats the exclusive create.
    std::os::unix::fs::symlink(
        dir.path().join("nowhere"),
        dir.path().join("config.202610190930.bak"),
    )
    .unwrap();

    let err = Reconciler::new("sso")
        .reconcile_at(&path, &sandbox(), loaded_at())
        .unwrap_err();

    assert!(matches!(err, SsoError::Backup { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), EXISTING);
    assert!(!dir.path().join("nowhere").exists());
}

#[cfg(unix)]
#[test]
fn symlinked_store_is_updated_through_the_link() {
    let dir = TempDir::new().unwrap();
    let dotfiles = dir.path().join("dotfiles");
    fs::create_dir(&dotfiles).unwrap();
    let target = dotfiles.join("aws-config");
    fs::write(&target, EXISTING).unwrap();
    let link = dir.path().join("config");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let report = Reconciler::new("sso")
        .reconcile_at(&link, &sandbox(), loaded_at())
        .unwrap();

    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    let store = ConfigStore::parse(&fs::read_to_string(&target).unwrap()).unwrap();
    assert!(store.contains("profile sso-sandbox-admin"));
    assert!(store.contains("profile other-thing"));
    assert_eq!(
        report.backup.unwrap(),
        dir.path().join("config.202610190930.bak")
    );
}
