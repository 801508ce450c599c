//! Profile naming and settings synthesis.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::portal::ResourceTuple;

/// Section-name prefix the AWS CLI uses for named profiles.
pub const PROFILE_SECTION_PREFIX: &str = "profile ";

/// Settings of one generated profile, in the order they are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub start_url: String,
    pub account_id: String,
    pub role_name: String,
    pub region: String,
}

impl ProfileEntry {
    /// Key/value pairs as written to the config store.
    pub fn settings(&self) -> IndexMap<String, String> {
        [
            ("sso_start_url", &self.start_url),
            ("sso_account_id", &self.account_id),
            ("sso_role_name", &self.role_name),
            ("sso_region", &self.region),
            ("region", &self.region),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
    }
}

/// Synthesized profiles keyed by full section name (`profile <entry>`).
pub type ProfileSet = IndexMap<String, ProfileEntry>;

/// Convert a mixed-case identifier to lowercase hyphenated words.
///
/// ```
/// use sso_profiles::profile::hyphenate;
///
/// assert_eq!(hyphenate("MyAccountName"), "my-account-name");
/// assert_eq!(hyphenate("HTTPServer"), "http-server");
/// assert_eq!(hyphenate("already-lower"), "already-lower");
/// ```
pub fn hyphenate(word: &str) -> String {
    static ACRONYM: OnceLock<Regex> = OnceLock::new();
    static CAMEL: OnceLock<Regex> = OnceLock::new();
    let acronym =
        ACRONYM.get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid regex"));
    let camel = CAMEL.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").expect("valid regex"));

    let word = acronym.replace_all(word, "${1}-${2}");
    let word = camel.replace_all(&word, "${1}-${2}");
    word.to_lowercase()
}

/// Profile name for an account/role pair under `namespace`.
pub fn entry_name(namespace: &str, resource_name: &str, role_name: &str) -> String {
    [namespace.to_string(), hyphenate(resource_name), hyphenate(role_name)].join("-")
}

/// Full config-store section name for a profile name.
pub fn section_name(entry_name: &str) -> String {
    format!("{PROFILE_SECTION_PREFIX}{entry_name}")
}

/// Map every tuple to a named profile.
///
/// When two tuples produce the same name the later one wins; the collision
/// is logged but does not change the result.
pub fn synthesize(
    tuples: &[ResourceTuple],
    namespace: &str,
    portal_url: &str,
    region: &str,
) -> ProfileSet {
    let mut profiles = ProfileSet::new();
    for tuple in tuples {
        let section = section_name(&entry_name(
            namespace,
            &tuple.resource_name,
            &tuple.role_name,
        ));
        let entry = ProfileEntry {
            start_url: portal_url.to_string(),
            account_id: tuple.resource_id.clone(),
            role_name: tuple.role_name.clone(),
            region: region.to_string(),
        };
        if let Some(previous) = profiles.insert(section.clone(), entry) {
            tracing::warn!(
                section = %section,
                replaced_account = %previous.account_id,
                account = %tuple.resource_id,
                "profile name collision, keeping the later account"
            );
        }
    }
    profiles
}
