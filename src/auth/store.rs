use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::token::BearerToken;

/// Storage abstraction for the cached access token.
///
/// `load` treats every miss (absent, unreadable, malformed, expired) as
/// `None`; only `save` reports failures.
pub trait TokenCache: Send + Sync {
    fn load(&self, client_name: &str) -> Option<BearerToken>;
    fn save(&self, client_name: &str, token: &BearerToken) -> Result<(), AuthError>;
}

/// File-backed token cache: one JSON record per client name.
///
/// # Example
/// ```no_run
/// use chrono::{Duration, Utc};
/// use sso_profiles::auth::{BearerToken, FileTokenCache, TokenCache};
///
/// let cache = FileTokenCache::new_default();
/// let token = BearerToken::expiring_in("access", Duration::hours(8), Utc::now());
/// cache.save("profile_manager", &token)?;
/// # Ok::<(), sso_profiles::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenCache {
    base_dir: PathBuf,
}

impl FileTokenCache {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_cache_dir(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn token_path(&self, client_name: &str) -> PathBuf {
        self.base_dir.join(format!("{client_name}.json"))
    }

    /// Same as [`TokenCache::load`] but with an explicit clock.
    pub fn load_at(&self, client_name: &str, now: DateTime<Utc>) -> Option<BearerToken> {
        let path = self.token_path(client_name);
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "token cache miss");
                return None;
            }
        };
        let record: CachedTokenRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "ignoring malformed token cache");
                return None;
            }
        };
        let token = record.into_token()?;
        if !token.is_valid_at(now) {
            tracing::debug!(expires_at = %token.expires_at, "cached token expired");
            return None;
        }
        Some(token)
    }
}

impl TokenCache for FileTokenCache {
    fn load(&self, client_name: &str) -> Option<BearerToken> {
        self.load_at(client_name, Utc::now())
    }

    fn save(&self, client_name: &str, token: &BearerToken) -> Result<(), AuthError> {
        fs::create_dir_all(&self.base_dir)?;
        let path = self.token_path(client_name);
        let record = CachedTokenRecord::from_token(token);
        let serialized = serde_json::to_string(&record)?;
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path)?;
        // `mode` only applies on creation; tighten a pre-existing file first.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(serialized.as_bytes())?;
        tracing::debug!(path = %path.display(), "cached access token");
        Ok(())
    }
}

/// On-disk shape: `{"expires": <epoch seconds>, "token": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedTokenRecord {
    expires: f64,
    token: String,
}

impl CachedTokenRecord {
    fn from_token(token: &BearerToken) -> Self {
        Self {
            expires: token.expires_at.timestamp_micros() as f64 / 1_000_000.0,
            token: token.value.clone(),
        }
    }

    fn into_token(self) -> Option<BearerToken> {
        if !self.expires.is_finite() {
            return None;
        }
        let micros = (self.expires * 1_000_000.0).round() as i64;
        let expires_at = DateTime::<Utc>::from_timestamp_micros(micros)?;
        Some(BearerToken::new(self.token, expires_at))
    }
}

pub fn default_cache_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".aws").join("sso").join("cache"))
        .unwrap_or_else(|| PathBuf::from(".aws/sso/cache"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn temp_cache() -> (TempDir, FileTokenCache) {
        let dir = TempDir::new().unwrap();
        let cache = FileTokenCache::new(dir.path().join("sso").join("cache"));
        (dir, cache)
    }

    #[test]
    fn save_then_load_returns_unexpired_token() {
        let (_dir, cache) = temp_cache();
        let token = BearerToken::expiring_in("access", Duration::hours(1), Utc::now());
        cache.save("profile_manager", &token).unwrap();

        let loaded = cache.load("profile_manager").unwrap();
        assert_eq!(loaded.value, "access");
        assert!((loaded.expires_at - token.expires_at).num_milliseconds().abs() <= 1);
    }

    #[cfg(unix)]
    #[test]
    fn saved_token_is_private_even_when_file_existed() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, cache) = temp_cache();
        let token = BearerToken::expiring_in("access", Duration::hours(1), Utc::now());
        cache.save("fresh", &token).unwrap();
        let mode = fs::metadata(cache.token_path("fresh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let existing = cache.token_path("existing");
        fs::write(&existing, "{}").unwrap();
        fs::set_permissions(&existing, fs::Permissions::from_mode(0o644)).unwrap();
        cache.save("existing", &token).unwrap();
        let mode = fs::metadata(&existing).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(cache.load("existing").unwrap().value, "access");
    }

    #[test]
    fn save_creates_cache_directory() {
        let (_dir, cache) = temp_cache();
        assert!(!cache.base_dir().exists());
        let token = BearerToken::expiring_in("access", Duration::hours(1), Utc::now());
        cache.save("profile_manager", &token).unwrap();
        assert!(cache.token_path("profile_manager").exists());
    }

    #[test]
    fn expired_token_is_a_miss() {
        let (_dir, cache) = temp_cache();
        let now = Utc::now();
        cache
            .save("profile_manager", &BearerToken::new("old", now))
            .unwrap();
        assert!(cache.load_at("profile_manager", now).is_none());
        assert!(cache
            .load_at("profile_manager", now - Duration::seconds(5))
            .is_some());
    }

    #[test]
    fn missing_file_is_a_miss() {
        let (_dir, cache) = temp_cache();
        assert!(cache.load("profile_manager").is_none());
    }

    #[test]
    fn malformed_file_is_a_miss() {
        let (_dir, cache) = temp_cache();
        fs::create_dir_all(cache.base_dir()).unwrap();
        fs::write(cache.token_path("profile_manager"), "{not json").unwrap();
        assert!(cache.load("profile_manager").is_none());

        fs::write(cache.token_path("profile_manager"), r#"{"token":"x"}"#).unwrap();
        assert!(cache.load("profile_manager").is_none());
    }

    #[test]
    fn record_uses_epoch_seconds_float() {
        let (_dir, cache) = temp_cache();
        let expires_at = DateTime::<Utc>::from_timestamp(4_000_000_000, 500_000_000).unwrap();
        cache
            .save("profile_manager", &BearerToken::new("abc", expires_at))
            .unwrap();

        let raw = fs::read_to_string(cache.token_path("profile_manager")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["token"], "abc");
        assert_eq!(value["expires"].as_f64(), Some(4_000_000_000.5));
    }

    #[test]
    fn save_overwrites_previous_record() {
        let (_dir, cache) = temp_cache();
        let now = Utc::now();
        cache
            .save("profile_manager", &BearerToken::expiring_in("first", Duration::hours(1), now))
            .unwrap();
        cache
            .save("profile_manager", &BearerToken::expiring_in("second", Duration::hours(1), now))
            .unwrap();
        assert_eq!(cache.load("profile_manager").unwrap().value, "second");
    }
}
