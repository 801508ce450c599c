use chrono::{DateTime, Duration, Utc};

/// Bearer token issued by the identity provider.
///
/// # Example
/// ```
/// use chrono::{Duration, Utc};
/// use sso_profiles::auth::BearerToken;
///
/// let token = BearerToken::expiring_in("access", Duration::hours(8), Utc::now());
/// assert!(token.is_valid_at(Utc::now()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Token whose lifetime starts at `issued_at`, saturating at the latest
    /// representable instant.
    pub fn expiring_in(
        value: impl Into<String>,
        lifetime: Duration,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let expires_at = issued_at
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(value, expires_at)
    }

    /// A token is usable only while `now` is strictly before its expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
