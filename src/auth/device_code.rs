use serde::Deserialize;
use strum::{Display, EnumString};

/// Public client credentials issued by `client/register`.
///
/// Obtained once per login attempt and never persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: String,
}

/// Device authorization started against the identity provider.
///
/// # Example
/// ```
/// use sso_profiles::auth::DeviceAuthorization;
///
/// let auth = DeviceAuthorization {
///     device_code: "device-code".to_string(),
///     user_code: "ABCD-EFGH".to_string(),
///     verification_uri: "https://device.sso.us-east-1.amazonaws.com/".to_string(),
///     verification_uri_complete: "https://device.sso.us-east-1.amazonaws.com/?user_code=ABCD-EFGH".to_string(),
///     expires_in: 600,
///     interval: Some(1),
/// };
/// assert_eq!(auth.user_code, "ABCD-EFGH");
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub verification_uri_complete: String,
    pub expires_in: u64,
    #[serde(default)]
    pub interval: Option<u64>,
}

/// Successful device-code exchange.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Polling outcome for one token exchange attempt.
#[derive(Debug, Clone)]
pub enum DeviceCodePoll {
    Pending,
    Authorized(TokenGrant),
}

/// OAuth error codes reported by the token endpoint.
///
/// The provider reports them either in the JSON `error` field or as an
/// exception name in the `x-amzn-errortype` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum TokenErrorCode {
    #[strum(
        to_string = "authorization_pending",
        serialize = "AuthorizationPendingException"
    )]
    AuthorizationPending,
    #[strum(to_string = "slow_down", serialize = "SlowDownException")]
    SlowDown,
    #[strum(to_string = "access_denied", serialize = "AccessDeniedException")]
    AccessDenied,
    #[strum(to_string = "expired_token", serialize = "ExpiredTokenException")]
    ExpiredToken,
    #[strum(to_string = "invalid_grant", serialize = "InvalidGrantException")]
    InvalidGrant,
    #[strum(to_string = "invalid_client", serialize = "InvalidClientException")]
    InvalidClient,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OidcErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_parses_oauth_and_exception_names() {
        assert_eq!(
            "authorization_pending".parse::<TokenErrorCode>().unwrap(),
            TokenErrorCode::AuthorizationPending
        );
        assert_eq!(
            "AuthorizationPendingException"
                .parse::<TokenErrorCode>()
                .unwrap(),
            TokenErrorCode::AuthorizationPending
        );
        assert_eq!(
            "expired_token".parse::<TokenErrorCode>().unwrap(),
            TokenErrorCode::ExpiredToken
        );
        assert!("teapot".parse::<TokenErrorCode>().is_err());
    }

    #[test]
    fn device_authorization_deserializes_camel_case() {
        let auth: DeviceAuthorization = serde_json::from_value(serde_json::json!({
            "deviceCode": "dc",
            "userCode": "UC",
            "verificationUri": "https://device",
            "verificationUriComplete": "https://device?user_code=UC",
            "expiresIn": 600
        }))
        .unwrap();
        assert_eq!(auth.device_code, "dc");
        assert!(auth.interval.is_none());
    }
}
