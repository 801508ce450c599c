use reqwest::Response;
use serde::Serialize;

use crate::auth::device_code::{
    ClientRegistration, DeviceAuthorization, DeviceCodePoll, OidcErrorBody, TokenErrorCode,
    TokenGrant,
};
use crate::auth::error::AuthError;

const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const PUBLIC_CLIENT_TYPE: &str = "public";

/// Default OIDC endpoint for an IAM Identity Center region.
pub fn default_oidc_endpoint(region: &str) -> String {
    format!("https://oidc.{region}.amazonaws.com")
}

/// HTTP client for the IAM Identity Center OIDC service.
///
/// Covers the three calls of the device-authorization grant: client
/// registration, device authorization, and token exchange.
///
/// # Example
/// ```no_run
/// use sso_profiles::auth::providers::sso_oidc::SsoOidcClient;
///
/// # async fn example() -> Result<(), sso_profiles::auth::AuthError> {
/// let oidc = SsoOidcClient::for_region("us-east-1");
/// let registration = oidc.register_client("profile_manager").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SsoOidcClient {
    client: reqwest::Client,
    endpoint: String,
}

impl SsoOidcClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn for_region(region: &str) -> Self {
        Self::new(default_oidc_endpoint(region))
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn register_client(&self, client_name: &str) -> Result<ClientRegistration, AuthError> {
        let resp = self
            .client
            .post(format!("{}/client/register", self.endpoint))
            .json(&RegisterClientRequest {
                client_name,
                client_type: PUBLIC_CLIENT_TYPE,
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AuthError::Registration(format!("status {status}: {text}")));
        }
        resp.json()
            .await
            .map_err(|err| AuthError::InvalidResponse(format!("client registration: {err}")))
    }

    pub async fn start_device_authorization(
        &self,
        registration: &ClientRegistration,
        start_url: &str,
    ) -> Result<DeviceAuthorization, AuthError> {
        let resp = self
            .client
            .post(format!("{}/device_authorization", self.endpoint))
            .json(&StartDeviceAuthorizationRequest {
                client_id: &registration.client_id,
                client_secret: &registration.client_secret,
                start_url,
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AuthError::DeviceAuthorization(format!(
                "status {status}: {text}"
            )));
        }
        resp.json()
            .await
            .map_err(|err| AuthError::InvalidResponse(format!("device authorization: {err}")))
    }

    /// Attempt one device-code exchange.
    ///
    /// `authorization_pending` is reported as [`DeviceCodePoll::Pending`];
    /// every other provider error is returned as an [`AuthError`].
    pub async fn create_token(
        &self,
        registration: &ClientRegistration,
        device_code: &str,
    ) -> Result<DeviceCodePoll, AuthError> {
        let resp = self
            .client
            .post(format!("{}/token", self.endpoint))
            .json(&CreateTokenRequest {
                client_id: &registration.client_id,
                client_secret: &registration.client_secret,
                grant_type: DEVICE_CODE_GRANT_TYPE,
                device_code,
            })
            .send()
            .await?;
        if resp.status().is_success() {
            let grant: TokenGrant = resp
                .json()
                .await
                .map_err(|err| AuthError::InvalidResponse(format!("token response: {err}")))?;
            return Ok(DeviceCodePoll::Authorized(grant));
        }
        match token_error(resp).await {
            err if err.is_pending() => Ok(DeviceCodePoll::Pending),
            err => Err(err),
        }
    }
}

async fn token_error(resp: Response) -> AuthError {
    let status = resp.status();
    let header_code = resp
        .headers()
        .get("x-amzn-errortype")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(':').next().unwrap_or(value).to_string());
    let text = resp.text().await.unwrap_or_default();
    let body: OidcErrorBody = serde_json::from_str(&text).unwrap_or_default();

    let raw_code = body.error.or(header_code);
    let description = body.error_description.unwrap_or_default();
    let parsed = raw_code.as_deref().map(str::parse::<TokenErrorCode>);
    match parsed {
        Some(Ok(TokenErrorCode::AuthorizationPending)) => AuthError::AuthorizationPending,
        Some(Ok(TokenErrorCode::SlowDown)) => AuthError::SlowDown,
        Some(Ok(TokenErrorCode::AccessDenied)) => AuthError::AccessDenied,
        Some(Ok(TokenErrorCode::ExpiredToken)) => AuthError::ExpiredToken,
        Some(Ok(code)) => AuthError::TokenRejected {
            code: code.to_string(),
            description,
        },
        Some(Err(_)) => AuthError::TokenRejected {
            code: raw_code.unwrap_or_default(),
            description,
        },
        None => AuthError::InvalidResponse(format!(
            "token request failed with status {status}: {text}"
        )),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterClientRequest<'a> {
    client_name: &'a str,
    client_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartDeviceAuthorizationRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    start_url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    device_code: &'a str,
}
