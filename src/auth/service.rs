use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use strum::Display;

use super::device_code::{DeviceAuthorization, DeviceCodePoll, TokenGrant};
use super::error::AuthError;
use super::providers::sso_oidc::SsoOidcClient;
use super::store::TokenCache;
use super::token::BearerToken;
use crate::util::retry::{Attempt, PollPolicy};

/// Stages of a login, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum LoginState {
    Idle,
    CheckingCache,
    Registering,
    AwaitingUserAuthorization,
    Polling,
    Authorized,
    Failed,
}

/// Collaborator that shows the verification link to the user.
///
/// Opening a browser, printing the user code, or doing nothing at all are
/// all valid implementations.
pub trait VerificationPrompt: Send + Sync {
    fn prompt(&self, authorization: &DeviceAuthorization);
}

/// Prompt that only logs the verification link.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogVerificationPrompt;

impl VerificationPrompt for LogVerificationPrompt {
    fn prompt(&self, authorization: &DeviceAuthorization) {
        tracing::info!(
            url = %authorization.verification_uri_complete,
            user_code = %authorization.user_code,
            "approve this device in a browser"
        );
    }
}

/// Token returned by [`DeviceAuthClient::login`].
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: BearerToken,
    /// `true` when no network round-trip was needed.
    pub from_cache: bool,
}

/// OAuth2 device-authorization client with a token cache in front.
///
/// A cache hit returns immediately. On a miss a fresh public client is
/// registered, a device authorization is started and handed to the
/// [`VerificationPrompt`], and the token endpoint is polled until the user
/// approves. Only `authorization_pending` is retried; every other failure
/// aborts the login.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use sso_profiles::auth::{DeviceAuthClient, FileTokenCache, LogVerificationPrompt};
/// use sso_profiles::auth::providers::sso_oidc::SsoOidcClient;
///
/// # async fn example() -> Result<(), sso_profiles::auth::AuthError> {
/// let client = DeviceAuthClient::new(
///     SsoOidcClient::for_region("us-east-1"),
///     Arc::new(FileTokenCache::new_default()),
///     "profile_manager",
/// );
/// let outcome = client
///     .login("https://example.awsapps.com/start", &LogVerificationPrompt)
///     .await?;
/// println!("{}", outcome.token.expires_at);
/// # Ok(())
/// # }
/// ```
pub struct DeviceAuthClient {
    oidc: SsoOidcClient,
    cache: Arc<dyn TokenCache>,
    client_name: String,
    poll_policy: PollPolicy,
}

impl DeviceAuthClient {
    pub fn new(
        oidc: SsoOidcClient,
        cache: Arc<dyn TokenCache>,
        client_name: impl Into<String>,
    ) -> Self {
        Self {
            oidc,
            cache,
            client_name: client_name.into(),
            poll_policy: PollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub async fn login(
        &self,
        start_url: &str,
        prompt: &dyn VerificationPrompt,
    ) -> Result<LoginOutcome, AuthError> {
        enter(LoginState::Idle);
        match self.run(start_url, prompt).await {
            Ok(outcome) => {
                enter(LoginState::Authorized);
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(error = %err, "login failed");
                enter(LoginState::Failed);
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        start_url: &str,
        prompt: &dyn VerificationPrompt,
    ) -> Result<LoginOutcome, AuthError> {
        enter(LoginState::CheckingCache);
        if let Some(token) = self.cache.load(&self.client_name) {
            tracing::info!(expires_at = %token.expires_at, "reusing cached access token");
            return Ok(LoginOutcome {
                token,
                from_cache: true,
            });
        }

        enter(LoginState::Registering);
        let registration = self.oidc.register_client(&self.client_name).await?;

        enter(LoginState::AwaitingUserAuthorization);
        let authorization = self
            .oidc
            .start_device_authorization(&registration, start_url)
            .await?;
        prompt.prompt(&authorization);

        enter(LoginState::Polling);
        let oidc = &self.oidc;
        let registration = &registration;
        let device_code = authorization.device_code.as_str();
        let grant = self
            .poll_policy
            .execute(|| async move {
                match oidc.create_token(registration, device_code).await? {
                    DeviceCodePoll::Pending => Ok::<_, AuthError>(Attempt::Pending),
                    DeviceCodePoll::Authorized(grant) => Ok(Attempt::Ready(grant)),
                }
            })
            .await?
            .ok_or(AuthError::ExpiredToken)?;

        let token = token_from_grant(grant, Utc::now())?;
        self.cache.save(&self.client_name, &token)?;
        Ok(LoginOutcome {
            token,
            from_cache: false,
        })
    }
}

/// Turn a grant into a token that is valid at `issued_at`.
///
/// Non-positive or unrepresentable lifetimes are invalid responses.
fn token_from_grant(
    grant: TokenGrant,
    issued_at: DateTime<Utc>,
) -> Result<BearerToken, AuthError> {
    if grant.expires_in <= 0 {
        return Err(AuthError::InvalidResponse(format!(
            "token lifetime must be positive, got {}s",
            grant.expires_in
        )));
    }
    let expires_at = Duration::try_seconds(grant.expires_in)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .ok_or_else(|| {
            AuthError::InvalidResponse(format!(
                "token lifetime {}s is out of range",
                grant.expires_in
            ))
        })?;
    Ok(BearerToken::new(grant.access_token, expires_at))
}

fn enter(state: LoginState) {
    tracing::debug!(state = %state, "login state");
}
