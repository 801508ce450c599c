#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use serde_json::json;
use sso_profiles::auth::{
    AuthError, BearerToken, DeviceAuthorization, TokenCache, VerificationPrompt,
};
use sso_profiles::store::StoreWriter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PORTAL_URL: &str = "https://example.awsapps.com/start";

#[derive(Default)]
pub struct InMemoryTokenCache {
    tokens: Mutex<HashMap<String, BearerToken>>,
    saves: Mutex<usize>,
}

impl InMemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, client_name: &str, token: BearerToken) {
        self.tokens
            .lock()
            .expect("cache lock poisoned")
            .insert(client_name.to_string(), token);
    }

    pub fn get(&self, client_name: &str) -> Option<BearerToken> {
        self.tokens
            .lock()
            .expect("cache lock poisoned")
            .get(client_name)
            .cloned()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().expect("cache lock poisoned")
    }
}

impl TokenCache for InMemoryTokenCache {
    fn load(&self, client_name: &str) -> Option<BearerToken> {
        self.get(client_name)
            .filter(|token| token.is_valid_at(chrono::Utc::now()))
    }

    fn save(&self, client_name: &str, token: &BearerToken) -> Result<(), AuthError> {
        *self.saves.lock().expect("cache lock poisoned") += 1;
        self.seed(client_name, token.clone());
        Ok(())
    }
}

/// Records every verification prompt it receives.
#[derive(Default)]
pub struct RecordingPrompt {
    pub user_codes: Mutex<Vec<String>>,
}

impl VerificationPrompt for RecordingPrompt {
    fn prompt(&self, authorization: &DeviceAuthorization) {
        self.user_codes
            .lock()
            .expect("prompt lock poisoned")
            .push(authorization.user_code.clone());
    }
}

/// Writer that always fails, standing in for a full disk.
pub struct FailingWriter;

impl StoreWriter for FailingWriter {
    fn write(&self, _path: &Path, _contents: &[u8]) -> std::io::Result<()> {
        Err(std::io::Error::other("no space left on device"))
    }
}

/// Mount successful `client/register` and `device_authorization` responses.
pub async fn mount_registration(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/client/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clientId": "client-id",
            "clientSecret": "client-secret",
            "clientIdIssuedAt": 1_700_000_000,
            "clientSecretExpiresAt": 1_707_776_000
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/device_authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceCode": "device-code",
            "userCode": "ABCD-EFGH",
            "verificationUri": "https://device.sso.us-east-1.amazonaws.com/",
            "verificationUriComplete": "https://device.sso.us-east-1.amazonaws.com/?user_code=ABCD-EFGH",
            "expiresIn": 600,
            "interval": 1
        })))
        .expect(1)
        .mount(server)
        .await;
}

pub fn token_success(access_token: &str, expires_in: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "accessToken": access_token,
        "expiresIn": expires_in,
        "tokenType": "Bearer"
    }))
}

pub fn token_error(code: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "error": code,
        "error_description": format!("{code} from test server")
    }))
}
