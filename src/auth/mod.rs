//! OAuth device-authorization login and access-token caching.

pub mod device_code;
pub mod error;
pub mod providers;
pub mod service;
pub mod store;
pub mod token;

pub use device_code::{ClientRegistration, DeviceAuthorization, DeviceCodePoll, TokenGrant};
pub use error::AuthError;
pub use service::{
    DeviceAuthClient, LogVerificationPrompt, LoginOutcome, LoginState, VerificationPrompt,
};
pub use store::{FileTokenCache, TokenCache};
pub use token::BearerToken;
