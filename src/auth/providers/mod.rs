//! Identity-provider HTTP clients.

pub mod sso_oidc;
