//! Utility modules: polling policy, environment scoping.

pub mod env;
pub mod retry;
