#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for secret and parameter lookups.
pub const TRACING_TARGET_SECRETS: &str = "cumulus_support::secrets";

/// Tracing target for request authentication.
///
/// Use this target for logging rejected credentials and key loading. Never
/// log the credential itself.
pub const TRACING_TARGET_AUTH: &str = "cumulus_support::auth";

pub mod auth;
pub mod bsn;
pub mod env;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod secrets;

pub use auth::{ApiKeyAuthenticator, AuthError};
pub use bsn::{Bsn, BsnError};
pub use env::{EnvError, EnvVars, environment_variables};
pub use secrets::{SecretError, SecretSource};
