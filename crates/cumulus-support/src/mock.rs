//! In-memory [`SecretSource`] for tests.
//!
//! Outside this crate's own tests the module is only available when the
//! `test-utils` feature is enabled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::secrets::{SecretError, SecretSource};

/// Secret source serving fixed values and counting lookups.
#[derive(Debug, Default)]
pub struct MockSecretSource {
    secrets: HashMap<String, String>,
    parameters: HashMap<String, String>,
    secret_calls: AtomicUsize,
    parameter_calls: AtomicUsize,
}

impl MockSecretSource {
    /// Creates a source without any values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a secret.
    #[must_use]
    pub fn with_secret(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(id.into(), value.into());
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Number of `get_secret` calls received.
    pub fn secret_calls(&self) -> usize {
        self.secret_calls.load(Ordering::SeqCst)
    }

    /// Number of `get_parameter` calls received.
    pub fn parameter_calls(&self) -> usize {
        self.parameter_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SecretSource for MockSecretSource {
    async fn get_secret(&self, id: &str) -> Result<String, SecretError> {
        self.secret_calls.fetch_add(1, Ordering::SeqCst);
        if id.is_empty() {
            return Err(SecretError::MissingIdentifier("secret id"));
        }
        self.secrets
            .get(id)
            .filter(|value| !value.is_empty())
            .cloned()
            .ok_or(SecretError::NoSecretValue)
    }

    async fn get_parameter(&self, name: &str) -> Result<String, SecretError> {
        self.parameter_calls.fetch_add(1, Ordering::SeqCst);
        if name.is_empty() {
            return Err(SecretError::MissingIdentifier("parameter name"));
        }
        self.parameters
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
            .ok_or(SecretError::NoParameterValue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_configured_values() {
        let source = MockSecretSource::new()
            .with_secret("arn:secret", "geheim")
            .with_parameter("/app/config", "{}");

        assert_eq!(source.get_secret("arn:secret").await.unwrap(), "geheim");
        assert_eq!(source.get_parameter("/app/config").await.unwrap(), "{}");
        assert_eq!(source.secret_calls(), 1);
        assert_eq!(source.parameter_calls(), 1);
    }

    #[tokio::test]
    async fn missing_values() {
        let source = MockSecretSource::new();
        let err = source.get_secret("unknown").await.unwrap_err();
        assert_eq!(err.to_string(), "No secret value found");
        let err = source.get_parameter("unknown").await.unwrap_err();
        assert_eq!(err.to_string(), "No parameter value found");
        let err = source.get_secret("").await.unwrap_err();
        assert!(matches!(err, SecretError::MissingIdentifier(_)));
    }
}
