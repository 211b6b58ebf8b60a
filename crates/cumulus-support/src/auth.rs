//! API-key authentication of incoming requests.
//!
//! The expected key is a string secret whose id is read from the
//! `API_KEY_ARN` environment variable. It is fetched on the first
//! authentication and reused for the lifetime of the authenticator.
//! Requests carry the key as `Token <key>` in the first present of
//! `X-Authorization`, `Authorization` and `X-Api-Key`.

use std::sync::Arc;

use http::HeaderMap;
use tokio::sync::OnceCell;

use crate::TRACING_TARGET_AUTH;
use crate::env::{EnvError, environment_variables};
use crate::secrets::{SecretError, SecretSource};

/// Environment variable holding the id of the API-key secret.
pub const API_KEY_ARN: &str = "API_KEY_ARN";

/// Headers checked for a credential, in order of precedence.
pub const CREDENTIAL_HEADERS: [&str; 3] = ["x-authorization", "authorization", "x-api-key"];

const TOKEN_PREFIX: &[u8] = b"Token ";

/// Why a request was not authenticated.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The secret id is not configured.
    #[error("API key was not loaded, is API_KEY_ARN set? {0}")]
    NotConfigured(#[from] EnvError),

    /// The API key could not be loaded from the secret source.
    #[error("API key was not loaded: {0}")]
    KeyNotLoaded(#[source] SecretError),

    /// None of the credential headers is present (or it is empty).
    #[error("No headers available to check for API key")]
    MissingCredential,

    /// The credential does not start with `Token `.
    #[error("Authorization header must have a token prefix")]
    MissingTokenPrefix,

    /// The credential does not match the API key.
    #[error("Invalid API Key")]
    InvalidKey,
}

/// Checks request headers against an API key held in a [`SecretSource`].
#[derive(Debug)]
pub struct ApiKeyAuthenticator {
    source: Arc<dyn SecretSource>,
    secret_id: Option<String>,
    key: OnceCell<String>,
}

impl ApiKeyAuthenticator {
    /// Creates an authenticator reading the secret id from `API_KEY_ARN`
    /// when the key is first needed.
    pub fn new(source: Arc<dyn SecretSource>) -> Self {
        Self {
            source,
            secret_id: None,
            key: OnceCell::new(),
        }
    }

    /// Uses `secret_id` instead of the `API_KEY_ARN` environment variable.
    #[must_use]
    pub fn with_secret_id(mut self, secret_id: impl Into<String>) -> Self {
        self.secret_id = Some(secret_id.into());
        self
    }

    /// Whether the key has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.key.initialized()
    }

    /// Authenticates a request by its headers.
    ///
    /// A failed key load is not cached; the next call tries again.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let key = self.key.get_or_try_init(|| self.load_key()).await?;

        let Some((header, value)) = CREDENTIAL_HEADERS
            .iter()
            .find_map(|name| headers.get(*name).map(|value| (*name, value)))
        else {
            tracing::warn!(target: TRACING_TARGET_AUTH, "request without credential header");
            return Err(AuthError::MissingCredential);
        };

        let value = value.as_bytes();
        if value.is_empty() {
            tracing::warn!(target: TRACING_TARGET_AUTH, header, "empty credential header");
            return Err(AuthError::MissingCredential);
        }

        let Some(token) = value.strip_prefix(TOKEN_PREFIX) else {
            tracing::warn!(target: TRACING_TARGET_AUTH, header, "credential without token prefix");
            return Err(AuthError::MissingTokenPrefix);
        };

        if token != key.as_bytes() {
            tracing::warn!(target: TRACING_TARGET_AUTH, header, "invalid api key");
            return Err(AuthError::InvalidKey);
        }

        tracing::trace!(target: TRACING_TARGET_AUTH, header, "request authenticated");
        Ok(())
    }

    async fn load_key(&self) -> Result<String, AuthError> {
        let secret_id = match &self.secret_id {
            Some(secret_id) => secret_id.clone(),
            None => environment_variables([API_KEY_ARN], &[])?
                .require(API_KEY_ARN)?
                .to_owned(),
        };

        let key = self
            .source
            .get_secret(&secret_id)
            .await
            .map_err(|error| {
                tracing::error!(
                    target: TRACING_TARGET_AUTH,
                    error = %error,
                    "failed to load api key"
                );
                AuthError::KeyNotLoaded(error)
            })?;

        tracing::info!(target: TRACING_TARGET_AUTH, "api key loaded");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use http::{HeaderName, HeaderValue};

    use super::*;
    use crate::mock::MockSecretSource;

    const SECRET_ID: &str = "api-key-arn";

    fn authenticator(source: MockSecretSource) -> (ApiKeyAuthenticator, Arc<MockSecretSource>) {
        let source = Arc::new(source);
        let auth = ApiKeyAuthenticator::new(source.clone()).with_secret_id(SECRET_ID);
        (auth, source)
    }

    fn headers(entries: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for &(name, value) in entries {
            let name = HeaderName::from_bytes(name.as_bytes()).unwrap();
            headers.insert(name, HeaderValue::from_static(value));
        }
        headers
    }

    fn with_key() -> MockSecretSource {
        MockSecretSource::new().with_secret(SECRET_ID, "geheim")
    }

    #[tokio::test]
    async fn rejects_when_key_cannot_be_loaded() {
        let (auth, _) = authenticator(MockSecretSource::new());
        let err = auth
            .authenticate(&headers(&[("authorization", "Token geheim")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::KeyNotLoaded(SecretError::NoSecretValue)));
        assert!(!auth.is_loaded());
    }

    #[tokio::test]
    async fn rejects_request_without_credential() {
        let (auth, _) = authenticator(with_key());
        let err = auth.authenticate(&HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
    }

    #[tokio::test]
    async fn rejects_credential_without_prefix() {
        let (auth, _) = authenticator(with_key());
        let err = auth
            .authenticate(&headers(&[("Authorization", "abc")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingTokenPrefix));
    }

    #[tokio::test]
    async fn rejects_wrong_key() {
        let (auth, _) = authenticator(with_key());
        let err = auth
            .authenticate(&headers(&[("authorization", "Token open")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidKey));
    }

    #[tokio::test]
    async fn accepts_authorization_header() {
        let (auth, _) = authenticator(with_key());
        auth.authenticate(&headers(&[("Authorization", "Token geheim")]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn accepts_api_key_header() {
        let (auth, _) = authenticator(with_key());
        auth.authenticate(&headers(&[("x-api-key", "Token geheim")]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn first_present_header_wins() {
        let (auth, _) = authenticator(with_key());
        let err = auth
            .authenticate(&headers(&[
                ("X-Authorization", "Token open"),
                ("Authorization", "Token geheim"),
            ]))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidKey));
    }

    #[tokio::test]
    async fn loads_key_once() {
        let (auth, source) = authenticator(with_key());
        let request = headers(&[("x-api-key", "Token geheim")]);

        auth.authenticate(&request).await.unwrap();
        auth.authenticate(&request).await.unwrap();
        let _ = auth.authenticate(&HeaderMap::new()).await;

        assert!(auth.is_loaded());
        assert_eq!(source.secret_calls(), 1);
    }

    #[tokio::test]
    async fn retries_failed_load() {
        let (auth, source) = authenticator(MockSecretSource::new());
        let request = headers(&[("x-api-key", "Token geheim")]);

        assert!(auth.authenticate(&request).await.is_err());
        assert!(auth.authenticate(&request).await.is_err());
        assert_eq!(source.secret_calls(), 2);
    }
}
