//! Secret and parameter lookup.

#[cfg(feature = "aws")]
#[cfg_attr(docsrs, doc(cfg(feature = "aws")))]
mod aws;

#[cfg(feature = "aws")]
#[cfg_attr(docsrs, doc(cfg(feature = "aws")))]
pub use aws::AwsSecretSource;

/// Errors returned by a [`SecretSource`].
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    /// The secret id or parameter name was empty.
    #[error("No {0} provided")]
    MissingIdentifier(&'static str),

    /// The secret exists but has no string value.
    #[error("No secret value found")]
    NoSecretValue,

    /// The parameter exists but has no value.
    #[error("No parameter value found")]
    NoParameterValue,

    /// The backing service failed the request.
    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl SecretError {
    /// Creates a backend error for `operation`.
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }
}

/// Source of string secrets and configuration parameters.
#[async_trait::async_trait]
pub trait SecretSource: std::fmt::Debug + Send + Sync {
    /// Returns the string value of the secret identified by `id` (name or
    /// ARN).
    async fn get_secret(&self, id: &str) -> Result<String, SecretError>;

    /// Returns the value of the parameter `name`, decrypted if it is a
    /// secure string.
    async fn get_parameter(&self, name: &str) -> Result<String, SecretError>;
}
