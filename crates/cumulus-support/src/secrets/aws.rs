//! AWS Secrets Manager and SSM Parameter Store lookups.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_secretsmanager::error::DisplayErrorContext;

use super::{SecretError, SecretSource};
use crate::TRACING_TARGET_SECRETS;

/// [`SecretSource`] backed by AWS Secrets Manager (secrets) and SSM
/// Parameter Store (parameters).
///
/// Only string secrets are supported; binary secret values are treated as
/// absent.
#[derive(Debug, Clone)]
pub struct AwsSecretSource {
    secrets: aws_sdk_secretsmanager::Client,
    parameters: aws_sdk_ssm::Client,
}

impl AwsSecretSource {
    /// Creates clients from a loaded SDK configuration.
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            secrets: aws_sdk_secretsmanager::Client::new(sdk_config),
            parameters: aws_sdk_ssm::Client::new(sdk_config),
        }
    }

    /// Loads the SDK configuration from the environment.
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(&sdk_config)
    }
}

#[async_trait::async_trait]
impl SecretSource for AwsSecretSource {
    async fn get_secret(&self, id: &str) -> Result<String, SecretError> {
        if id.is_empty() {
            return Err(SecretError::MissingIdentifier("secret id"));
        }

        tracing::debug!(target: TRACING_TARGET_SECRETS, secret_id = id, "fetching secret");
        let output = self
            .secrets
            .get_secret_value()
            .secret_id(id)
            .send()
            .await
            .map_err(|e| {
                SecretError::backend("get_secret_value", DisplayErrorContext(&e).to_string())
            })?;

        match output.secret_string() {
            Some(value) if !value.is_empty() => Ok(value.to_owned()),
            _ => Err(SecretError::NoSecretValue),
        }
    }

    async fn get_parameter(&self, name: &str) -> Result<String, SecretError> {
        if name.is_empty() {
            return Err(SecretError::MissingIdentifier("parameter name"));
        }

        tracing::debug!(target: TRACING_TARGET_SECRETS, parameter = name, "fetching parameter");
        let output = self
            .parameters
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| {
                SecretError::backend(
                    "get_parameter",
                    aws_sdk_ssm::error::DisplayErrorContext(&e).to_string(),
                )
            })?;

        match output.parameter().and_then(|p| p.value()) {
            Some(value) if !value.is_empty() => Ok(value.to_owned()),
            _ => Err(SecretError::NoParameterValue),
        }
    }
}
