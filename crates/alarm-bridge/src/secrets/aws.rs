use async_trait::async_trait;
use aws_sdk_secretsmanager::{error::DisplayErrorContext, Client};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use super::{SecretStore, SecretValue};
use crate::{Error, Result};

/// Secret store that calls Secrets Manager `GetSecretValue` directly.
pub struct AwsSecretStore {
    client: Client,
}

impl AwsSecretStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client configured from the standard AWS provider chain: environment,
    /// shared profile, or the Lambda execution role.
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn get_secret_value(&self, secret_id: &str) -> Result<SecretValue> {
        debug!(secret_id, "fetching_secret");

        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                Error::SecretAccess(format!(
                    "Secret '{}' could not be fetched: {}",
                    secret_id,
                    DisplayErrorContext(&e)
                ))
            })?;

        // The SDK hands back raw bytes; keep the wire form SecretValue expects.
        Ok(SecretValue {
            secret_string: output.secret_string().map(str::to_string),
            secret_binary: output
                .secret_binary()
                .map(|blob| STANDARD.encode(blob.as_ref())),
        })
    }
}
