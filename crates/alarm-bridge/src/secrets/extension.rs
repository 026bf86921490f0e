use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{SecretStore, SecretValue};
use crate::{config::SecretsConfig, Error, Result};

const TOKEN_HEADER: &str = "X-Aws-Parameters-Secrets-Token";

/// Secret store backed by the AWS Parameters and Secrets Lambda Extension,
/// which serves `get-secret-value` over a local HTTP port.
pub struct ExtensionSecretStore {
    client: Client,
    endpoint: String,
    session_token: Option<String>,
    timeout: Duration,
}

impl ExtensionSecretStore {
    pub fn new(endpoint: impl Into<String>, session_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            session_token,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_config(config: &SecretsConfig) -> Self {
        Self::new(config.endpoint.clone(), config.session_token.clone())
    }
}

#[async_trait]
impl SecretStore for ExtensionSecretStore {
    async fn get_secret_value(&self, secret_id: &str) -> Result<SecretValue> {
        let url = format!("{}/secretsmanager/get", self.endpoint);
        debug!(secret_id, "fetching_secret");

        let mut request = self
            .client
            .get(&url)
            .query(&[("secretId", secret_id)])
            .timeout(self.timeout);
        if let Some(token) = &self.session_token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await.map_err(|e| {
            Error::SecretAccess(format!("Secret '{}' could not be fetched: {}", secret_id, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SecretAccess(format!(
                "Secret '{}' lookup failed with status {}: {}",
                secret_id,
                status.as_u16(),
                body
            )));
        }

        response.json::<SecretValue>().await.map_err(|e| {
            Error::SecretAccess(format!(
                "Secret '{}' response could not be decoded: {}",
                secret_id, e
            ))
        })
    }
}
