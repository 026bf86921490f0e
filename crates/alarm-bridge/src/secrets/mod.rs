//! Secret store access.
//!
//! Settings may point into the secret store instead of carrying a literal
//! value. This module holds the store abstraction, the reference syntax, and
//! the two store backends: Secrets Manager through the AWS SDK, and the
//! Parameters and Secrets Lambda Extension.

mod aws;
mod extension;
mod reference;

pub use aws::AwsSecretStore;
pub use extension::ExtensionSecretStore;
pub use reference::SecretReference;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Value returned by `get-secret-value`. Exactly one of the two fields is
/// normally populated; `secret_binary` is base64 on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretValue {
    #[serde(rename = "SecretString", default)]
    pub secret_string: Option<String>,
    #[serde(rename = "SecretBinary", default)]
    pub secret_binary: Option<String>,
}

impl SecretValue {
    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            secret_string: Some(value.into()),
            secret_binary: None,
        }
    }

    /// Text form of the secret, decoding a binary payload as UTF-8.
    pub fn into_text(self, secret_id: &str) -> Result<String> {
        if let Some(text) = self.secret_string {
            return Ok(text);
        }
        if let Some(encoded) = self.secret_binary {
            let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
                Error::SecretFormat(format!(
                    "Secret '{}' has an undecodable SecretBinary: {}",
                    secret_id, e
                ))
            })?;
            return String::from_utf8(bytes).map_err(|_| {
                Error::SecretFormat(format!("Secret '{}' SecretBinary is not UTF-8", secret_id))
            });
        }
        Err(Error::SecretAccess(format!(
            "Secret '{}' contains no retrievable value",
            secret_id
        )))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret_value(&self, secret_id: &str) -> Result<SecretValue>;
}
