use crate::{Error, Result};

const REFERENCE_PREFIX: &str = "{{resolve:";
const REFERENCE_SUFFIX: &str = "}}";
const SECRET_STRING_MARKER: &str = ":SecretString";

/// Parsed form of
/// `{{resolve:secretsmanager:<secret-id>:SecretString:<json-key>:<version-stage>:<version-id>}}`.
///
/// Everything between the service name and `:SecretString` is the secret id,
/// so ARNs keep their colons. Version segments are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    pub secret_id: String,
    pub json_key: Option<String>,
}

impl SecretReference {
    /// Anything starting with `{{resolve:` is treated as a reference and must
    /// parse; other values are literals.
    pub fn is_reference(value: &str) -> bool {
        value.starts_with(REFERENCE_PREFIX)
    }

    pub fn parse(value: &str) -> Result<Self> {
        let body = value
            .strip_prefix(REFERENCE_PREFIX)
            .ok_or_else(|| malformed(value, "must start with '{{resolve:'"))?
            .strip_suffix(REFERENCE_SUFFIX)
            .ok_or_else(|| malformed(value, "must end with '}}'"))?;

        let (service, remainder) = body
            .split_once(':')
            .ok_or_else(|| malformed(value, "missing service name"))?;
        if service != "secretsmanager" {
            return Err(malformed(
                value,
                &format!("unsupported service '{}'", service),
            ));
        }

        let (secret_id, selector) = remainder
            .split_once(SECRET_STRING_MARKER)
            .ok_or_else(|| malformed(value, "missing SecretString directive"))?;
        let secret_id = secret_id.trim();
        if secret_id.is_empty() {
            return Err(malformed(value, "empty secret id"));
        }

        let json_key = match selector {
            "" => None,
            _ => {
                let segments = selector
                    .strip_prefix(':')
                    .ok_or_else(|| malformed(value, "unexpected text after SecretString"))?;
                segments
                    .split(':')
                    .next()
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
            }
        };

        Ok(Self {
            secret_id: secret_id.to_string(),
            json_key,
        })
    }
}

fn malformed(value: &str, reason: &str) -> Error {
    Error::SecretReference(format!("{} ({})", value, reason))
}
