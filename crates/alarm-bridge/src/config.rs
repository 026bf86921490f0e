use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Port the AWS Parameters and Secrets Lambda Extension listens on by default.
pub const DEFAULT_EXTENSION_PORT: u16 = 2773;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "text")]
    Text,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Json
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level from `LOG_LEVEL`, lower-cased (`info`, `debug`, ...).
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Filter directive for the subscriber; `RUST_LOG` takes precedence when set.
    pub fn filter(&self) -> String {
        format!("alarm_bridge={},{}", self.level, self.level)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
}

/// Where secret references are fetched from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    /// Secrets Manager through the AWS SDK.
    #[default]
    Sdk,
    /// The Parameters and Secrets Lambda Extension.
    Extension,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    pub backend: SecretBackend,
    /// Extension endpoint; only used by `SecretBackend::Extension`.
    pub endpoint: String,
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LambdaConfig {
    /// `host:port` of the Lambda Runtime API; unset outside Lambda.
    pub runtime_api: Option<String>,
}

/// Process-level settings. Alarm and Jira settings are resolved separately
/// through `ConfigResolver` because they may live in the secret store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub secrets: SecretsConfig,
    pub jira: JiraConfig,
    pub lambda: LambdaConfig,
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(var: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let extension_port = match var("PARAMETERS_SECRETS_EXTENSION_HTTP_PORT") {
            Some(port) => port.parse::<u16>().map_err(|_| {
                crate::Error::Configuration(format!(
                    "PARAMETERS_SECRETS_EXTENSION_HTTP_PORT must be a port number, got '{}'",
                    port
                ))
            })?,
            None => DEFAULT_EXTENSION_PORT,
        };

        let backend = match var("SECRETS_BACKEND")
            .map(|raw| raw.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("sdk") => SecretBackend::Sdk,
            Some("extension") => SecretBackend::Extension,
            Some(other) => {
                return Err(crate::Error::Configuration(format!(
                    "SECRETS_BACKEND must be 'sdk' or 'extension', got '{}'",
                    other
                )))
            }
        };

        let timeout_secs = match var("JIRA_TIMEOUT_SECS") {
            Some(secs) => secs.parse::<u64>().map_err(|_| {
                crate::Error::Configuration(format!(
                    "JIRA_TIMEOUT_SECS must be a number of seconds, got '{}'",
                    secs
                ))
            })?,
            None => 30,
        };

        let config = Config {
            server: ServerConfig {
                addr: var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            },
            logging: LoggingConfig {
                level: normalize_level(var("LOG_LEVEL").as_deref()),
                format: match var("LOG_FORMAT")
                    .unwrap_or_else(|| "json".to_string())
                    .to_lowercase()
                    .as_str()
                {
                    "text" => LogFormat::Text,
                    _ => LogFormat::Json,
                },
            },
            secrets: SecretsConfig {
                backend,
                endpoint: format!("http://localhost:{}", extension_port),
                session_token: var("AWS_SESSION_TOKEN"),
            },
            jira: JiraConfig {
                timeout: Duration::from_secs(timeout_secs),
            },
            lambda: LambdaConfig {
                runtime_api: var("AWS_LAMBDA_RUNTIME_API").filter(|api| !api.is_empty()),
            },
        };

        if config.secrets.backend == SecretBackend::Extension
            && config.secrets.session_token.is_none()
        {
            tracing::debug!("AWS_SESSION_TOKEN is not set; secret lookups will be unauthenticated");
        }

        Ok(config)
    }
}

/// Map `LOG_LEVEL` (Python-style names included) onto a tracing level.
fn normalize_level(raw: Option<&str>) -> String {
    match raw.map(|level| level.trim().to_lowercase()).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("warn") | Some("warning") => "warn",
        Some("error") | Some("critical") => "error",
        _ => "info",
    }
    .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                addr: "0.0.0.0:8080".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::default(),
            },
            secrets: SecretsConfig {
                backend: SecretBackend::default(),
                endpoint: format!("http://localhost:{}", DEFAULT_EXTENSION_PORT),
                session_token: None,
            },
            jira: JiraConfig {
                timeout: Duration::from_secs(30),
            },
            lambda: LambdaConfig { runtime_api: None },
        }
    }
}
