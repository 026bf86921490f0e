pub mod alarm;
pub mod config;
pub mod filing;
pub mod metrics;
pub mod resolver;
pub mod runtime;
pub mod secrets;
pub mod server;
pub mod ticket;
pub mod tracker;

use thiserror::Error;

pub use alarm::AlarmRecord;
pub use filing::{AlarmHandler, InvocationResult, Outcome};
pub use resolver::ConfigResolver;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Secret access error: {0}")]
    SecretAccess(String),
    #[error("Secret format error: {0}")]
    SecretFormat(String),
    #[error("Malformed secret reference: {0}")]
    SecretReference(String),
    #[error("Unsupported event shape: {0}")]
    UnsupportedEventShape(String),
    #[error("Tracker error ({status}): {details}")]
    Tracker { status: u16, details: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable name reported to callers when an invocation fails as a whole.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "ConfigurationError",
            Error::SecretAccess(_) => "SecretAccessError",
            Error::SecretFormat(_) => "SecretFormatError",
            Error::SecretReference(_) => "SecretReferenceError",
            Error::UnsupportedEventShape(_) => "UnsupportedEventShape",
            Error::Tracker { .. } => "TrackerError",
            Error::Http(_) => "HttpError",
            Error::SerdeJson(_) => "JsonError",
            Error::Io(_) => "IoError",
            Error::Internal(_) => "UnexpectedError",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
