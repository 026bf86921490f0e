//! AWS Lambda custom runtime.
//!
//! Polls the Runtime API for invocations, runs each through the
//! `AlarmHandler`, and reports the result or the fatal error back.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::{header::HeaderMap, Client};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::filing::AlarmHandler;
use crate::{Error, Result};

const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";
const DEADLINE_HEADER: &str = "lambda-runtime-deadline-ms";
const FUNCTION_ARN_HEADER: &str = "lambda-runtime-invoked-function-arn";
const ERROR_TYPE_HEADER: &str = "lambda-runtime-function-error-type";

#[derive(Debug, Clone, PartialEq)]
pub struct InvocationContext {
    pub request_id: String,
    pub deadline: Option<DateTime<Utc>>,
    pub function_arn: Option<String>,
}

impl InvocationContext {
    fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let request_id = header(REQUEST_ID_HEADER).ok_or_else(|| {
            Error::Internal(format!("Runtime API response missing {}", REQUEST_ID_HEADER))
        })?;
        let deadline = header(DEADLINE_HEADER)
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

        Ok(Self {
            request_id,
            deadline,
            function_arn: header(FUNCTION_ARN_HEADER),
        })
    }
}

pub struct LambdaRuntime {
    client: Client,
    base_url: String,
}

impl LambdaRuntime {
    /// `runtime_api` is the `host:port` from `AWS_LAMBDA_RUNTIME_API`.
    pub fn new(runtime_api: &str) -> Self {
        Self {
            // No request timeout: the next-invocation call blocks until work arrives.
            client: Client::new(),
            base_url: format!("http://{}/{}/runtime", runtime_api, API_VERSION),
        }
    }

    pub async fn next_invocation(&self) -> Result<(InvocationContext, Value)> {
        let response = self
            .client
            .get(format!("{}/invocation/next", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        let context = InvocationContext::from_headers(response.headers())?;
        let event = response.json::<Value>().await?;
        Ok((context, event))
    }

    pub async fn send_response<T: Serialize + ?Sized>(
        &self,
        request_id: &str,
        body: &T,
    ) -> Result<()> {
        self.client
            .post(format!("{}/invocation/{}/response", self.base_url, request_id))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn send_error(&self, request_id: &str, error: &Error) -> Result<()> {
        self.client
            .post(format!("{}/invocation/{}/error", self.base_url, request_id))
            .header(ERROR_TYPE_HEADER, "Unhandled")
            .json(&error_body(error))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Report a failure that happened before the first invocation.
    pub async fn init_error(&self, error: &Error) -> Result<()> {
        self.client
            .post(format!("{}/init/error", self.base_url))
            .header(ERROR_TYPE_HEADER, "Unhandled")
            .json(&error_body(error))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Handle exactly one invocation.
    pub async fn process_next(&self, handler: &AlarmHandler) -> Result<InvocationContext> {
        let (context, event) = self.next_invocation().await?;
        info!(
            request_id = %context.request_id,
            deadline = ?context.deadline,
            function_arn = ?context.function_arn,
            "lambda_invocation_started"
        );

        match handler.handle(event, Some(context.request_id.clone())).await {
            Ok(result) => self.send_response(&context.request_id, &result).await?,
            Err(e) => {
                error!(request_id = %context.request_id, error = %e, "lambda_invocation_failed");
                self.send_error(&context.request_id, &e).await?;
            }
        }
        Ok(context)
    }

    pub async fn run(&self, handler: &AlarmHandler) -> Result<()> {
        info!(base_url = %self.base_url, "lambda_runtime_started");
        loop {
            self.process_next(handler).await?;
        }
    }
}

/// Body of the invocation and init error reports.
pub fn error_body(error: &Error) -> Value {
    json!({
        "errorMessage": error.to_string(),
        "errorType": error.kind(),
    })
}
