//! Filing orchestration.
//!
//! `AlarmHandler` turns one inbound event into one outcome per alarm record.
//! Only event extraction, the tracker connection and the required ticket
//! settings can fail an invocation; everything after that is captured per
//! record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::alarm::{self, AlarmRecord, RAW_MESSAGE};
use crate::metrics;
use crate::resolver::ConfigResolver;
use crate::ticket::{self, TicketSettings};
use crate::tracker::{IssueTracker, JiraClient};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilingAction {
    Created,
    Commented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnstructuredAlarmMessage,
    JiraError,
    UnexpectedException,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Filed {
        issue_key: String,
        action: FilingAction,
    },
    Failed {
        error: FailureKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
        alarm: Option<Value>,
    },
}

impl Outcome {
    pub fn created(issue_key: impl Into<String>) -> Self {
        Outcome::Filed {
            issue_key: issue_key.into(),
            action: FilingAction::Created,
        }
    }

    pub fn commented(issue_key: impl Into<String>) -> Self {
        Outcome::Filed {
            issue_key: issue_key.into(),
            action: FilingAction::Commented,
        }
    }

    fn failed(error: FailureKind, details: Option<String>, alarm: Option<&Value>) -> Self {
        Outcome::Failed {
            error,
            details,
            alarm: alarm.cloned(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Filed { .. })
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Filed { action: FilingAction::Created, .. } => "created",
            Outcome::Filed { action: FilingAction::Commented, .. } => "commented",
            Outcome::Failed { error: FailureKind::UnstructuredAlarmMessage, .. } => {
                "unstructured_alarm_message"
            }
            Outcome::Failed { error: FailureKind::JiraError, .. } => "jira_error",
            Outcome::Failed { error: FailureKind::UnexpectedException, .. } => {
                "unexpected_exception"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub request_id: Option<String>,
    pub processed: usize,
    pub results: Vec<Outcome>,
}

/// Finds an open issue an alarm should be commented on instead of filing a
/// new one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueLookup: Send + Sync {
    async fn find_existing(&self, alarm: &AlarmRecord) -> Result<Option<String>>;
}

/// Lookup that never finds an issue, so every alarm files a new one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExistingIssue;

#[async_trait]
impl IssueLookup for NoExistingIssue {
    async fn find_existing(&self, _alarm: &AlarmRecord) -> Result<Option<String>> {
        Ok(None)
    }
}

pub struct AlarmHandler {
    resolver: Arc<ConfigResolver>,
    lookup: Arc<dyn IssueLookup>,
    tracker: OnceCell<Arc<dyn IssueTracker>>,
    settings: OnceCell<TicketSettings>,
    http_timeout: Duration,
}

impl AlarmHandler {
    /// Handler that connects to Jira on first use.
    pub fn new(resolver: Arc<ConfigResolver>, http_timeout: Duration) -> Self {
        Self {
            resolver,
            lookup: Arc::new(NoExistingIssue),
            tracker: OnceCell::new(),
            settings: OnceCell::new(),
            http_timeout,
        }
    }

    /// Handler bound to an already-built tracker client.
    pub fn with_tracker(resolver: Arc<ConfigResolver>, tracker: Arc<dyn IssueTracker>) -> Self {
        Self {
            resolver,
            lookup: Arc::new(NoExistingIssue),
            tracker: OnceCell::new_with(Some(tracker)),
            settings: OnceCell::new(),
            http_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn IssueLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    async fn tracker(&self) -> Result<Arc<dyn IssueTracker>> {
        let tracker = self
            .tracker
            .get_or_try_init(|| async {
                let client = JiraClient::connect(&self.resolver, self.http_timeout).await?;
                Ok::<_, Error>(Arc::new(client) as Arc<dyn IssueTracker>)
            })
            .await?;
        Ok(tracker.clone())
    }

    async fn settings(&self, tracker: &dyn IssueTracker) -> Result<&TicketSettings> {
        self.settings
            .get_or_try_init(|| TicketSettings::resolve(&self.resolver, tracker))
            .await
    }

    /// Process one inbound event.
    pub async fn handle(
        &self,
        event: Value,
        request_id: Option<String>,
    ) -> Result<InvocationResult> {
        info!(request_id = ?request_id, "alarm_event_received");

        let alarms = alarm::extract(event).map_err(|e| {
            error!(request_id = ?request_id, error = %e, "alarm_parse_failed");
            e
        })?;
        info!(request_id = ?request_id, count = alarms.len(), "alarm_event_parsed");

        // Unstructured records never reach the tracker, so a batch made only
        // of them needs neither a connection nor ticket settings.
        let target = if alarms.iter().any(|alarm| !alarm.is_unstructured()) {
            let tracker = self.tracker().await?;
            let settings = self.settings(tracker.as_ref()).await?;
            Some((tracker, settings))
        } else {
            None
        };

        let mut results = Vec::with_capacity(alarms.len());
        for alarm in &alarms {
            let outcome = match &target {
                Some((tracker, settings)) => self.file(tracker.as_ref(), settings, alarm).await,
                None => unstructured(alarm),
            };
            metrics::record_outcome(&outcome);
            results.push(outcome);
        }

        Ok(InvocationResult {
            request_id,
            processed: results.len(),
            results,
        })
    }

    /// File one alarm record. Never fails; errors become the outcome.
    pub async fn file(
        &self,
        tracker: &dyn IssueTracker,
        settings: &TicketSettings,
        alarm: &AlarmRecord,
    ) -> Outcome {
        if alarm.is_unstructured() {
            return unstructured(alarm);
        }

        match self.try_file(tracker, settings, alarm).await {
            Ok(outcome) => {
                info!(outcome = ?outcome, "jira_issue_processed");
                outcome
            }
            Err(Error::Tracker { status, details }) => {
                error!(status_code = status, text = %details, "jira_error");
                Outcome::failed(FailureKind::JiraError, Some(details), alarm.alarm_name())
            }
            Err(e) => {
                error!(error = %e, "jira_issue_unexpected_error");
                Outcome::failed(
                    FailureKind::UnexpectedException,
                    Some(e.to_string()),
                    alarm.alarm_name(),
                )
            }
        }
    }

    async fn try_file(
        &self,
        tracker: &dyn IssueTracker,
        settings: &TicketSettings,
        alarm: &AlarmRecord,
    ) -> Result<Outcome> {
        if let Some(issue_key) = self.lookup.find_existing(alarm).await? {
            tracker
                .add_comment(&issue_key, &ticket::build_comment(alarm))
                .await?;
            return Ok(Outcome::commented(issue_key));
        }

        let fields = ticket::build(alarm, settings);
        let issue = tracker.create_issue(&fields).await?;
        Ok(Outcome::created(issue.key))
    }
}

fn unstructured(alarm: &AlarmRecord) -> Outcome {
    warn!("alarm_payload_unstructured");
    Outcome::failed(
        FailureKind::UnstructuredAlarmMessage,
        None,
        alarm.get(RAW_MESSAGE),
    )
}
