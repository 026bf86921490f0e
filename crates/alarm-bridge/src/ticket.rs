//! Ticket fields built from an alarm record.
//!
//! `TicketSettings` holds everything resolved from configuration once per
//! process; `build` is then a pure function of the alarm and those settings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::alarm::{
    AlarmRecord, ACCOUNT_ID, ALARM_DESCRIPTION, ALARM_NAME, NEW_STATE_REASON, NEW_STATE_VALUE,
    OLD_STATE_VALUE, RAW_MESSAGE, REGION, STATE_CHANGE_TIME, TRIGGER,
};
use crate::resolver::ConfigResolver;
use crate::tracker::IssueTracker;
use crate::{Error, Result};

/// Jira rejects summaries longer than this.
pub const SUMMARY_MAX_CHARS: usize = 255;
pub const DEFAULT_ISSUE_TYPE: &str = "Task";

const NOT_AVAILABLE: &str = "N/A";
const UNKNOWN_STATE: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueTypeRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRef {
    pub name: String,
}

/// Serializes as `{"id": ...}` or `{"name": ...}`, the two assignee forms
/// Jira accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assignee {
    #[serde(rename = "id")]
    AccountId(String),
    #[serde(rename = "name")]
    Username(String),
}

/// The `fields` object of a Jira create-issue request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketFields {
    pub project: ProjectRef,
    pub summary: String,
    pub description: String,
    #[serde(rename = "issuetype")]
    pub issue_type: IssueTypeRef,
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Assignee>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketSettings {
    pub project_key: String,
    pub issue_type: String,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    pub assignee: Option<Assignee>,
}

impl TicketSettings {
    /// Resolve ticket settings. Project and issue type are required; labels,
    /// components and assignee are dropped with a warning if they cannot be
    /// resolved.
    pub async fn resolve(resolver: &ConfigResolver, tracker: &dyn IssueTracker) -> Result<Self> {
        let project_key = resolve_project_key(resolver, tracker).await?;
        let issue_type = resolver
            .resolve("JIRA_ISSUE_TYPE", false, Some(DEFAULT_ISSUE_TYPE))
            .await?
            .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_string());

        let labels = optional_setting(resolver, "JIRA_ALARM_LABEL")
            .await
            .map(|raw| parse_labels(&raw))
            .unwrap_or_default();
        let components = optional_setting(resolver, "JIRA_COMPONENTS")
            .await
            .map(|raw| split_list(&raw))
            .unwrap_or_default();

        let assignee = match optional_setting(resolver, "JIRA_DEFAULT_ASSIGNEE_ACCOUNT_ID").await {
            Some(account_id) => Some(Assignee::AccountId(account_id)),
            None => optional_setting(resolver, "JIRA_DEFAULT_ASSIGNEE")
                .await
                .map(Assignee::Username),
        };

        Ok(Self {
            project_key,
            issue_type,
            labels,
            components,
            assignee,
        })
    }
}

async fn resolve_project_key(
    resolver: &ConfigResolver,
    tracker: &dyn IssueTracker,
) -> Result<String> {
    if let Some(key) = resolver.optional("JIRA_PROJECT_KEY").await? {
        return Ok(key);
    }

    let project_name = match resolver.require("JIRA_PROJECT_NAME").await {
        Err(Error::Configuration(_)) => {
            return Err(Error::Configuration(
                "One of JIRA_PROJECT_KEY or JIRA_PROJECT_NAME is required".to_string(),
            ))
        }
        other => other?,
    };
    debug!(project_name = %project_name, "resolving_project_key");

    tracker
        .list_projects()
        .await?
        .into_iter()
        .find(|project| project.name.to_lowercase() == project_name.to_lowercase())
        .map(|project| project.key)
        .ok_or_else(|| {
            Error::Configuration(format!(
                "Unable to resolve Jira project key for name '{}'",
                project_name
            ))
        })
}

async fn optional_setting(resolver: &ConfigResolver, name: &str) -> Option<String> {
    match resolver.optional(name).await {
        Ok(value) => value,
        Err(e) => {
            warn!(setting = name, error = %e, "optional_setting_unavailable");
            None
        }
    }
}

/// Comma separated labels as Jira accepts them: lower-case, no spaces.
pub fn parse_labels(raw: &str) -> Vec<String> {
    split_list(raw)
        .into_iter()
        .map(|label| label.to_lowercase().replace(' ', "-"))
        .collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn build(alarm: &AlarmRecord, settings: &TicketSettings) -> TicketFields {
    TicketFields {
        project: ProjectRef {
            key: settings.project_key.clone(),
        },
        summary: build_summary(alarm),
        description: build_description(alarm),
        issue_type: IssueTypeRef {
            name: settings.issue_type.clone(),
        },
        labels: settings.labels.clone(),
        components: settings
            .components
            .iter()
            .map(|name| ComponentRef { name: name.clone() })
            .collect(),
        assignee: settings.assignee.clone(),
    }
}

pub fn build_summary(alarm: &AlarmRecord) -> String {
    let summary = format!(
        "[CloudWatch] {} is {}",
        field_or(alarm, ALARM_NAME, "Unknown Alarm"),
        field_or(alarm, NEW_STATE_VALUE, UNKNOWN_STATE),
    );
    summary.chars().take(SUMMARY_MAX_CHARS).collect()
}

pub fn build_description(alarm: &AlarmRecord) -> String {
    let mut parts = vec![
        "CloudWatch alarm transitioned state.".to_string(),
        String::new(),
        format!("Alarm Name: {}", field_or(alarm, ALARM_NAME, NOT_AVAILABLE)),
        format!("Alarm Description: {}", field_or(alarm, ALARM_DESCRIPTION, NOT_AVAILABLE)),
        format!("AWS Account: {}", field_or(alarm, ACCOUNT_ID, NOT_AVAILABLE)),
        format!("Region: {}", field_or(alarm, REGION, NOT_AVAILABLE)),
        format!("State Change Time: {}", field_or(alarm, STATE_CHANGE_TIME, NOT_AVAILABLE)),
        format!("Previous State: {}", field_or(alarm, OLD_STATE_VALUE, UNKNOWN_STATE)),
        format!("Current State: {}", field_or(alarm, NEW_STATE_VALUE, UNKNOWN_STATE)),
        String::new(),
        "New State Reason:".to_string(),
        field_or(alarm, NEW_STATE_REASON, NOT_AVAILABLE),
    ];

    if let Some(trigger) = alarm.get(TRIGGER).filter(|trigger| !is_empty(trigger)) {
        parts.extend([String::new(), "Trigger:".to_string(), pretty(trigger)]);
    }

    if let Some(raw) = alarm.get(RAW_MESSAGE).filter(|raw| !is_empty(raw)) {
        let original = match raw {
            Value::String(text) => text.clone(),
            other => pretty(other),
        };
        parts.extend([String::new(), "Original Message:".to_string(), original]);
    }

    parts.join("\n")
}

/// Comment added when an alarm fires against an already-open issue.
pub fn build_comment(alarm: &AlarmRecord) -> String {
    let mut lines = vec![
        "CloudWatch alarm triggered again.".to_string(),
        format!("Current State: {}", field_or(alarm, NEW_STATE_VALUE, UNKNOWN_STATE)),
        format!("State Change Time: {}", field_or(alarm, STATE_CHANGE_TIME, NOT_AVAILABLE)),
    ];
    if let Some(reason) = alarm.text(NEW_STATE_REASON).filter(|reason| !reason.is_empty()) {
        lines.extend([String::new(), reason]);
    }
    lines.extend([
        String::new(),
        "Alarm Payload:".to_string(),
        pretty(&Value::Object(alarm.fields().clone())),
    ]);
    lines.join("\n")
}

fn field_or(alarm: &AlarmRecord, key: &str, fallback: &str) -> String {
    alarm.text(key).unwrap_or_else(|| fallback.to_string())
}

/// Null, `false`, zero and empty strings, arrays or objects add no block.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
