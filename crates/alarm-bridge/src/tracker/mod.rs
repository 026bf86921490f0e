mod jira;

pub use jira::JiraClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ticket::TicketFields;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Operations the bridge needs from the issue tracker. Rejections by the
/// tracker itself surface as `Error::Tracker`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn create_issue(&self, fields: &TicketFields) -> Result<CreatedIssue>;
    async fn add_comment(&self, issue_key: &str, body: &str) -> Result<()>;
}
