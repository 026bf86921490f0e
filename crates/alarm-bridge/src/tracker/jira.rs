//! Jira REST (v2) client.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{CreatedIssue, IssueTracker, Project};
use crate::resolver::ConfigResolver;
use crate::ticket::TicketFields;
use crate::{Error, Result};

pub struct JiraClient {
    client: Client,
    base_url: Url,
    email: String,
    api_token: String,
}

impl JiraClient {
    pub fn new(host: &str, email: &str, api_token: &str, timeout: Duration) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends in '/'.
        let mut host = host.trim().to_string();
        if !host.ends_with('/') {
            host.push('/');
        }
        let base_url = Url::parse(&host)
            .map_err(|e| Error::Configuration(format!("Invalid JIRA_HOST '{}': {}", host, e)))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            email: email.to_string(),
            api_token: api_token.to_string(),
        })
    }

    /// Build a client from `JIRA_HOST`, `JIRA_EMAIL` and `JIRA_API_TOKEN`.
    pub async fn connect(resolver: &ConfigResolver, timeout: Duration) -> Result<Self> {
        let host = resolver.require("JIRA_HOST").await?;
        let email = resolver.require("JIRA_EMAIL").await?;
        let api_token = resolver.require("JIRA_API_TOKEN").await?;
        debug!(host = %host, "initialising_jira_client");
        Self::new(&host, &email, &api_token, timeout)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Internal(format!("Failed to build Jira URL for '{}': {}", path, e)))
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let details = response.text().await.unwrap_or_default();
        Err(Error::Tracker {
            status: status.as_u16(),
            details,
        })
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let response = self
            .client
            .get(self.endpoint("rest/api/2/project")?)
            .basic_auth(&self.email, Some(&self.api_token))
            .send()
            .await?;
        let projects = Self::check(response).await?.json().await?;
        Ok(projects)
    }

    async fn create_issue(&self, fields: &TicketFields) -> Result<CreatedIssue> {
        let response = self
            .client
            .post(self.endpoint("rest/api/2/issue")?)
            .basic_auth(&self.email, Some(&self.api_token))
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        let issue = Self::check(response).await?.json().await?;
        Ok(issue)
    }

    async fn add_comment(&self, issue_key: &str, body: &str) -> Result<()> {
        let path = format!("rest/api/2/issue/{}/comment", issue_key);
        let response = self
            .client
            .post(self.endpoint(&path)?)
            .basic_auth(&self.email, Some(&self.api_token))
            .json(&json!({ "body": body }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_host_path_prefix() {
        let client = JiraClient::new(
            "https://intranet.example.com/jira",
            "ops@example.com",
            "token",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("rest/api/2/issue").unwrap().as_str(),
            "https://intranet.example.com/jira/rest/api/2/issue"
        );
    }

    #[test]
    fn rejects_unparseable_host() {
        let err = JiraClient::new("not a url", "e", "t", Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
