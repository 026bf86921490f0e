#![allow(dead_code)]

use alarm_bridge::{
    resolver::Env,
    secrets::{SecretStore, SecretValue},
    ticket::TicketFields,
    tracker::{CreatedIssue, IssueTracker, Project},
    ConfigResolver, Error, Result,
};
use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Serve `router` on an ephemeral local port and return its `host:port`.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr.to_string()
}

pub fn env(pairs: &[(&str, &str)]) -> Arc<dyn Env> {
    Arc::new(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    )
}

pub fn resolver(pairs: &[(&str, &str)], secrets: Arc<StaticSecrets>) -> Arc<ConfigResolver> {
    Arc::new(ConfigResolver::new(env(pairs), secrets))
}

/// In-memory secret store that counts fetches.
#[derive(Default)]
pub struct StaticSecrets {
    secrets: HashMap<String, String>,
    pub fetches: AtomicUsize,
}

impl StaticSecrets {
    pub fn new(secrets: &[(&str, &str)]) -> Self {
        Self {
            secrets: secrets
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for StaticSecrets {
    async fn get_secret_value(&self, secret_id: &str) -> Result<SecretValue> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .get(secret_id)
            .map(|secret| SecretValue::from_string(secret.clone()))
            .ok_or_else(|| Error::SecretAccess(format!("no secret named '{}'", secret_id)))
    }
}

/// Tracker that files everything except summaries containing "Reject".
#[derive(Default)]
pub struct RecordingTracker {
    pub created: Mutex<Vec<TicketFields>>,
}

#[async_trait]
impl IssueTracker for RecordingTracker {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(vec![])
    }

    async fn create_issue(&self, fields: &TicketFields) -> Result<CreatedIssue> {
        if fields.summary.contains("Reject") {
            return Err(Error::Tracker {
                status: 400,
                details: "rejected".to_string(),
            });
        }
        let mut created = self.created.lock().unwrap();
        created.push(fields.clone());
        Ok(CreatedIssue {
            key: format!("OPS-{}", created.len()),
            id: None,
            url: None,
        })
    }

    async fn add_comment(&self, _issue_key: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}

/// What the fake Jira saw.
#[derive(Default)]
pub struct JiraState {
    pub authorization: Mutex<Vec<String>>,
    pub issues: Mutex<Vec<Value>>,
    pub comments: Mutex<Vec<(String, Value)>>,
    pub project_listings: AtomicUsize,
}

impl JiraState {
    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.authorization.lock().unwrap().push(value);
    }
}

/// Start a fake Jira REST API. Issues whose summary contains "Reject" get a 400.
pub async fn spawn_jira() -> (String, Arc<JiraState>) {
    let state = Arc::new(JiraState::default());
    let router = Router::new()
        .route("/rest/api/2/project", get(list_projects))
        .route("/rest/api/2/issue", post(create_issue))
        .route("/rest/api/2/issue/{key}/comment", post(add_comment))
        .with_state(state.clone());
    let addr = spawn(router).await;
    (format!("http://{}", addr), state)
}

async fn list_projects(State(state): State<Arc<JiraState>>, headers: HeaderMap) -> Json<Value> {
    state.record_auth(&headers);
    state.project_listings.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        {"id": "10000", "key": "DEV", "name": "Development"},
        {"id": "10001", "key": "OPS", "name": "Operations"}
    ]))
}

async fn create_issue(
    State(state): State<Arc<JiraState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.record_auth(&headers);
    let summary = body["fields"]["summary"].as_str().unwrap_or_default();
    if summary.contains("Reject") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"errorMessages": [], "errors": {"summary": "rejected by workflow"}})),
        );
    }

    let mut issues = state.issues.lock().unwrap();
    issues.push(body);
    let number = issues.len();
    (
        StatusCode::CREATED,
        Json(json!({
            "id": format!("{}", 10000 + number),
            "key": format!("OPS-{}", number),
            "self": format!("https://jira.example.net/rest/api/2/issue/{}", 10000 + number)
        })),
    )
}

async fn add_comment(
    State(state): State<Arc<JiraState>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.record_auth(&headers);
    state.comments.lock().unwrap().push((key, body));
    (StatusCode::CREATED, Json(json!({"id": "1"})))
}
