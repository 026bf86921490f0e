mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{filing::AlarmHandler, Result};

/// HTTP front door for the alarm handler, for webhook delivery and local runs.
pub struct Server {
    handler: Arc<AlarmHandler>,
}

impl Server {
    pub fn new(handler: Arc<AlarmHandler>) -> Self {
        Self { handler }
    }

    pub fn build_router(self) -> Router {
        Router::new()
            .route("/health", get(routes::health))
            .route("/metrics", get(routes::metrics))
            .route("/invoke", post(routes::invoke))
            .layer(TraceLayer::new_for_http())
            .with_state(self.handler)
    }

    pub async fn start(self, addr: &str) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(addr, "server_listening");
        axum::serve(listener, self.build_router()).await?;
        Ok(())
    }
}
