//! Streamable HTTP transport.
//!
//! `GET /health` answers `{"status":"ok"}`; the MCP endpoint lives at
//! `/mcp`. Request headers reach [`BlokgateServer`] through the request
//! context, so callers may send `x-storyblok-*` credentials per call.

use std::net::SocketAddr;

use axum::routing::get;
use axum::{Json, Router};
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::server::BlokgateServer;

/// Path of the MCP endpoint.
pub const MCP_PATH: &str = "/mcp";

/// Router serving `server` at [`MCP_PATH`] plus a health check.
pub fn router(server: BlokgateServer) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    Router::new()
        .route("/health", get(health))
        .nest_service(MCP_PATH, service)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve on an already bound listener until Ctrl-C.
pub async fn serve_on(server: BlokgateServer, listener: TcpListener) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, path = MCP_PATH, "blokgate listening");
    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(server: BlokgateServer, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(server, listener).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use blokgate_client::MockContentApi;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = BlokgateServer::with_api(Arc::new(MockContentApi::new()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(server)).await.unwrap();
        });

        let body: Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }
}
