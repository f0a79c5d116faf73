//! In-process integration harness for the agritrace node.
//!
//! Spawns the node's router on an ephemeral port inside the test process,
//! so the suite runs under plain `cargo test` with no external services.

use std::sync::Arc;

use agritrace_client::RestClient;
use agritrace_node::auth::UserDirectory;
use agritrace_node::{build_router, AppState};

/// Spawn the node on an ephemeral port and return a REST client pointed at
/// it. The server task runs until the test process exits.
pub async fn spawn_node() -> RestClient {
    let (client, _) = spawn_node_with_url().await;
    client
}

/// Like [`spawn_node`], also returning the base URL for raw-HTTP checks.
pub async fn spawn_node_with_url() -> (RestClient, String) {
    let state = Arc::new(AppState::new(UserDirectory::in_memory()));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });

    let base_url = format!("http://{addr}");
    (RestClient::new(base_url.clone()), base_url)
}
