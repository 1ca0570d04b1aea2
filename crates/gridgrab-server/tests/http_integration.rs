#[allow(dead_code)]
mod common;

use common::{TestServer, ws_join};
use gridgrab_server::config::ServerConfig;

#[tokio::test]
async fn health_reports_connections_and_game() {
    let server = TestServer::new().await;
    let (_a, _) = ws_join(&server.ws_url()).await;
    let (_b, _) = ws_join(&server.ws_url()).await;

    let resp = reqwest::get(format!("{}/health", server.base_url()))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["connections"]["websocket"], 2);
    assert_eq!(body["game"]["players"], 2);
    assert_eq!(body["game"]["participants"], 0);
    assert_eq!(body["game"]["status"], "waiting");
}

#[tokio::test]
async fn health_unavailable_after_shutdown() {
    let server = TestServer::new().await;
    server.shutdown.cancel();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let resp = reqwest::get(format!("{}/health", server.base_url()))
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn connection_limit_rejects_upgrade() {
    let mut config = ServerConfig::default();
    config.limits.max_ws_connections = 1;
    let server = TestServer::from_config(config).await;
    let (_first, _) = ws_join(&server.ws_url()).await;

    let result = tokio_tungstenite::connect_async(server.ws_url()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn unknown_paths_fall_through_to_static_files() {
    let server = TestServer::new().await;
    let resp = reqwest::get(format!("{}/no-such-file.js", server.base_url()))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
