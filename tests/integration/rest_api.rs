//! REST handler tests

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;
use tokio::sync::mpsc;
use web_notifications::server::rpc;
use web_notifications::{Config, ServerState};
use web_notifications_protocol::{ApiError, NotifyRequest, ServerMessage, ServerStatus};

fn request(title: &str) -> NotifyRequest {
    NotifyRequest {
        title: title.to_string(),
        body: Some("from HTTP".to_string()),
        tag: None,
        icon: Some("theme://bell.png".to_string()),
        timeout: Some(10),
    }
}

#[tokio::test]
async fn test_status_counts_sessions() {
    let state = Arc::new(ServerState::new(Config::default()));
    let (tx, _rx) = mpsc::unbounded_channel();
    let _session = state.open_session(tx);

    let response = rpc::get_status(State(Arc::clone(&state))).await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let body = tokio_test::assert_ok!(axum::body::to_bytes(response.into_body(), usize::MAX).await);
    let status: ServerStatus = serde_json::from_slice(&body).unwrap();
    assert_eq!(status.sessions, 1);
}

#[tokio::test]
async fn test_post_notification_reaches_session() {
    let state = Arc::new(ServerState::new(Config::default()));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = state.open_session(tx);
    assert!(matches!(rx.recv().await, Some(ServerMessage::Hello { .. })));

    let response = rpc::post_notification(
        State(Arc::clone(&state)),
        Path(session.id().to_string()),
        Json(request("Deploy")),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    match rx.recv().await {
        Some(ServerMessage::Show { title, options }) => {
            assert_eq!(title, "Deploy");
            assert_eq!(options.body, "from HTTP");
            assert_eq!(options.tag, "");
            assert_eq!(options.icon.as_deref(), Some("theme://bell.png"));
            assert_eq!(options.timeout, Some(10));
            assert!(!options.has_on_click);
        }
        other => panic!("unexpected message: {:?}", other),
    }
}

#[tokio::test]
async fn test_post_notification_unknown_session() {
    let state = Arc::new(ServerState::new(Config::default()));
    for id in ["not-a-uuid", "6f1c1d5e-8e4b-4c1a-9a57-3f0c2b1d9e10"] {
        let response = rpc::post_notification(
            State(Arc::clone(&state)),
            Path(id.to_string()),
            Json(request("Nobody")),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = tokio_test::assert_ok!(axum::body::to_bytes(response.into_body(), usize::MAX).await);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert!(error.error.contains(id));
    }
}

#[tokio::test]
async fn test_connector_script() {
    let response = rpc::get_connector().await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(rpc::CONNECTOR_JS.contains("onClickCallback"));
    assert!(rpc::CONNECTOR_JS.contains("theme://"));
}
