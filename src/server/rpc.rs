//! HTTP REST endpoints for third-party access

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use web_notifications_protocol::{ApiError, NotifyRequest, ServerStatus};

use super::ServerState;
use crate::core::sessions::SessionId;
use crate::notifications::WebNotifications;

/// Browser connector script
pub const CONNECTOR_JS: &str = include_str!("../../assets/connector.js");

/// GET /connector.js
pub async fn get_connector() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], CONNECTOR_JS)
}

/// GET /api/status
pub async fn get_status(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(ServerStatus {
        sessions: state.sessions.len(),
    })
}

/// POST /api/sessions/{id}/notifications
pub async fn post_notification(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(req): Json<NotifyRequest>,
) -> impl IntoResponse {
    let session = match id.parse::<SessionId>().ok().and_then(|id| state.sessions.get(id)) {
        Some(session) => session,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiError { error: format!("unknown session: {}", id) }),
            )
                .into_response()
        }
    };

    debug!("Notification for session {} requested over HTTP", id);
    WebNotifications::for_session(&session)
        .builder(req.title)
        .body(req.body)
        .tag(req.tag)
        .icon(req.icon)
        .timeout(req.timeout)
        .show();

    StatusCode::ACCEPTED.into_response()
}
