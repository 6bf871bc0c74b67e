//! HTTP + WebSocket server
//!
//! Every WebSocket connection on `/ws` becomes a [`Session`]. The REST endpoints allow
//! third parties to inspect the server and push notifications into a session.

pub mod rpc;
pub mod ws;

use crate::core::config::Config;
use crate::core::sessions::{ClientSender, Session, SessionManager};
use crate::notifications::WebNotifications;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use web_notifications_protocol::ServerMessage;

/// Called with every newly connected session, while that session is current
pub type SessionHook = Arc<dyn Fn(&Session) + Send + Sync>;

/// Shared state across the server (must be Send + Sync for axum)
pub struct ServerState {
    pub config: Config,
    pub sessions: SessionManager,
    on_session: Option<SessionHook>,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sessions: SessionManager::new(),
            on_session: None,
        }
    }

    pub fn with_session_hook(mut self, hook: impl Fn(&Session) + Send + Sync + 'static) -> Self {
        self.on_session = Some(Arc::new(hook));
        self
    }

    /// Create and register a session, greet its client and run the session hook
    pub fn open_session(&self, sender: ClientSender) -> Session {
        let session = Session::new(sender, self.config.notifications.callback_ttl());
        self.sessions.insert(session.clone());

        let hello = ServerMessage::Hello {
            theme_base: self.config.urls.theme_base.clone(),
            app_base: self.config.urls.app_base.clone(),
        };
        if let Err(e) = session.send(hello) {
            warn!("Failed to greet session {}: {}", session.id(), e);
        }

        if let Some(hook) = &self.on_session {
            let _guard = session.enter();
            hook(&session);
        }
        session
    }

    /// Unregister a session and release everything attached to it
    pub fn close_session(&self, session: &Session) {
        self.sessions.remove(session.id());
        if let Some(bridge) = session.extension::<WebNotifications>() {
            bridge.shutdown();
        }
        session.clear_extensions();
    }
}

/// Build the axum router
pub fn router(state: Arc<ServerState>) -> axum::Router {
    axum::Router::new()
        .route("/ws", axum::routing::get(ws::ws_handler))
        .route("/connector.js", axum::routing::get(rpc::get_connector))
        .route("/api/status", axum::routing::get(rpc::get_status))
        .route(
            "/api/sessions/{id}/notifications",
            axum::routing::post(rpc::post_notification),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

/// Bind the configured address and serve until the process ends
pub async fn serve(state: Arc<ServerState>) -> Result<()> {
    let listen = state.config.server.listen.clone();
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    info!("Listening on {}", listen);

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;
    Ok(())
}
