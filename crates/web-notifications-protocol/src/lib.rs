//! Shared types and wire format for web-notifications server ↔ client communication.
//!
//! This crate is intentionally lightweight (only `serde` + `serde_json`).
//! It defines:
//! - The notification options object handed to the client dispatcher
//! - WebSocket JSON messages in both directions (ServerMessage, ClientCall)
//! - HTTP REST request/response types

use serde::{Deserialize, Serialize};

// ── Notification options ───────────────────────────────────────────

/// Text direction of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Auto,
    Ltr,
    Rtl,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Auto => write!(f, "auto"),
            Direction::Ltr => write!(f, "ltr"),
            Direction::Rtl => write!(f, "rtl"),
        }
    }
}

/// Options object passed along with the title to the client dispatcher.
///
/// Field names follow the Notifications API (plus the notify.js extras `timeout` and
/// `closeOnClick`). String fields are always present; unset optional fields are omitted
/// rather than sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    /// Correlates browser events with server-side callbacks
    pub notification_id: String,
    #[serde(default)]
    pub dir: Direction,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub body: String,
    /// Notifications sharing a non-empty tag replace each other
    #[serde(default)]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub renotify: bool,
    #[serde(default)]
    pub silent: bool,
    #[serde(default)]
    pub require_interaction: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Seconds after which the client closes the notification on its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default = "default_close_on_click")]
    pub close_on_click: bool,
    #[serde(default)]
    pub has_on_click: bool,
    #[serde(default)]
    pub has_on_error: bool,
}

fn default_close_on_click() -> bool {
    true
}

impl NotificationOptions {
    /// Options with every field at its default, bound to the given notification id
    pub fn new(notification_id: impl Into<String>) -> Self {
        Self {
            notification_id: notification_id.into(),
            dir: Direction::Auto,
            lang: String::new(),
            body: String::new(),
            tag: String::new(),
            image: None,
            icon: None,
            badge: None,
            sound: None,
            timestamp: None,
            renotify: false,
            silent: false,
            require_interaction: false,
            data: None,
            timeout: None,
            close_on_click: true,
            has_on_click: false,
            has_on_error: false,
        }
    }
}

// ── WebSocket JSON protocol ────────────────────────────────────────
//
// Every WS frame is a single JSON text message.
// Server→Client: ServerMessage, tagged by "type".
// Client→Server: ClientCall, a named server function with positional arguments.

/// Messages pushed from the server to a connected client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent once after connecting; bases for resolving `theme://` and `app://` URLs
    Hello {
        #[serde(rename = "themeBase")]
        theme_base: String,
        #[serde(rename = "appBase")]
        app_base: String,
    },
    /// Show a notification
    Show {
        title: String,
        options: NotificationOptions,
    },
}

/// Functions the client may call on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerFunction {
    #[serde(rename = "onClickCallback")]
    Click,
    #[serde(rename = "onErrorCallback")]
    Error,
    #[serde(rename = "onCloseCallback")]
    Close,
}

impl ServerFunction {
    /// Name the function is registered under on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ServerFunction::Click => "onClickCallback",
            ServerFunction::Error => "onErrorCallback",
            ServerFunction::Close => "onCloseCallback",
        }
    }
}

impl std::fmt::Display for ServerFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A server function invocation from the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCall {
    pub function: ServerFunction,
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
}

impl ClientCall {
    /// Call carrying a single notification id, the shape all notification callbacks use
    pub fn new(function: ServerFunction, notification_id: &str) -> Self {
        Self {
            function,
            arguments: vec![serde_json::Value::String(notification_id.to_string())],
        }
    }

    /// First argument, if it is a string
    pub fn notification_id(&self) -> Option<&str> {
        self.arguments.first().and_then(|v| v.as_str())
    }
}

// ── REST types ─────────────────────────────────────────────────────

/// Default server listen address
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8731";

/// Response for GET /api/status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Number of connected client sessions
    pub sessions: usize,
}

/// Request body for POST /api/sessions/{id}/notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub timeout: Option<u32>,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}
