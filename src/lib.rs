//! Web Notifications
//!
//! Desktop browser notifications for session-oriented server UIs.
//!
//! # Features
//! - Fluent [`NotificationBuilder`] covering the common Notifications API options
//! - Click and error callbacks routed back to the server, invoked at most once
//! - Callbacks are never kept alive by the registry alone, so lost browser events cannot leak
//! - One notification bridge per session, resolved from the current session or a scope hint
//! - Client dispatcher for notify.js-style libraries, with `theme://` / `app://` URL resolution
//! - axum WebSocket server with a browser connector script and a small REST API

pub mod client;
pub mod core;
pub mod notifications;
pub mod server;

pub use crate::core::config::Config;
pub use crate::core::error::{Error, Result};
pub use crate::core::scope::{Component, ScopeHint};
pub use crate::core::sessions::{Session, SessionId, SessionManager};
pub use crate::notifications::{NotificationBuilder, WebNotifications};
pub use crate::server::ServerState;
pub use web_notifications_protocol::{Direction, NotificationOptions};
