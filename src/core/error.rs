//! Error type shared by the notification bridge and session layer

use web_notifications_protocol::ServerFunction;

/// Errors raised while resolving sessions or routing client calls
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `create` was called outside of any entered session
    #[error("no current session found")]
    NoCurrentSession,

    /// The scope hint handed to `create_for` is not attached to a live session
    #[error("the scope is not attached to a session")]
    NotAttached,

    /// A client call did not carry the expected arguments
    #[error("invalid arguments for {function}: {reason}")]
    InvalidArguments {
        function: ServerFunction,
        reason: String,
    },

    /// The client side of a session has gone away
    #[error("client channel closed")]
    ChannelClosed,

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
