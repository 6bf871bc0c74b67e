//! Client session management
//!
//! A [`Session`] represents one connected UI client. It owns the outbound message channel to
//! that client and a small typed extension map, so per-session singletons such as the
//! notification bridge can be attached to it. The session currently handling traffic on a
//! thread can be entered with [`Session::enter`] and looked up with [`Session::current`].

use crate::core::error::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;
use web_notifications_protocol::ServerMessage;

/// Unique identifier for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Sender half of a session's outbound channel
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

struct SessionInner {
    id: SessionId,
    sender: ClientSender,
    callback_ttl: Duration,
    extensions: Mutex<Vec<Arc<dyn Any + Send + Sync>>>,
}

thread_local! {
    static CURRENT: RefCell<Vec<Session>> = const { RefCell::new(Vec::new()) };
}

/// Handle to one connected UI client. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Create a session pushing its messages into `sender`.
    ///
    /// `callback_ttl` bounds how long notification callbacks registered in this session are
    /// kept alive while waiting for a browser event.
    pub fn new(sender: ClientSender, callback_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: SessionId::new(),
                sender,
                callback_ttl,
                extensions: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    pub fn callback_ttl(&self) -> Duration {
        self.inner.callback_ttl
    }

    /// A clone of the outbound channel
    pub fn sender(&self) -> ClientSender {
        self.inner.sender.clone()
    }

    /// Whether the client side is still receiving
    pub fn is_open(&self) -> bool {
        !self.inner.sender.is_closed()
    }

    /// Push a message to the client
    pub fn send(&self, message: ServerMessage) -> Result<()> {
        self.inner.sender.send(message).map_err(|_| Error::ChannelClosed)
    }

    /// The attached extension of type `T`, if any
    pub fn extension<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner
            .extensions
            .lock()
            .iter()
            .find_map(|e| Arc::clone(e).downcast::<T>().ok())
    }

    /// The attached extension of type `T`, attaching the one built by `init` if there is none.
    ///
    /// Lookup and insertion happen under one lock, so concurrent callers always end up with
    /// the same instance. `init` must not access this session's extensions.
    pub fn extension_or_insert_with<T, F>(&self, init: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce(&Session) -> T,
    {
        let mut extensions = self.inner.extensions.lock();
        if let Some(existing) = extensions.iter().find_map(|e| Arc::clone(e).downcast::<T>().ok()) {
            return existing;
        }
        let created = Arc::new(init(self));
        extensions.push(Arc::clone(&created) as Arc<dyn Any + Send + Sync>);
        created
    }

    /// Detach every extension. Returns how many were attached.
    pub fn clear_extensions(&self) -> usize {
        let extensions = std::mem::take(&mut *self.inner.extensions.lock());
        extensions.len()
    }

    /// Make this session current on this thread until the guard is dropped
    pub fn enter(&self) -> SessionGuard {
        let depth = CURRENT.with(|c| {
            let mut stack = c.borrow_mut();
            stack.push(self.clone());
            stack.len() - 1
        });
        SessionGuard {
            depth,
            _not_send: PhantomData,
        }
    }

    /// Innermost session entered on this thread
    pub fn current() -> Option<Session> {
        CURRENT.with(|c| c.borrow().last().cloned())
    }

    pub fn downgrade(&self) -> WeakSession {
        WeakSession {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.inner.id).finish_non_exhaustive()
    }
}

/// Keeps a session current on this thread; see [`Session::enter`]
#[must_use = "the session is only current while the guard is alive"]
pub struct SessionGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // Also ends any session entered later whose guard is still alive
        let exited = CURRENT.with(|c| {
            let mut stack = c.borrow_mut();
            let depth = self.depth.min(stack.len());
            stack.split_off(depth)
        });
        drop(exited);
    }
}

/// Non-owning session handle
#[derive(Clone, Default)]
pub struct WeakSession {
    inner: Weak<SessionInner>,
}

impl WeakSession {
    pub fn upgrade(&self) -> Option<Session> {
        self.inner.upgrade().map(|inner| Session { inner })
    }
}

/// All live sessions, keyed by id
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) {
        self.sessions.write().insert(session.id(), session);
    }

    pub fn remove(&self, id: SessionId) -> Option<Session> {
        self.sessions.write().remove(&id)
    }

    pub fn get(&self, id: SessionId) -> Option<Session> {
        self.sessions.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
