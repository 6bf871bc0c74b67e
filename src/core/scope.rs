//! Scope hints: things that know which session they belong to

use super::sessions::{Session, WeakSession};
use parking_lot::Mutex;

/// Anything that can resolve the session it is attached to
pub trait ScopeHint {
    fn session(&self) -> Option<Session>;
}

impl ScopeHint for Session {
    fn session(&self) -> Option<Session> {
        Some(self.clone())
    }
}

/// A UI component that may be attached to a session.
///
/// Holds only a weak reference, so a component outliving its session reports itself as
/// detached.
#[derive(Default)]
pub struct Component {
    name: String,
    session: Mutex<WeakSession>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            session: Mutex::new(WeakSession::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attach(&self, session: &Session) {
        *self.session.lock() = session.downgrade();
    }

    pub fn detach(&self) {
        *self.session.lock() = WeakSession::default();
    }

    pub fn is_attached(&self) -> bool {
        self.session().is_some()
    }
}

impl ScopeHint for Component {
    fn session(&self) -> Option<Session> {
        self.session.lock().upgrade()
    }
}
