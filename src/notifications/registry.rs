//! Callback registry mapping notification ids to click/error callbacks
//!
//! The registry only holds weak handles. Browsers do not reliably report a terminal event for
//! every notification (permission denied, tab closed, notification discarded), so nothing here
//! may keep a callback alive on its own. Strong handles live in a [`CallbackRetainer`], which
//! lets go of them after a terminal event, after a retention period, or when its owner drops.
//! A callback whose strong handle is gone is silently skipped when its event arrives.

use parking_lot::Mutex;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

/// User callback invoked on a browser event
pub type Callback = Box<dyn Fn() + Send + Sync>;

/// Opaque id correlating browser events with the notification that caused them
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotificationId(String);

impl NotificationId {
    /// Mint a fresh, unique id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Borrow<str> for NotificationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NotificationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Callbacks registered for a single notification
pub struct Callbacks {
    on_click: Option<Callback>,
    on_error: Option<Callback>,
}

impl Callbacks {
    pub fn new(on_click: Option<Callback>, on_error: Option<Callback>) -> Self {
        Self { on_click, on_error }
    }

    pub fn has_click(&self) -> bool {
        self.on_click.is_some()
    }

    pub fn has_error(&self) -> bool {
        self.on_error.is_some()
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_click", &self.has_click())
            .field("on_error", &self.has_error())
            .finish()
    }
}

/// Concurrent id → weak callbacks map with remove-on-read lookups
#[derive(Default)]
pub struct CallbackRegistry {
    entries: Mutex<HashMap<NotificationId, Weak<Callbacks>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callbacks` under `id`, replacing any previous entry.
    ///
    /// Entries whose callbacks are already gone are swept at the same time.
    pub fn register(&self, id: NotificationId, callbacks: &Arc<Callbacks>) {
        let mut entries = self.entries.lock();
        entries.retain(|_, weak| weak.strong_count() > 0);
        entries.insert(id, Arc::downgrade(callbacks));
    }

    /// Remove the entry for `id` and return its callbacks if they are still alive
    fn take(&self, id: &str) -> Option<Arc<Callbacks>> {
        let weak = self.entries.lock().remove(id)?;
        weak.upgrade()
    }

    /// Consume the entry for `id` and run its click callback.
    ///
    /// Returns whether a callback ran. Unknown, fired, closed or dropped ids are a no-op.
    pub fn fire_click(&self, id: &str) -> bool {
        match self.take(id) {
            Some(callbacks) => match &callbacks.on_click {
                Some(on_click) => {
                    on_click();
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Consume the entry for `id` and run its error callback
    pub fn fire_error(&self, id: &str) -> bool {
        match self.take(id) {
            Some(callbacks) => match &callbacks.on_error {
                Some(on_error) => {
                    on_error();
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Drop the entry for `id` without running anything. Returns whether one existed.
    pub fn fire_close(&self, id: &str) -> bool {
        self.entries.lock().remove(id).is_some()
    }

    /// Forget every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Whether `id` has a live entry
    pub fn contains(&self, id: &str) -> bool {
        self.entries
            .lock()
            .get(id)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type Held = HashMap<NotificationId, (Instant, Arc<Callbacks>)>;

/// Time-bounded owner of registered callbacks.
///
/// Inside a tokio runtime every [`hold`](Self::hold) schedules a release once the retention
/// period has passed. Without a runtime, expired entries are swept on the next `hold`.
pub struct CallbackRetainer {
    ttl: Duration,
    held: Arc<Mutex<Held>>,
}

impl CallbackRetainer {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            held: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Keep `callbacks` alive for the retention period
    pub fn hold(&self, id: NotificationId, callbacks: Arc<Callbacks>) {
        let now = Instant::now();
        self.expire(now);
        let replaced = self.held.lock().insert(id, (now + self.ttl, callbacks));
        drop(replaced);

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let held = Arc::downgrade(&self.held);
            let ttl = self.ttl;
            runtime.spawn(async move {
                tokio::time::sleep(ttl).await;
                if let Some(held) = held.upgrade() {
                    let expired = expire_held(&held, Instant::now());
                    if expired > 0 {
                        debug!("Released {} expired notification callback(s)", expired);
                    }
                }
            });
        }
    }

    /// Let go of the callbacks for `id`
    pub fn release(&self, id: &str) -> bool {
        let removed = self.held.lock().remove(id);
        removed.is_some()
    }

    /// Drop everything whose deadline is at or before `now`; returns how many were dropped
    pub fn expire(&self, now: Instant) -> usize {
        expire_held(&self.held, now)
    }

    /// Let go of every held callback; returns how many were dropped
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.held.lock());
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.held.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.lock().is_empty()
    }
}

/// Callbacks are dropped after the lock is released, since dropping one may drop a session.
fn expire_held(held: &Mutex<Held>, now: Instant) -> usize {
    let expired: Vec<Arc<Callbacks>> = {
        let mut held = held.lock();
        let ids: Vec<NotificationId> = held
            .iter()
            .filter(|(_, (deadline, _))| *deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        ids.iter().filter_map(|id| held.remove(id)).map(|(_, callbacks)| callbacks).collect()
    };
    expired.len()
}
