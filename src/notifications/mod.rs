//! Desktop notifications for connected sessions
//!
//! [`WebNotifications`] is attached to a session at most once. It hands out
//! [`NotificationBuilder`]s, keeps the callbacks of shown notifications, and routes the
//! client's `onClickCallback` / `onErrorCallback` / `onCloseCallback` calls back to them.
//!
//! Only a handful of options are safe to rely on across desktop browsers: body, icon, tag,
//! the click and error callbacks, timeout and close-on-click. The rest are passed through and
//! honored where the browser supports them.

pub mod builder;
pub mod registry;

pub use builder::{NotificationBuilder, OptionalString};
pub use registry::{Callback, CallbackRegistry, CallbackRetainer, Callbacks, NotificationId};

use crate::core::error::{Error, Result};
use crate::core::scope::ScopeHint;
use crate::core::sessions::{ClientSender, Session, SessionId};
use std::sync::Arc;
use tracing::{debug, warn};
use web_notifications_protocol::{ClientCall, ServerFunction, ServerMessage};

/// Per-session notification bridge
pub struct WebNotifications {
    session_id: SessionId,
    sender: ClientSender,
    registry: CallbackRegistry,
    retainer: CallbackRetainer,
}

impl WebNotifications {
    fn new(session: &Session) -> Self {
        debug!("Attaching notifications to session {}", session.id());
        Self {
            session_id: session.id(),
            sender: session.sender(),
            registry: CallbackRegistry::new(),
            retainer: CallbackRetainer::new(session.callback_ttl()),
        }
    }

    /// The bridge attached to `session`, attaching one if there is none yet
    pub fn for_session(session: &Session) -> Arc<Self> {
        session.extension_or_insert_with(Self::new)
    }

    /// Start a notification in the current session.
    ///
    /// Fails with [`Error::NoCurrentSession`] outside of an entered session.
    pub fn create(title: impl Into<String>) -> Result<NotificationBuilder> {
        let session = Session::current().ok_or(Error::NoCurrentSession)?;
        Ok(Self::for_session(&session).builder(title))
    }

    /// Start a notification in the session `scope` is attached to.
    ///
    /// Fails with [`Error::NotAttached`] if the scope has no live session.
    pub fn create_for<S>(scope: &S, title: impl Into<String>) -> Result<NotificationBuilder>
    where
        S: ScopeHint + ?Sized,
    {
        let session = scope.session().ok_or(Error::NotAttached)?;
        Ok(Self::for_session(&session).builder(title))
    }

    /// Start a notification in this bridge's session
    pub fn builder(self: &Arc<Self>, title: impl Into<String>) -> NotificationBuilder {
        NotificationBuilder::new(Arc::clone(self), title.into())
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    pub(crate) fn register(&self, id: NotificationId, callbacks: Callbacks) {
        let callbacks = Arc::new(callbacks);
        self.registry.register(id.clone(), &callbacks);
        self.retainer.hold(id, callbacks);
    }

    pub(crate) fn send(&self, message: ServerMessage) -> Result<()> {
        self.sender.send(message).map_err(|_| Error::ChannelClosed)
    }

    /// `onClickCallback`: run and forget the click callback of `id`
    pub fn on_click(&self, id: &str) {
        let fired = self.registry.fire_click(id);
        self.retainer.release(id);
        debug!("Notification {} clicked (callback fired: {})", id, fired);
    }

    /// `onErrorCallback`: run and forget the error callback of `id`
    pub fn on_error(&self, id: &str) {
        let fired = self.registry.fire_error(id);
        self.retainer.release(id);
        debug!("Notification {} failed (callback fired: {})", id, fired);
    }

    /// `onCloseCallback`: forget the callbacks of `id`.
    ///
    /// The close event is deprecated and not reported by every browser, so it is only used
    /// for cleanup.
    pub fn on_close(&self, id: &str) {
        self.registry.fire_close(id);
        self.retainer.release(id);
        debug!("Notification {} closed", id);
    }

    /// Let go of every callback of this session.
    ///
    /// Called when the session closes. Callbacks may capture their session, so they must not
    /// outlive it.
    pub fn shutdown(&self) {
        let released = self.retainer.clear();
        self.registry.clear();
        debug!("Session {}: released {} pending notification callback(s)", self.session_id, released);
    }

    /// Route a server function call from the client
    pub fn handle_call(&self, call: &ClientCall) -> Result<()> {
        let id = match call.notification_id() {
            Some(id) => id,
            None => {
                warn!(
                    "Session {}: {} called without a notification id",
                    self.session_id, call.function
                );
                return Err(Error::InvalidArguments {
                    function: call.function,
                    reason: "expected a notification id string as first argument".to_string(),
                });
            }
        };

        match call.function {
            ServerFunction::Click => self.on_click(id),
            ServerFunction::Error => self.on_error(id),
            ServerFunction::Close => self.on_close(id),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scope::Component;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn setup() -> (Session, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Session::new(tx, Duration::from_secs(60)), rx)
    }

    fn shown_id(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> String {
        match rx.try_recv().unwrap() {
            ServerMessage::Show { options, .. } => options.notification_id,
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_one_bridge_per_session() {
        let (session, _rx) = setup();
        let a = WebNotifications::for_session(&session);
        let b = WebNotifications::for_session(&session);
        assert!(Arc::ptr_eq(&a, &b));

        let (other, _rx2) = setup();
        assert!(!Arc::ptr_eq(&a, &WebNotifications::for_session(&other)));
    }

    #[test]
    fn test_create_without_current_session() {
        assert!(matches!(WebNotifications::create("x"), Err(Error::NoCurrentSession)));
    }

    #[test]
    fn test_create_in_current_session() {
        let (session, mut rx) = setup();
        {
            let _guard = session.enter();
            WebNotifications::create("Current").unwrap().show();
        }
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::Show { title, .. } if title == "Current"));
        assert!(session.extension::<WebNotifications>().is_some());
    }

    #[test]
    fn test_create_for_scope() {
        let (session, mut rx) = setup();
        let component = Component::new("button");
        assert!(matches!(
            WebNotifications::create_for(&component, "x"),
            Err(Error::NotAttached)
        ));

        component.attach(&session);
        WebNotifications::create_for(&component, "Scoped").unwrap().show();
        WebNotifications::create_for(&session, "Direct").unwrap().show();
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::Show { title, .. } if title == "Scoped"));
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::Show { title, .. } if title == "Direct"));
    }

    #[test]
    fn test_handle_call_routes() {
        let (session, mut rx) = setup();
        let bridge = WebNotifications::for_session(&session);
        let errors = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&errors);
        bridge
            .builder("E")
            .on_error(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .show();
        let id = shown_id(&mut rx);

        bridge.handle_call(&ClientCall::new(ServerFunction::Click, &id)).unwrap();
        assert_eq!(errors.load(Ordering::SeqCst), 0);
        // click consumed the entry
        bridge.handle_call(&ClientCall::new(ServerFunction::Error, &id)).unwrap();
        assert_eq!(errors.load(Ordering::SeqCst), 0);
        assert!(bridge.retainer.is_empty());
    }

    #[test]
    fn test_close_releases_callbacks() {
        let (session, mut rx) = setup();
        let bridge = WebNotifications::for_session(&session);
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicks);
        bridge
            .builder("C")
            .on_click(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .show();
        let id = shown_id(&mut rx);

        bridge.handle_call(&ClientCall::new(ServerFunction::Close, &id)).unwrap();
        bridge.handle_call(&ClientCall::new(ServerFunction::Click, &id)).unwrap();
        assert_eq!(clicks.load(Ordering::SeqCst), 0);
        assert!(bridge.registry().is_empty());
        assert!(bridge.retainer.is_empty());
        assert_eq!(Arc::strong_count(&clicks), 1);
    }

    #[test]
    fn test_handle_call_rejects_missing_id() {
        let (session, _rx) = setup();
        let bridge = WebNotifications::for_session(&session);
        let call = ClientCall {
            function: ServerFunction::Click,
            arguments: vec![serde_json::json!(17)],
        };
        assert!(matches!(
            bridge.handle_call(&call),
            Err(Error::InvalidArguments { function: ServerFunction::Click, .. })
        ));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let (session, _rx) = setup();
        let bridge = WebNotifications::for_session(&session);
        for function in [ServerFunction::Click, ServerFunction::Error, ServerFunction::Close] {
            bridge.handle_call(&ClientCall::new(function, "unknown")).unwrap();
        }
    }

    #[test]
    fn test_callback_can_show_follow_up() {
        let (session, mut rx) = setup();
        let bridge = WebNotifications::for_session(&session);
        bridge
            .builder("First")
            .on_click(|| {
                WebNotifications::create("Second").unwrap().show();
            })
            .show();
        let id = shown_id(&mut rx);

        let _guard = session.enter();
        bridge.on_click(&id);
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::Show { title, .. } if title == "Second"));
    }

    #[tokio::test]
    async fn test_unanswered_callbacks_expire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = Session::new(tx, Duration::from_millis(20));
        let bridge = WebNotifications::for_session(&session);
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicks);
        bridge
            .builder("Ignored")
            .on_click(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .show();
        let id = shown_id(&mut rx);
        assert!(bridge.registry().contains(&id));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(bridge.registry().is_empty());
        assert!(bridge.retainer.is_empty());
        assert_eq!(Arc::strong_count(&clicks), 1);

        bridge.on_click(&id);
        assert_eq!(clicks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let (session, mut rx) = setup();
        let bridge = WebNotifications::for_session(&session);
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicks);
        bridge
            .builder("Pending")
            .on_click(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .show();
        let id = shown_id(&mut rx);

        bridge.shutdown();
        assert!(bridge.registry().is_empty());
        assert!(bridge.retainer.is_empty());
        bridge.on_click(&id);
        assert_eq!(clicks.load(Ordering::SeqCst), 0);
        assert_eq!(Arc::strong_count(&clicks), 1);
    }

    #[test]
    fn test_callbacks_die_with_session() {
        let (session, mut rx) = setup();
        let bridge = WebNotifications::for_session(&session);
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicks);
        bridge
            .builder("Gone")
            .on_click(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .show();
        let _id = shown_id(&mut rx);

        drop(bridge);
        drop(session);
        assert_eq!(Arc::strong_count(&clicks), 1);
    }
}
