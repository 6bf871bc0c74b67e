//! End-to-end flow: builder → session channel → client dispatcher → server callbacks

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use web_notifications::client::{
    ClientDispatcher, DisplayOptions, NotifyHandle, NotifyLibrary, ServerConnection,
};
use web_notifications::{Component, Session, WebNotifications};
use web_notifications_protocol::{ClientCall, ServerMessage};

type Shown = Rc<RefCell<Vec<(String, DisplayOptions)>>>;

/// Library that needs permission and always gets it
struct GrantingLibrary {
    shown: Shown,
}

struct Handle {
    title: String,
    options: RefCell<Option<DisplayOptions>>,
    shown: Shown,
}

impl NotifyHandle for Handle {
    fn show(&self) {
        if let Some(options) = self.options.borrow_mut().take() {
            self.shown.borrow_mut().push((self.title.clone(), options));
        }
    }
}

impl NotifyLibrary for GrantingLibrary {
    fn needs_permission(&self) -> bool {
        true
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn request_permission(&self, on_granted: Box<dyn FnOnce()>, _on_denied: Box<dyn FnOnce()>) {
        on_granted();
    }

    fn create(&self, title: &str, options: DisplayOptions) -> Box<dyn NotifyHandle> {
        Box::new(Handle {
            title: title.to_string(),
            options: RefCell::new(Some(options)),
            shown: Rc::clone(&self.shown),
        })
    }
}

#[derive(Default)]
struct Outbox {
    calls: RefCell<Vec<ClientCall>>,
}

impl ServerConnection for Outbox {
    fn call(&self, call: ClientCall) {
        self.calls.borrow_mut().push(call);
    }
}

struct Harness {
    session: Session,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    dispatcher: ClientDispatcher<GrantingLibrary>,
    outbox: Rc<Outbox>,
    shown: Shown,
}

impl Harness {
    fn new() -> Self {
        let (tx, server_rx) = mpsc::unbounded_channel();
        let session = Session::new(tx, Duration::from_secs(60));
        session
            .send(ServerMessage::Hello {
                theme_base: "https://cdn.example.com/themes/valo".to_string(),
                app_base: "/app".to_string(),
            })
            .unwrap();

        let shown: Shown = Rc::default();
        let outbox = Rc::new(Outbox::default());
        let dispatcher = ClientDispatcher::new(
            GrantingLibrary { shown: Rc::clone(&shown) },
            Rc::clone(&outbox) as Rc<dyn ServerConnection>,
        );
        Self { session, server_rx, dispatcher, outbox, shown }
    }

    /// Deliver everything the server sent to the client
    fn pump_to_client(&mut self) {
        while let Ok(message) = self.server_rx.try_recv() {
            self.dispatcher.handle_message(message);
        }
    }

    /// Deliver everything the client called back to the server
    fn pump_to_server(&self) {
        let bridge = WebNotifications::for_session(&self.session);
        let _guard = self.session.enter();
        for call in self.outbox.calls.borrow_mut().drain(..) {
            bridge.handle_call(&call).unwrap();
        }
    }
}

#[test]
fn test_click_round_trip() {
    let mut h = Harness::new();
    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&clicks);

    {
        let _guard = h.session.enter();
        WebNotifications::create("Build finished")
            .unwrap()
            .body("All green")
            .icon("theme://img/logo.png")
            .on_click(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .show();
    }
    h.pump_to_client();

    {
        let shown = h.shown.borrow();
        assert_eq!(shown.len(), 1);
        let (title, display) = &shown[0];
        assert_eq!(title, "Build finished");
        assert_eq!(display.body, "All green");
        assert_eq!(
            display.icon.as_deref(),
            Some("https://cdn.example.com/themes/valo/img/logo.png")
        );
        assert!(display.notify_error.is_none());

        // Browser reports a click, then the close that follows it
        display.notify_click.as_ref().unwrap()();
        display.notify_close.as_ref().unwrap()();
    }
    h.pump_to_server();

    assert_eq!(clicks.load(Ordering::SeqCst), 1);
    assert!(WebNotifications::for_session(&h.session).registry().is_empty());
}

#[test]
fn test_error_round_trip_from_component() {
    let mut h = Harness::new();
    let errors = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&errors);
    let component = Component::new("status-bar");
    component.attach(&h.session);

    WebNotifications::create_for(&component, "Sync failed")
        .unwrap()
        .icon("https://example.com/warn.png")
        .on_error(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .show();
    h.pump_to_client();

    {
        let shown = h.shown.borrow();
        let display = &shown[0].1;
        assert_eq!(display.icon.as_deref(), Some("https://example.com/warn.png"));
        assert!(display.notify_click.is_none());
        display.notify_error.as_ref().unwrap()();
        display.notify_error.as_ref().unwrap()();
    }
    h.pump_to_server();

    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[test]
fn test_notification_without_callbacks_still_cleans_up() {
    let mut h = Harness::new();
    WebNotifications::create_for(&h.session, "Hello")
        .unwrap()
        .body("World")
        .tag("t1")
        .show();
    assert!(WebNotifications::for_session(&h.session).registry().is_empty());
    h.pump_to_client();

    {
        let shown = h.shown.borrow();
        let display = &shown[0].1;
        assert_eq!(display.tag, "t1");
        display.notify_close.as_ref().unwrap()();
    }
    h.pump_to_server();
    assert_eq!(h.outbox.calls.borrow().len(), 0);
}

#[test]
fn test_expired_session_drops_callbacks() {
    let mut h = Harness::new();
    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&clicks);
    WebNotifications::create_for(&h.session, "Late")
        .unwrap()
        .on_click(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .show();
    h.pump_to_client();

    // The session goes away before the user clicks
    let component = Component::new("late");
    component.attach(&h.session);
    let Harness { session, shown, .. } = h;
    drop(session);
    assert!(!component.is_attached());

    let shown = shown.borrow();
    shown[0].1.notify_click.as_ref().unwrap()();
    assert_eq!(clicks.load(Ordering::SeqCst), 0);
    assert_eq!(Arc::strong_count(&clicks), 1);
}
