//! Client-side notification dispatcher
//!
//! Runs next to the UI in the browser (or any other single-threaded client) and turns the
//! server's `show` messages into calls on a notify.js-style [`NotifyLibrary`]: resource URLs
//! are resolved, event hooks call back into the server, and permission is requested when the
//! library needs it. The JavaScript connector served at `/connector.js` does the same for
//! plain browsers.

pub mod urls;

pub use urls::UrlTranslator;

use crate::core::error::Result;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;
use web_notifications_protocol::{
    ClientCall, Direction, NotificationOptions, ServerFunction, ServerMessage,
};

/// Event hook handed to the notification library
pub type Hook = Box<dyn Fn()>;

/// Options in the shape the notification library consumes
#[derive(Default)]
pub struct DisplayOptions {
    pub dir: Direction,
    pub lang: String,
    pub body: String,
    pub tag: String,
    pub image: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub sound: Option<String>,
    pub timestamp: Option<i64>,
    pub renotify: bool,
    pub silent: bool,
    pub require_interaction: bool,
    pub data: Option<String>,
    /// Seconds until the library closes the notification itself
    pub timeout: Option<u32>,
    pub close_on_click: bool,
    pub notify_click: Option<Hook>,
    pub notify_error: Option<Hook>,
    pub notify_close: Option<Hook>,
}

/// A notification created by the library, not yet displayed
pub trait NotifyHandle {
    fn show(&self);
}

/// The notification display library (notify.js contract)
pub trait NotifyLibrary {
    /// Whether permission must be requested before showing anything
    fn needs_permission(&self) -> bool;

    fn is_supported(&self) -> bool;

    /// Ask the user for permission; at most one of the continuations runs, possibly never
    fn request_permission(&self, on_granted: Box<dyn FnOnce()>, on_denied: Box<dyn FnOnce()>);

    fn create(&self, title: &str, options: DisplayOptions) -> Box<dyn NotifyHandle>;
}

/// Channel for calling server functions
pub trait ServerConnection {
    fn call(&self, call: ClientCall);
}

/// Dispatches server messages to a notification library
pub struct ClientDispatcher<L: NotifyLibrary + 'static> {
    library: Rc<L>,
    server: Rc<dyn ServerConnection>,
    urls: RefCell<UrlTranslator>,
}

impl<L: NotifyLibrary + 'static> ClientDispatcher<L> {
    pub fn new(library: L, server: Rc<dyn ServerConnection>) -> Self {
        Self {
            library: Rc::new(library),
            server,
            urls: RefCell::new(UrlTranslator::default()),
        }
    }

    /// Handle one JSON text frame from the server
    pub fn handle_text(&self, text: &str) -> Result<()> {
        let message: ServerMessage = serde_json::from_str(text)?;
        self.handle_message(message);
        Ok(())
    }

    pub fn handle_message(&self, message: ServerMessage) {
        match message {
            ServerMessage::Hello { theme_base, app_base } => {
                *self.urls.borrow_mut() = UrlTranslator::new(theme_base, app_base);
            }
            ServerMessage::Show { title, options } => self.show(&title, options),
        }
    }

    /// Show a notification, requesting permission first if the library needs it.
    ///
    /// Denied or unanswered permission requests and unsupported environments end here
    /// without any report to the server.
    pub fn show(&self, title: &str, options: NotificationOptions) {
        let display = self.display_options(options);

        if !self.library.needs_permission() {
            self.library.create(title, display).show();
        } else if self.library.is_supported() {
            let library = Rc::clone(&self.library);
            let title = title.to_string();
            self.library.request_permission(
                Box::new(move || library.create(&title, display).show()),
                Box::new(|| debug!("Notification permission denied")),
            );
        } else {
            debug!("Notifications are not supported here");
        }
    }

    fn display_options(&self, options: NotificationOptions) -> DisplayOptions {
        let urls = self.urls.borrow();
        let translate = |url: Option<String>| url.map(|u| urls.translate(&u).into_owned());
        let id = options.notification_id;

        DisplayOptions {
            dir: options.dir,
            lang: options.lang,
            body: options.body,
            tag: options.tag,
            image: translate(options.image),
            icon: translate(options.icon),
            badge: translate(options.badge),
            sound: translate(options.sound),
            timestamp: options.timestamp,
            renotify: options.renotify,
            silent: options.silent,
            require_interaction: options.require_interaction,
            data: options.data,
            timeout: options.timeout,
            close_on_click: options.close_on_click,
            notify_click: options.has_on_click.then(|| self.hook(ServerFunction::Click, &id)),
            notify_error: options.has_on_error.then(|| self.hook(ServerFunction::Error, &id)),
            notify_close: Some(self.hook(ServerFunction::Close, &id)),
        }
    }

    fn hook(&self, function: ServerFunction, id: &str) -> Hook {
        let server = Rc::clone(&self.server);
        let call = ClientCall::new(function, id);
        Box::new(move || server.call(call.clone()))
    }
}
