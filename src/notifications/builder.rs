//! Fluent builder for a single notification

use super::registry::{Callback, Callbacks, NotificationId};
use super::WebNotifications;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use web_notifications_protocol::{Direction, NotificationOptions, ServerMessage};

/// Text argument of the builder's string setters: a string, or an `Option` of one where
/// `None` means unset.
pub trait OptionalString {
    fn into_optional_string(self) -> Option<String>;
}

impl OptionalString for &str {
    fn into_optional_string(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl OptionalString for String {
    fn into_optional_string(self) -> Option<String> {
        Some(self)
    }
}

impl OptionalString for &String {
    fn into_optional_string(self) -> Option<String> {
        Some(self.clone())
    }
}

impl<T: Into<String>> OptionalString for Option<T> {
    fn into_optional_string(self) -> Option<String> {
        self.map(Into::into)
    }
}

/// Collects the attributes of a notification before [`show`](Self::show)ing it.
///
/// Obtained from [`WebNotifications::create`] or [`WebNotifications::create_for`]. Every
/// setter returns the builder so calls can be chained.
#[must_use = "the notification is only displayed once `show` is called"]
pub struct NotificationBuilder {
    bridge: Arc<WebNotifications>,
    notification_id: NotificationId,
    title: String,

    dir: Direction,
    lang: String,
    body: String,
    tag: String,
    image: Option<String>,
    icon: Option<String>,
    badge: Option<String>,
    sound: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    renotify: bool,
    silent: bool,
    require_interaction: bool,
    data: Option<String>,

    timeout: Option<u32>,
    close_on_click: bool,

    on_click: Option<Callback>,
    on_error: Option<Callback>,
}

impl NotificationBuilder {
    pub(crate) fn new(bridge: Arc<WebNotifications>, title: String) -> Self {
        Self {
            bridge,
            notification_id: NotificationId::new(),
            title,
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
            on_click: None,
            on_error: None,
        }
    }

    pub(crate) fn notification_id(&self) -> &NotificationId {
        &self.notification_id
    }

    /// Text direction; `None` restores `auto`
    pub fn dir(mut self, dir: impl Into<Option<Direction>>) -> Self {
        self.dir = dir.into().unwrap_or_default();
        self
    }

    pub fn lang(mut self, lang: impl OptionalString) -> Self {
        self.lang = lang.into_optional_string().unwrap_or_default();
        self
    }

    /// The notification's body
    pub fn body(mut self, body: impl OptionalString) -> Self {
        self.body = body.into_optional_string().unwrap_or_default();
        self
    }

    /// Notifications sharing the same non-empty tag replace each other instead of stacking up.
    /// An empty tag never replaces anything.
    pub fn tag(mut self, tag: impl OptionalString) -> Self {
        self.tag = tag.into_optional_string().unwrap_or_default();
        self
    }

    /// Picture shown as part of the notification's content, with higher visual priority than
    /// the icon and badge, though it may be displayed in fewer circumstances.
    ///
    /// Accepts plain URLs as well as `theme://` and `app://` URLs.
    pub fn image(mut self, image_url: impl OptionalString) -> Self {
        self.image = image_url.into_optional_string();
        self
    }

    /// Image reinforcing the notification, such as an icon or a photo of the sender.
    ///
    /// Accepts plain URLs as well as `theme://` and `app://` URLs.
    pub fn icon(mut self, icon_url: impl OptionalString) -> Self {
        self.icon = icon_url.into_optional_string();
        self
    }

    /// Icon representing the application or the category of the notification, used when there
    /// is not enough room to display the notification itself.
    ///
    /// Accepts plain URLs as well as `theme://` and `app://` URLs.
    pub fn badge(mut self, badge_url: impl OptionalString) -> Self {
        self.badge = badge_url.into_optional_string();
        self
    }

    pub fn sound(mut self, sound_url: impl OptionalString) -> Self {
        self.sound = sound_url.into_optional_string();
        self
    }

    pub fn timestamp(mut self, timestamp: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn renotify(mut self, renotify: impl Into<Option<bool>>) -> Self {
        self.renotify = renotify.into().unwrap_or(false);
        self
    }

    pub fn silent(mut self, silent: impl Into<Option<bool>>) -> Self {
        self.silent = silent.into().unwrap_or(false);
        self
    }

    pub fn require_interaction(mut self, require_interaction: impl Into<Option<bool>>) -> Self {
        self.require_interaction = require_interaction.into().unwrap_or(false);
        self
    }

    /// Arbitrary data attached to the notification
    pub fn data(mut self, data: impl OptionalString) -> Self {
        self.data = data.into_optional_string();
        self
    }

    /// Close the notification programmatically after `timeout` seconds.
    ///
    /// Browsers close notifications on their own after a while; this can only beat the
    /// browser to it, never extend its own timeout.
    pub fn timeout(mut self, timeout: impl Into<Option<u32>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Close the notification when clicked, for browsers that don't do so already
    pub fn close_on_click(mut self, close_on_click: bool) -> Self {
        self.close_on_click = close_on_click;
        self
    }

    /// Called when the notification is clicked
    pub fn on_click<F>(mut self, on_click: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_click = Some(Box::new(on_click));
        self
    }

    /// Called when the notification could not be shown
    pub fn on_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(on_error));
        self
    }

    /// Send the notification to the client.
    ///
    /// Callbacks, if any, are registered first. Nothing is awaited: permission negotiation
    /// and display happen asynchronously on the client, and failures only surface through the
    /// error callback.
    pub fn show(self) {
        let options = self.to_options();
        let Self {
            bridge,
            notification_id,
            title,
            on_click,
            on_error,
            ..
        } = self;

        if on_click.is_some() || on_error.is_some() {
            bridge.register(notification_id, Callbacks::new(on_click, on_error));
        }

        debug!("Showing notification {} ({:?})", options.notification_id, title);
        if let Err(e) = bridge.send(ServerMessage::Show { title, options }) {
            warn!("Failed to send notification to session {}: {}", bridge.session_id(), e);
        }
    }

    /// Options object handed to the client dispatcher
    pub(crate) fn to_options(&self) -> NotificationOptions {
        NotificationOptions {
            notification_id: self.notification_id.to_string(),
            dir: self.dir,
            lang: self.lang.clone(),
            body: self.body.clone(),
            tag: self.tag.clone(),
            image: self.image.clone(),
            icon: self.icon.clone(),
            badge: self.badge.clone(),
            sound: self.sound.clone(),
            timestamp: self.timestamp.map(|t| t.timestamp_millis()),
            renotify: self.renotify,
            silent: self.silent,
            require_interaction: self.require_interaction,
            data: self.data.clone(),
            timeout: self.timeout,
            close_on_click: self.close_on_click,
            has_on_click: self.on_click.is_some(),
            has_on_error: self.on_error.is_some(),
        }
    }
}
