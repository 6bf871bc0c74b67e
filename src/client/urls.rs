//! Resolution of application URL schemes into browser-loadable URLs

use std::borrow::Cow;

const THEME_SCHEME: &str = "theme://";
const APP_SCHEME: &str = "app://";

/// Rewrites `theme://` and `app://` URLs against configured bases.
/// Anything else passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlTranslator {
    theme_base: String,
    app_base: String,
}

impl UrlTranslator {
    pub fn new(theme_base: impl Into<String>, app_base: impl Into<String>) -> Self {
        Self {
            theme_base: theme_base.into(),
            app_base: app_base.into(),
        }
    }

    pub fn translate<'a>(&self, url: &'a str) -> Cow<'a, str> {
        if let Some(rest) = url.strip_prefix(THEME_SCHEME) {
            Cow::Owned(join(&self.theme_base, rest))
        } else if let Some(rest) = url.strip_prefix(APP_SCHEME) {
            Cow::Owned(join(&self.app_base, rest))
        } else {
            Cow::Borrowed(url)
        }
    }
}

fn join(base: &str, rest: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), rest.trim_start_matches('/'))
}
