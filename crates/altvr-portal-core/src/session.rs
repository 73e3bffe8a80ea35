//! Authenticated session cookies
//!
//! A [`Session`] is the cookie jar filled from a successful sign-in. It is
//! an explicit value: the crawler owns it and passes it by reference into
//! every request that needs it. The jar applies the usual domain, path
//! and expiry rules, so a session never yields a `Cookie` header for
//! another host.

use std::fmt;
use std::sync::Arc;

use ::url::Url;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;

/// Cookies handed out by the sign-in endpoint
///
/// Cloning is cheap and shares the underlying jar. Two sessions compare
/// equal only when they share the same jar, so a cached session can be
/// told apart from one created by a later sign-in.
#[derive(Clone)]
pub struct Session {
    jar: Arc<Jar>,
}

impl Session {
    /// Builds a session from raw `Set-Cookie` header values received from `url`
    ///
    /// A later cookie replaces an earlier one of the same name, and
    /// expired cookies (deletions) remove it.
    ///
    /// # Returns
    /// `None` when the jar holds no cookie that would be sent back to `url`
    pub fn from_set_cookie<'a, I>(values: I, url: &Url) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let session = Self {
            jar: Arc::new(Jar::default()),
        };
        session.absorb(values, url);

        if session.cookie_header(url).is_some() {
            Some(session)
        } else {
            None
        }
    }

    /// Stores further `Set-Cookie` values received from `url`
    pub fn absorb<'a, I>(&self, values: I, url: &Url)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for value in values {
            self.jar.add_cookie_str(value, url);
        }
    }

    /// Value for the `Cookie` header of a request to `url`
    ///
    /// `None` when no stored cookie matches the URL.
    pub fn cookie_header(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.cookies(url)
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.jar, &other.jar)
    }
}

impl Eq for Session {}

// Cookie values are bearer secrets and stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}
