//! Cookie jar holding the backend session
//!
//! A terminal has no browser cookie store, so the client keeps the cookies the
//! backend sets and replays them on every request and socket handshake.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the cookie carrying the session.
pub const SESSION_COOKIE: &str = "id";

/// Name -> value cookie store, persisted as a TOML table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Whether the session cookie is present. Nothing else is checked.
    pub fn has_session(&self) -> bool {
        self.get(SESSION_COOKIE).is_some()
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Apply one `Set-Cookie` header value. Returns true if the jar changed.
    ///
    /// An empty value or `Max-Age=0` removes the cookie.
    pub fn absorb_set_cookie(&mut self, header: &str) -> bool {
        let mut parts = header.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            tracing::debug!("Ignoring malformed Set-Cookie: {}", header);
            return false;
        };
        let name = name.trim();
        let value = value.trim().trim_matches('"');
        if name.is_empty() {
            return false;
        }

        let expired = parts.any(|attr| {
            attr.split_once('=').is_some_and(|(key, val)| {
                key.trim().eq_ignore_ascii_case("max-age") && val.trim().starts_with(['0', '-'])
            })
        });

        if value.is_empty() || expired {
            return self.cookies.remove(name).is_some();
        }

        self.cookies.insert(name.to_string(), value.to_string()) != Some(value.to_string())
    }

    /// Value for a `Cookie` request header, or None when empty.
    pub fn header_value(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
