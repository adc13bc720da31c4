//! Session credentials issued by the upstream login endpoint.

use reqwest::header::COOKIE;
use reqwest::RequestBuilder;
use std::collections::BTreeMap;
use url::Url;

/// Cookies returned by one successful login, scoped to the host that issued
/// them.
///
/// Only [`UpstreamAccountingClient::authenticate`] creates these, so holding
/// one proves a login happened for the current request. The values are
/// never printed.
///
/// [`UpstreamAccountingClient::authenticate`]: crate::upstream::UpstreamAccountingClient::authenticate
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    host: String,
    cookies: BTreeMap<String, String>,
}

impl SessionCredentials {
    pub(crate) fn new<I>(host: impl Into<String>, cookies: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            host: host.into(),
            cookies: cookies.into_iter().collect(),
        }
    }

    /// Attach the session cookies to `request` when `target` is on the
    /// issuing host. Requests to any other host go out untouched.
    pub fn apply(&self, request: RequestBuilder, target: &Url) -> RequestBuilder {
        if self.cookies.is_empty() || target.host_str() != Some(self.host.as_str()) {
            return request;
        }
        request.header(COOKIE, self.cookie_header())
    }

    /// Value of a single cookie.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Host the cookies are valid for.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("host", &self.host)
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .finish()
    }
}
