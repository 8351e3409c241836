//! Outgoing request values.
//!
//! An [`HttpRequest`] is built fresh for every call and consumed by
//! [`HttpRequest::prepare`], which applies the per-method rules for query
//! parameters and bodies.  Nothing survives from one request to the next.

use bytes::Bytes;
use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::PathBuf;

/// Characters left untouched by form encoding (alphanumerics plus `-_.`).
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Encode a value the way `application/x-www-form-urlencoded` does:
/// spaces become `+`, everything outside `[A-Za-z0-9-_.]` is percent-encoded.
pub fn form_encode(input: &str) -> String {
    utf8_percent_encode(input, FORM_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}

/// Serialize parameters as `key=value&...`.  Empty values still emit `key=`.
pub fn build_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    /// In-memory buffer; its length is the content length.
    Bytes(Bytes),
    /// Local file streamed from disk with a known exact length.
    File { path: PathBuf, len: u64 },
}

impl Body {
    /// Number of bytes that will be uploaded.
    pub fn len(&self) -> u64 {
        match self {
            Body::Empty => 0,
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A request before method-specific rules are applied.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a query parameter.  `None` leaves it out; an empty value is
    /// still sent as `name=`.
    pub fn param(mut self, name: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.query.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Apply the method rules and produce the request as it goes on the wire.
    ///
    /// - `GET`/`HEAD`: parameters are appended to the URL.
    /// - `POST`: parameters become a form-encoded body.
    /// - `PUT`: the caller's body is sent as-is; an empty body is sent with
    ///   a zero length.
    /// - anything else is passed through verbatim.
    pub fn prepare(self) -> PreparedRequest {
        let HttpRequest {
            method,
            mut url,
            mut headers,
            query,
            mut body,
        } = self;

        match method.as_str() {
            "GET" | "HEAD" => {
                if !query.is_empty() {
                    url.push(if url.contains('?') { '&' } else { '?' });
                    url.push_str(&build_query(&query));
                }
            }
            "POST" => {
                if !query.is_empty() {
                    headers.push((
                        "Content-Type".to_string(),
                        "application/x-www-form-urlencoded".to_string(),
                    ));
                    body = Body::Bytes(Bytes::from(build_query(&query)));
                }
            }
            "PUT" => {
                if body == Body::Empty {
                    body = Body::Bytes(Bytes::new());
                }
            }
            other => {
                if !query.is_empty() {
                    tracing::debug!("ignoring {} query parameters on {}", query.len(), other);
                }
            }
        }

        PreparedRequest {
            method,
            url,
            headers,
            body,
        }
    }
}

/// A request ready to be handed to a [`Transport`](super::transport::Transport).
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl PreparedRequest {
    /// Case-insensitive header lookup (first match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
