//! Account authentication.
//!
//! One `GET` to the auth endpoint trades an account user and key for the
//! storage URL and a token.  The token is never refreshed: once it stops
//! working every call keeps failing until a new session is created.

use http::Method;
use std::fmt;
use tracing::info;

use crate::errors::{Reply, ReplyPolicy, Result, SwiftError};
use crate::format::ResponseFormat;
use crate::http::{execute, HttpRequest, Transport};

/// Account user and key.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub key: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            key: key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// An authenticated storage session.
#[derive(Clone, PartialEq)]
pub struct Session {
    /// Storage root, e.g. `https://12345.selcdn.ru/`.
    pub endpoint_url: String,
    /// Value for the `X-Auth-Token` header.
    pub auth_token: String,
    /// Default listing format.
    pub format: ResponseFormat,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint_url", &self.endpoint_url)
            .field("auth_token", &"<redacted>")
            .field("format", &self.format)
            .finish()
    }
}

/// Host component of `url`, used for the explicit `Host` header.
fn host_of(url: &str) -> Result<String> {
    let parsed = reqwest::Url::parse(url).map_err(|_| SwiftError::InvalidUrl {
        url: url.to_string(),
    })?;
    let host = parsed.host_str().ok_or_else(|| SwiftError::InvalidUrl {
        url: url.to_string(),
    })?;
    Ok(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Authenticate against `auth_url`.
///
/// Success is exactly HTTP 204 carrying `x-storage-url` and
/// `x-storage-token`.  A 403 is reported as [`SwiftError::Forbidden`], any
/// other code as [`SwiftError::Authentication`], or as
/// [`Reply::Status`] under [`ReplyPolicy::ReturnCode`].
pub async fn authenticate(
    transport: &dyn Transport,
    auth_url: &str,
    credentials: &Credentials,
    format: ResponseFormat,
    policy: ReplyPolicy,
) -> Result<Reply<Session>> {
    let request = HttpRequest::new(Method::GET, auth_url)
        .header("Host", host_of(auth_url)?)
        .header("X-Auth-User", credentials.user.as_str())
        .header("X-Auth-Key", credentials.key.as_str());

    let outcome = execute(transport, request).await?;
    let code = outcome.head.code;

    if code != 204 {
        let error = if code == 403 {
            SwiftError::Forbidden {
                user: credentials.user.clone(),
            }
        } else {
            SwiftError::Authentication {
                code,
                detail: outcome.text().trim().to_string(),
            }
        };
        return policy.reject(code, error);
    }

    let endpoint_url = outcome.head.get("x-storage-url").ok_or_else(|| {
        SwiftError::MalformedResponse("auth response without x-storage-url".to_string())
    })?;
    let auth_token = outcome.head.get("x-storage-token").ok_or_else(|| {
        SwiftError::MalformedResponse("auth response without x-storage-token".to_string())
    })?;

    info!("Authenticated user {} at {}", credentials.user, endpoint_url);

    Ok(Reply::Done(Session {
        endpoint_url: endpoint_url.to_string(),
        auth_token: auth_token.to_string(),
        format,
    }))
}
