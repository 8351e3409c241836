//! Client error types and the status reply policy.
//!
//! Every failure a caller can observe is a [`SwiftError`] variant.  Whether
//! an unexpected HTTP status becomes an error or a plain [`Reply::Status`]
//! value is decided by the [`ReplyPolicy`] the client was built with.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the storage client.
#[derive(Debug, Error)]
pub enum SwiftError {
    /// The auth endpoint answered with something other than 204.
    #[error("authentication failed with HTTP {code}: {detail}")]
    Authentication { code: u16, detail: String },

    /// The auth endpoint answered 403 for these credentials.
    #[error("Forbidden for user '{user}'")]
    Forbidden { user: String },

    /// An operation observed a status code outside its success set.
    #[error("{operation}: unexpected HTTP status {code}")]
    UnexpectedStatus { code: u16, operation: &'static str },

    /// A local file handed to an upload does not exist.
    #[error("File '{path}' does not exist")]
    NotFound { path: String },

    /// The response envelope could not be decomposed.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A caller-supplied argument cannot be turned into a request.
    #[error("{0}")]
    InvalidArgument(String),

    /// The storage or auth URL cannot be parsed.
    #[error("invalid url '{url}'")]
    InvalidUrl { url: String },

    /// The configuration file is missing required values.
    #[error("configuration error: {0}")]
    Config(String),

    /// The transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SwiftError {
    /// The HTTP status carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SwiftError::Authentication { code, .. } => Some(*code),
            SwiftError::Forbidden { .. } => Some(403),
            SwiftError::UnexpectedStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SwiftError>;

/// How status-checked operations report an unexpected HTTP status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyPolicy {
    /// Return `Err(SwiftError::UnexpectedStatus { .. })` (or the auth variants).
    #[default]
    Fail,
    /// Return `Ok(Reply::Status(code))`.
    ReturnCode,
}

impl ReplyPolicy {
    /// Resolve an unexpected `code` into either an error or a status reply.
    pub(crate) fn reject<T>(self, code: u16, error: SwiftError) -> Result<Reply<T>> {
        match self {
            ReplyPolicy::Fail => Err(error),
            ReplyPolicy::ReturnCode => Ok(Reply::Status(code)),
        }
    }

    /// Check `code` against the operation's success set.
    pub(crate) fn check<T>(
        self,
        code: u16,
        expected: &[u16],
        operation: &'static str,
        value: impl FnOnce() -> T,
    ) -> Result<Reply<T>> {
        if expected.contains(&code) {
            return Ok(Reply::Done(value()));
        }
        self.reject(code, SwiftError::UnexpectedStatus { code, operation })
    }
}

/// Result of a status-checked operation.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Reply<T> {
    /// The server answered with one of the operation's success codes.
    Done(T),
    /// The server answered with this code and the policy is `ReturnCode`.
    Status(u16),
}

impl<T> Reply<T> {
    /// The successful value, discarding a status reply.
    pub fn done(self) -> Option<T> {
        match self {
            Reply::Done(value) => Some(value),
            Reply::Status(_) => None,
        }
    }

    /// The returned status code, if the operation did not succeed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Reply::Done(_) => None,
            Reply::Status(code) => Some(*code),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Reply::Done(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        match self {
            Reply::Done(value) => Reply::Done(f(value)),
            Reply::Status(code) => Reply::Status(code),
        }
    }

    /// Turn a status reply back into an `UnexpectedStatus` error.
    pub fn into_result(self, operation: &'static str) -> Result<T> {
        match self {
            Reply::Done(value) => Ok(value),
            Reply::Status(code) => Err(SwiftError::UnexpectedStatus { code, operation }),
        }
    }
}
