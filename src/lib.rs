//! swiftstore library: a client for Swift-compatible object storage.
//!
//! The crate authenticates once against the auth endpoint, then issues
//! account and container requests with the returned token.  Every request
//! goes through [`http::execute`] over a pluggable [`http::Transport`];
//! [`http::ReqwestTransport`] is the production implementation.
//!
//! Status handling follows the [`ReplyPolicy`] chosen at construction:
//! unexpected codes either fail with [`SwiftError`] or come back as
//! [`Reply::Status`].

pub mod account;
pub mod auth;
mod client;
pub mod config;
pub mod container;
pub mod errors;
pub mod format;
pub mod http;
pub mod metrics;
pub mod tempurl;

pub use account::{StorageAccount, DEFAULT_LIST_LIMIT};
pub use auth::{Credentials, Session};
pub use client::CONTAINER_META_PREFIX;
pub use container::{Conditions, Container, ListFiles, ObjectMetadata};
pub use errors::{Reply, ReplyPolicy, Result, SwiftError};
pub use format::{ArchiveReport, FileInfo, Listing, ResponseFormat};
