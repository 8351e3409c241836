//! Container-scoped operations.
//!
//! A [`Container`] shares the token, format and reply policy of the
//! account it came from and keeps a snapshot of the container's `x-*`
//! headers.  The snapshot changes only through [`Container::refresh_info`].

use bytes::Bytes;
use http::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::SystemTime;
use tracing::debug;

use crate::account::DEFAULT_LIST_LIMIT;
use crate::client::Context;
use crate::errors::{Reply, Result, SwiftError};
use crate::format::{ArchiveReport, FileInfo, Listing, ResponseFormat};
use crate::http::{Body, RequestOutcome, TransportInfo};

/// Objects that accept metadata updates.
///
/// Only [`Container`] implements this; the account level exposes
/// [`StorageAccount::set_container_headers`](crate::StorageAccount::set_container_headers)
/// instead.
pub trait ObjectMetadata {
    /// POST the `X-Container-Meta-*` subset of `headers` to object `name`.
    fn set_file_headers<'a>(
        &'a self,
        name: &'a str,
        headers: &'a [(&'a str, &'a str)],
    ) -> Pin<Box<dyn Future<Output = Result<Reply<u16>>> + Send + 'a>>;
}

/// Conditional request headers for [`Container::get_file`].
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<SystemTime>,
    pub if_unmodified_since: Option<SystemTime>,
}

impl Conditions {
    pub fn if_match(mut self, etag: impl Into<String>) -> Self {
        self.if_match = Some(etag.into());
        self
    }

    pub fn if_none_match(mut self, etag: impl Into<String>) -> Self {
        self.if_none_match = Some(etag.into());
        self
    }

    pub fn if_modified_since(mut self, time: SystemTime) -> Self {
        self.if_modified_since = Some(time);
        self
    }

    pub fn if_unmodified_since(mut self, time: SystemTime) -> Self {
        self.if_unmodified_since = Some(time);
        self
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if let Some(etag) = &self.if_match {
            headers.push(("If-Match", etag.clone()));
        }
        if let Some(etag) = &self.if_none_match {
            headers.push(("If-None-Match", etag.clone()));
        }
        if let Some(time) = self.if_modified_since {
            headers.push(("If-Modified-Since", httpdate::fmt_http_date(time)));
        }
        if let Some(time) = self.if_unmodified_since {
            headers.push(("If-Unmodified-Since", httpdate::fmt_http_date(time)));
        }
        headers
    }
}

/// Parameters of an object listing.
#[derive(Debug, Clone)]
pub struct ListFiles<'a> {
    pub limit: u32,
    pub marker: Option<&'a str>,
    pub prefix: Option<&'a str>,
    pub path: Option<&'a str>,
    pub delimiter: Option<&'a str>,
    /// Listing format; the container's own when `None`.
    pub format: Option<ResponseFormat>,
}

impl Default for ListFiles<'_> {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            marker: None,
            prefix: None,
            path: None,
            delimiter: None,
            format: None,
        }
    }
}

/// A client bound to one container.
#[derive(Clone)]
pub struct Container {
    ctx: Context,
    url: String,
    info: BTreeMap<String, String>,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("url", &self.url)
            .field("info", &self.info)
            .finish()
    }
}

impl Container {
    /// Build a container client for `url`.  When `info` is empty the
    /// container headers are fetched right away.
    pub(crate) async fn open(
        ctx: Context,
        url: &str,
        info: BTreeMap<String, String>,
    ) -> Result<Reply<Self>> {
        let mut container = Self {
            ctx,
            url: format!("{url}/"),
            info,
        };
        if container.info.is_empty() {
            if let Reply::Status(code) = container.refresh_info().await? {
                return Ok(Reply::Status(code));
            }
        }
        Ok(Reply::Done(container))
    }

    /// Container URL, with a trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// Cached `x-*` headers.
    pub fn info(&self) -> &BTreeMap<String, String> {
        &self.info
    }

    /// Re-read the container headers and replace the cached snapshot.
    pub async fn refresh_info(&mut self) -> Result<Reply<&BTreeMap<String, String>>> {
        let (code, headers) = self.ctx.head_x(&self.url).await?;
        match self.ctx.policy.check(code, &[204], "container_info", || headers)? {
            Reply::Done(headers) => {
                self.info = headers;
                Ok(Reply::Done(&self.info))
            }
            Reply::Status(code) => Ok(Reply::Status(code)),
        }
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}{}", self.url, name)
    }

    /// Download an object.  The status is not checked, so a 304 or 412
    /// answer to `conditions` comes back as a normal outcome.
    pub async fn get_file(&self, name: &str, conditions: &Conditions) -> Result<RequestOutcome> {
        self.ctx
            .execute(
                self.ctx
                    .request(Method::GET, self.object_url(name))
                    .headers(conditions.headers()),
            )
            .await
    }

    /// List objects.  The status is not checked.
    pub async fn list_files(&self, params: &ListFiles<'_>) -> Result<Listing> {
        let format = self.ctx.format_or_default(params.format);
        let request = self
            .ctx
            .request(Method::GET, self.url.as_str())
            .param("limit", Some(params.limit))
            .param("marker", params.marker)
            .param("prefix", params.prefix)
            .param("path", params.path)
            .param("delimiter", params.delimiter);
        self.ctx.list(request, format).await
    }

    /// Listing entry of object `name` (name, hash, bytes, content type,
    /// last modified), looked up by prefix.  The status is not checked; a
    /// missing entry or a body that is not JSON yields `Null`.
    pub async fn file_info(&self, name: &str) -> Result<FileInfo> {
        let listing = self
            .list_files(&ListFiles {
                limit: 1,
                marker: Some(""),
                prefix: Some(name),
                format: Some(ResponseFormat::Json),
                ..Default::default()
            })
            .await?;
        let Listing::Raw(raw) = listing else {
            return Err(SwiftError::MalformedResponse(
                "json listing decoded as names".to_string(),
            ));
        };
        let entry = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries.into_iter().next().unwrap_or(Value::Null),
            Ok(other) => other,
            Err(e) => {
                debug!("listing for '{}' is not JSON: {}", name, e);
                Value::Null
            }
        };
        Ok(match self.ctx.format {
            ResponseFormat::Json => FileInfo::Encoded(serde_json::to_string(&entry)?),
            _ => FileInfo::Decoded(entry),
        })
    }

    /// Upload a local file.  The remote name defaults to the file name.
    pub async fn put_file(
        &self,
        local_path: impl AsRef<Path>,
        remote_name: Option<&str>,
        headers: &[(&str, &str)],
    ) -> Result<Reply<TransportInfo>> {
        let local_path = local_path.as_ref();
        let body = self.ctx.file_body(local_path).await?;
        let remote_name = match remote_name {
            Some(name) => name.to_string(),
            None => local_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    SwiftError::InvalidArgument(format!(
                        "cannot derive an object name from '{}'",
                        local_path.display()
                    ))
                })?,
        };
        let outcome = self
            .ctx
            .execute(
                self.ctx
                    .request(Method::PUT, self.object_url(&remote_name))
                    .headers(headers.iter().copied())
                    .body(body),
            )
            .await?;
        let code = outcome.code();
        self.ctx.policy.check(code, &[201], "put_file", || outcome.info)
    }

    /// Upload an in-memory buffer as object `remote_name`.
    pub async fn put_file_contents(
        &self,
        contents: impl Into<Bytes>,
        remote_name: Option<&str>,
    ) -> Result<Reply<TransportInfo>> {
        let remote_name = remote_name.filter(|n| !n.is_empty()).ok_or_else(|| {
            SwiftError::InvalidArgument("put_file_contents needs a remote name".to_string())
        })?;
        let outcome = self
            .ctx
            .execute(
                self.ctx
                    .request(Method::PUT, self.object_url(remote_name))
                    .body(Body::Bytes(contents.into())),
            )
            .await?;
        let code = outcome.code();
        self.ctx
            .policy
            .check(code, &[201], "put_file_contents", || outcome.info)
    }

    /// Create an empty `application/directory` marker object.  The status
    /// is not checked.
    pub async fn create_directory(&self, name: &str) -> Result<TransportInfo> {
        let outcome = self
            .ctx
            .execute(
                self.ctx
                    .request(Method::PUT, self.object_url(name))
                    .header("Content-Type", "application/directory"),
            )
            .await?;
        Ok(outcome.info)
    }

    /// Delete an object.
    pub async fn delete(&self, name: &str) -> Result<Reply<TransportInfo>> {
        self.ctx.delete(self.object_url(name)).await
    }

    /// Server-side copy of `origin` to `destination`, both relative to the
    /// container.  The status is not checked.
    pub async fn copy(&self, origin: &str, destination: &str) -> Result<RequestOutcome> {
        self.ctx.copy(&self.url, origin, destination).await
    }

    /// Upload an archive and let the server unpack it under
    /// `extract_path` inside this container.  The status is not checked.
    pub async fn put_archive(
        &self,
        archive: impl AsRef<Path>,
        extract_path: Option<&str>,
    ) -> Result<ArchiveReport> {
        self.ctx
            .put_archive(&self.url, archive.as_ref(), extract_path)
            .await
    }
}

impl ObjectMetadata for Container {
    fn set_file_headers<'a>(
        &'a self,
        name: &'a str,
        headers: &'a [(&'a str, &'a str)],
    ) -> Pin<Box<dyn Future<Output = Result<Reply<u16>>> + Send + 'a>> {
        Box::pin(self.ctx.post_container_meta(
            self.object_url(name),
            headers,
            &[202, 204],
            "set_file_headers",
        ))
    }
}
