//! State and request helpers shared by account and container clients.

use http::Method;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::errors::{Reply, ReplyPolicy, Result, SwiftError};
use crate::format::{ArchiveReport, Listing, ResponseFormat};
use crate::http::{execute, Body, HttpRequest, RequestOutcome, Transport, TransportInfo};
use crate::http::response::filter_prefixed;

/// Prefix of container metadata headers.
pub const CONTAINER_META_PREFIX: &str = "X-Container-Meta-";

/// Everything a client needs to issue authenticated requests.
#[derive(Clone)]
pub(crate) struct Context {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) endpoint_url: String,
    pub(crate) token: String,
    pub(crate) format: ResponseFormat,
    pub(crate) policy: ReplyPolicy,
}

impl Context {
    /// Start a request carrying the auth token.
    pub(crate) fn request(&self, method: Method, url: impl Into<String>) -> HttpRequest {
        HttpRequest::new(method, url).header("X-Auth-Token", self.token.as_str())
    }

    pub(crate) async fn execute(&self, request: HttpRequest) -> Result<RequestOutcome> {
        execute(self.transport.as_ref(), request).await
    }

    /// Requested format, or the client's own when none is given.
    pub(crate) fn format_or_default(&self, format: Option<ResponseFormat>) -> ResponseFormat {
        format.unwrap_or(self.format)
    }

    /// GET a listing and decode it.  The status is not checked.
    pub(crate) async fn list(&self, request: HttpRequest, format: ResponseFormat) -> Result<Listing> {
        let outcome = self
            .execute(request.param("format", Some(format.as_param())))
            .await?;
        Ok(Listing::decode(&outcome.text(), format))
    }

    /// HEAD `url` and return the status with the `x-*` headers.
    pub(crate) async fn head_x(&self, url: &str) -> Result<(u16, BTreeMap<String, String>)> {
        let outcome = self.execute(self.request(Method::HEAD, url)).await?;
        Ok((outcome.head.code, outcome.head.x_headers()))
    }

    /// DELETE the container or object at `url`.
    pub(crate) async fn delete(&self, url: String) -> Result<Reply<TransportInfo>> {
        let outcome = self.execute(self.request(Method::DELETE, url)).await?;
        let code = outcome.code();
        self.policy.check(code, &[204], "delete", || outcome.info)
    }

    /// Server-side copy of `base_url + origin` to `path(base_url) + destination`.
    /// The status is not checked.
    pub(crate) async fn copy(
        &self,
        base_url: &str,
        origin: &str,
        destination: &str,
    ) -> Result<RequestOutcome> {
        let base = reqwest::Url::parse(base_url).map_err(|_| SwiftError::InvalidUrl {
            url: base_url.to_string(),
        })?;
        let target = format!("{}{}", base.path(), destination);
        let copy = Method::from_bytes(b"COPY")
            .map_err(|e| SwiftError::InvalidArgument(e.to_string()))?;
        self.execute(
            self.request(copy, format!("{base_url}{origin}"))
                .header("Destination", target),
        )
        .await
    }

    /// POST the `X-Container-Meta-*` subset of `headers` to `url`.
    pub(crate) async fn post_container_meta(
        &self,
        url: String,
        headers: &[(&str, &str)],
        expected: &[u16],
        operation: &'static str,
    ) -> Result<Reply<u16>> {
        let meta = filter_prefixed(headers.iter().copied(), CONTAINER_META_PREFIX);
        let outcome = self
            .execute(self.request(Method::POST, url).headers(meta))
            .await?;
        let code = outcome.code();
        self.policy.check(code, expected, operation, || code)
    }

    /// Describe a local file for upload, failing before any request when
    /// it does not exist.
    pub(crate) async fn file_body(&self, path: &Path) -> Result<Body> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => Ok(Body::File {
                path: path.to_path_buf(),
                len: meta.len(),
            }),
            Ok(_) => Err(SwiftError::NotFound {
                path: path.display().to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SwiftError::NotFound {
                path: path.display().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Upload an archive for server-side extraction under
    /// `base_url + extract_path`.  The status is not checked; the
    /// server's report is decoded according to the client's format.
    pub(crate) async fn put_archive(
        &self,
        base_url: &str,
        archive: &Path,
        extract_path: Option<&str>,
    ) -> Result<ArchiveReport> {
        let body = self.file_body(archive).await?;
        let extension = archive
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let url = format!(
            "{}{}?extract-archive={}",
            base_url,
            extract_path.unwrap_or_default(),
            extension
        );
        let outcome = self
            .execute(
                self.request(Method::PUT, url)
                    .header("Accept", self.format.accept())
                    .body(body),
            )
            .await?;
        Ok(ArchiveReport::decode(&outcome.text(), self.format))
    }
}
