//! The network seam.
//!
//! [`Transport`] is the only thing that touches the network.  The
//! production implementation wraps a `reqwest::Client`, which is cheap to
//! share between tasks; tests substitute a scripted transport.

use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::redirect::Policy;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::warn;

use super::request::{Body, PreparedRequest};
use super::response::{RawResponse, TransportInfo};
use crate::config::HttpConfig;
use crate::errors::Result;

/// Sends one prepared request and returns the raw response envelope.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: PreparedRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + '_>>;
}

/// `reqwest`-backed transport.
///
/// Always negotiates gzip/deflate and decompresses transparently, never
/// follows redirects, and verifies TLS certificates unless
/// `accept_invalid_certs` is set.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .gzip(true)
            .deflate(true);

        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        if config.accept_invalid_certs {
            warn!("INSECURE TLS MODE ENABLED: certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn dispatch(&self, request: PreparedRequest) -> Result<RawResponse> {
        let started = Instant::now();
        let size_upload = request.body.len();

        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Bytes(bytes) => builder.header(CONTENT_LENGTH, bytes.len()).body(bytes),
            Body::File { path, len } => {
                let file = tokio::fs::File::open(&path).await?;
                builder
                    .header(CONTENT_LENGTH, len)
                    .body(reqwest::Body::from(file))
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Rebuild the envelope: status line, headers, blank line, body.
        let mut envelope = Vec::with_capacity(512);
        envelope.extend_from_slice(
            format!(
                "{:?} {} {}\r\n",
                response.version(),
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .as_bytes(),
        );
        for (name, value) in response.headers() {
            envelope.extend_from_slice(name.as_str().as_bytes());
            envelope.extend_from_slice(b": ");
            envelope.extend_from_slice(value.as_bytes());
            envelope.extend_from_slice(b"\r\n");
        }
        envelope.extend_from_slice(b"\r\n");

        let body = response.bytes().await?;
        envelope.extend_from_slice(&body);

        Ok(RawResponse {
            envelope: Bytes::from(envelope),
            info: TransportInfo {
                http_code: status.as_u16(),
                url,
                total_time: started.elapsed(),
                size_upload,
                size_download: body.len() as u64,
                content_type,
            },
        })
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: PreparedRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + '_>> {
        Box::pin(self.dispatch(request))
    }
}
