//! Single-shot HTTP request execution.
//!
//! [`execute`] is the one path every storage operation goes through:
//! apply the method rules to an [`HttpRequest`], hand it to a
//! [`Transport`], and decompose the returned envelope into a
//! [`RequestOutcome`].

#[cfg(test)]
pub(crate) mod mock;
pub mod request;
pub mod response;
pub mod transport;

use std::time::Instant;
use tracing::debug;

pub use request::{Body, HttpRequest, PreparedRequest};
pub use response::{RawResponse, RequestOutcome, ResponseHead, TransportInfo};
pub use transport::{ReqwestTransport, Transport};

use crate::errors::Result;
use crate::metrics;

/// Issue one request and parse its response.
pub async fn execute(transport: &dyn Transport, request: HttpRequest) -> Result<RequestOutcome> {
    let prepared = request.prepare();
    let method = prepared.method.to_string();
    let url = prepared.url.clone();

    let started = Instant::now();
    let raw = transport.send(prepared).await?;
    let elapsed = started.elapsed();

    debug!(
        "{} {} -> {} ({} ms)",
        method,
        url,
        raw.info.http_code,
        elapsed.as_millis()
    );
    metrics::record_request(&method, raw.info.http_code, elapsed);

    RequestOutcome::from_raw(raw)
}
