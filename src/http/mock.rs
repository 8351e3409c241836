//! Scripted transport for unit tests.

use bytes::Bytes;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use super::request::PreparedRequest;
use super::response::{RawResponse, TransportInfo};
use super::transport::Transport;
use crate::errors::Result;

/// Replays queued envelopes in order and records every request it sees.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<RawResponse>>,
    requests: Mutex<Vec<PreparedRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response with the given status, headers and body.
    pub(crate) fn respond(&self, code: u16, headers: &[(&str, &str)], body: &str) {
        let mut envelope = format!("HTTP/1.1 {code} Mock\r\n");
        for (name, value) in headers {
            envelope.push_str(&format!("{name}: {value}\r\n"));
        }
        envelope.push_str("\r\n");
        envelope.push_str(body);
        self.respond_raw(code, envelope);
    }

    /// Queue an arbitrary envelope.
    pub(crate) fn respond_raw(&self, code: u16, envelope: impl Into<String>) {
        let envelope = Bytes::from(envelope.into());
        let info = TransportInfo {
            http_code: code,
            size_download: envelope.len() as u64,
            ..Default::default()
        };
        self.responses
            .lock()
            .expect("responses mutex poisoned")
            .push_back(RawResponse { envelope, info });
    }

    pub(crate) fn requests(&self) -> Vec<PreparedRequest> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }

    pub(crate) fn last_request(&self) -> PreparedRequest {
        self.requests()
            .pop()
            .expect("no request has been recorded")
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        request: PreparedRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + '_>> {
        Box::pin(async move {
            let mut raw = self
                .responses
                .lock()
                .expect("responses mutex poisoned")
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected request: {} {}", request.method, request.url));
            raw.info.url = request.url.clone();
            raw.info.size_upload = request.body.len();
            self.requests
                .lock()
                .expect("requests mutex poisoned")
                .push(request);
            Ok(raw)
        })
    }
}
