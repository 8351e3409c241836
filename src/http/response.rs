//! Response envelope parsing.
//!
//! A transport returns the whole response as one buffer: status line,
//! header block, a blank line, then the body.  [`RequestOutcome::from_raw`]
//! splits it back into its three parts and pairs it with the out-of-band
//! [`TransportInfo`].

use bytes::Bytes;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::errors::{Result, SwiftError};

/// Boundary between the header block and the body.
const HEAD_DELIMITER: &[u8] = b"\r\n\r\n";

/// Transport-level facts about a finished request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportInfo {
    /// Final HTTP status code.
    pub http_code: u16,
    /// Effective URL of the request.
    pub url: String,
    /// Wall time from dispatch to the last body byte.
    pub total_time: Duration,
    /// Bytes sent in the request body.
    pub size_upload: u64,
    /// Bytes received in the response body.
    pub size_download: u64,
    pub content_type: Option<String>,
}

/// What a [`Transport`](super::transport::Transport) hands back.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Status line, headers, blank line and body in one buffer.
    pub envelope: Bytes,
    pub info: TransportInfo,
}

/// Parsed header block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseHead {
    /// Protocol version from the status line (`1.1`, `2`).
    pub version: String,
    /// Status code from the status line.
    pub code: u16,
    headers: BTreeMap<String, String>,
}

impl ResponseHead {
    /// Parse a header block.
    ///
    /// The first line must look like `HTTP/<version> <3-digit code>`.
    /// Every following `Name: value` line is stored under its lowercased
    /// name; a repeated name keeps the last value.
    pub fn parse(block: &str) -> Result<Self> {
        let mut lines = block.split("\r\n");
        let status_line = lines.next().unwrap_or_default();
        let (version, code) = parse_status_line(status_line).ok_or_else(|| {
            SwiftError::MalformedResponse(format!("bad status line '{status_line}'"))
        })?;

        let mut headers = BTreeMap::new();
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
                continue;
            }
            headers.insert(name.to_ascii_lowercase(), value.trim().to_string());
        }

        Ok(Self {
            version,
            code,
            headers,
        })
    }

    /// Header value by case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// All parsed headers, names lowercased.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Headers whose name starts with `x-`.
    pub fn x_headers(&self) -> BTreeMap<String, String> {
        filter_prefixed(
            self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            "x-",
        )
    }
}

/// Keep only the pairs whose name starts with `prefix`, ignoring case.
pub fn filter_prefixed<'a>(
    headers: impl IntoIterator<Item = (&'a str, &'a str)>,
    prefix: &str,
) -> BTreeMap<String, String> {
    headers
        .into_iter()
        .filter(|(name, _)| {
            name.len() >= prefix.len()
                && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
        })
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn parse_status_line(line: &str) -> Option<(String, u16)> {
    let rest = line.strip_prefix("HTTP/")?;
    let (version, tail) = rest.split_once(' ')?;
    if version.is_empty() {
        return None;
    }
    let digits = tail.get(..3)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if tail.len() > 3 && !tail[3..].starts_with(' ') {
        return None;
    }
    Some((version.to_string(), digits.parse().ok()?))
}

/// Split an envelope at the first blank line.
///
/// Everything after the first delimiter is body, including any further
/// delimiters that happen to occur inside it.  Without a delimiter the
/// whole envelope is the header block.
pub fn split_envelope(envelope: &[u8]) -> (&[u8], &[u8]) {
    match envelope
        .windows(HEAD_DELIMITER.len())
        .position(|w| w == HEAD_DELIMITER)
    {
        Some(pos) => (&envelope[..pos], &envelope[pos + HEAD_DELIMITER.len()..]),
        None => (envelope, &[]),
    }
}

/// Everything a single request produced.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub info: TransportInfo,
    pub head: ResponseHead,
    pub content: Bytes,
}

impl RequestOutcome {
    pub fn from_raw(raw: RawResponse) -> Result<Self> {
        let (head, body) = split_envelope(&raw.envelope);
        let head = ResponseHead::parse(&String::from_utf8_lossy(head))?;
        let content = raw.envelope.slice_ref(body);
        Ok(Self {
            info: raw.info,
            head,
            content,
        })
    }

    /// Status code as reported by the transport.
    pub fn code(&self) -> u16 {
        self.info.http_code
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}
