//! Response formats and decoding of listing-style bodies.

use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Listing format requested from the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Newline separated names.
    #[default]
    Plain,
    Json,
    Xml,
}

impl ResponseFormat {
    /// Value of the `format` query parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            ResponseFormat::Plain => "",
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
        }
    }

    /// Parse a textual format, falling back to `current` for anything
    /// other than `""`, `"json"` or `"xml"`.
    pub fn resolve(requested: &str, current: ResponseFormat) -> ResponseFormat {
        match requested {
            "" => ResponseFormat::Plain,
            "json" => ResponseFormat::Json,
            "xml" => ResponseFormat::Xml,
            _ => current,
        }
    }

    /// `Accept` header matching this format.
    pub fn accept(self) -> &'static str {
        match self {
            ResponseFormat::Plain => "text/plain",
            ResponseFormat::Json => "application/json",
            ResponseFormat::Xml => "application/xml",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Result of a container or object listing.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    /// Plain format: one entry per line.
    Names(Vec<String>),
    /// JSON or XML text, trimmed, exactly as the server sent it.
    Raw(String),
}

impl Listing {
    pub fn decode(body: &str, format: ResponseFormat) -> Self {
        match format {
            ResponseFormat::Plain => Listing::Names(split_lines(body)),
            _ => Listing::Raw(body.trim().to_string()),
        }
    }

    /// Names of a plain listing; `None` for JSON/XML.
    pub fn names(&self) -> Option<&[String]> {
        match self {
            Listing::Names(names) => Some(names),
            Listing::Raw(_) => None,
        }
    }
}

/// Response of an archive upload with server-side extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveReport {
    Lines(Vec<String>),
    Json(Value),
    Text(String),
}

impl ArchiveReport {
    /// Decode the server's report.  A JSON client that gets a body which
    /// is not JSON (an error page, say) receives it as [`ArchiveReport::Text`].
    pub fn decode(body: &str, format: ResponseFormat) -> Self {
        match format {
            ResponseFormat::Plain => ArchiveReport::Lines(split_lines(body)),
            ResponseFormat::Json => match serde_json::from_str(body.trim()) {
                Ok(value) => ArchiveReport::Json(value),
                Err(e) => {
                    debug!("archive report is not JSON: {}", e);
                    ArchiveReport::Text(body.trim().to_string())
                }
            },
            ResponseFormat::Xml => ArchiveReport::Text(body.trim().to_string()),
        }
    }
}

/// Metadata of a single object taken from a JSON listing.
#[derive(Debug, Clone, PartialEq)]
pub enum FileInfo {
    /// The decoded listing entry.
    Decoded(Value),
    /// The entry re-encoded as JSON text, for clients configured with `json`.
    Encoded(String),
}

/// Trim the body and split it on `\n`.  Entries keep their own spacing;
/// only a trailing `\r` is dropped.  An empty body has no entries.
fn split_lines(body: &str) -> Vec<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}
