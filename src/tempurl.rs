//! Temporary URL signing.
//!
//! A temp URL grants unauthenticated access to one object until a Unix
//! timestamp.  The server recomputes the signature from the account's
//! `X-Account-Meta-Temp-URL-Key`, so the message layout must match
//! byte for byte:
//!
//! ```text
//! METHOD + '\n' +
//! Expires + '\n' +
//! Path
//! ```

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::http::request::form_encode;

type HmacSha1 = Hmac<Sha1>;

/// Build the message that gets signed.
pub fn string_to_sign(method: &str, expires: u64, path: &str) -> String {
    format!("{method}\n{expires}\n{path}")
}

/// Compute the lowercase hex HMAC-SHA1 signature for a temp URL.
pub fn sign(key: &str, method: &str, path: &str, expires: u64) -> String {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(string_to_sign(method, expires, path).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Build a signed GET link for `path` (`/v1/AUTH_x/container/object` style,
/// relative to the storage endpoint).
///
/// `filename`, when given, asks the server to send the object with that
/// download name.
pub fn temp_url(
    endpoint_url: &str,
    key: &str,
    path: &str,
    expires: u64,
    filename: Option<&str>,
) -> String {
    let base = endpoint_url.strip_suffix('/').unwrap_or(endpoint_url);
    let signature = sign(key, "GET", path, expires);
    let mut url = format!("{base}{path}?temp_url_sig={signature}&temp_url_expires={expires}");
    if let Some(name) = filename {
        url.push_str("&filename=");
        url.push_str(&form_encode(name));
    }
    url
}
