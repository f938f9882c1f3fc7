//! Request-target helpers.
//!
//! The traversal guard here is textual: it rejects the literal `/../`
//! segment and a trailing `/..`, nothing more. Callers that percent-decode a
//! path run the guard again on the decoded form.

use thiserror::Error;

/// Query parameter that switches a request from static-file mode to
/// datastore-record mode.
pub const RECORD_KEY: &str = "key";

/// Errors produced while percent-decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A `%` was followed by something other than two hex digits.
    #[error("invalid hex digit in escape at byte {0}")]
    InvalidHex(usize),
    /// A `%` appeared with fewer than two bytes left in the input.
    #[error("truncated escape at byte {0}")]
    Truncated(usize),
}

/// Returns `true` when the target must be answered with `400 Bad Request`.
///
/// # Example
///
/// ```
/// # use catalog_httpd::http::uri::is_bad_uri;
/// assert!(is_bad_uri("index.html"));
/// assert!(is_bad_uri("/a/../etc/passwd"));
/// assert!(is_bad_uri("/a/.."));
/// assert!(!is_bad_uri("/a/..b"));
/// ```
pub fn is_bad_uri(uri: &str) -> bool {
    !uri.starts_with('/') || uri.contains("/../") || uri.ends_with("/..")
}

/// The part of the target before the query string.
pub fn path_of(uri: &str) -> &str {
    uri.split_once('?').map_or(uri, |(path, _)| path)
}

/// Finds the raw (still encoded) value of `key` in the target's query string.
///
/// Parameters are `&`-separated and the first one named exactly `key`
/// wins. A parameter without `=` never matches.
pub fn query_param<'a>(uri: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = uri.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix(key)?.strip_prefix('='))
}

/// Decodes a query-string component: `%XX` escapes and `+` as space.
pub fn decode_component(input: &str) -> Result<Vec<u8>, DecodeError> {
    decode(input.as_bytes(), true)
}

/// Decodes a path: `%XX` escapes only, `+` stays literal.
pub fn decode_path(input: &str) -> Result<Vec<u8>, DecodeError> {
    decode(input.as_bytes(), false)
}

fn decode(input: &[u8], plus_as_space: bool) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            b'+' if plus_as_space => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                if i + 2 >= input.len() {
                    return Err(DecodeError::Truncated(i));
                }
                let hi = hex_value(input[i + 1]).ok_or(DecodeError::InvalidHex(i + 1))?;
                let lo = hex_value(input[i + 2]).ok_or(DecodeError::InvalidHex(i + 2))?;
                out.push((hi << 4) | lo);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    Ok(out)
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
