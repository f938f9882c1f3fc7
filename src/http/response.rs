use std::fmt;

use bytes::Bytes;
use tokio::fs::File;

use crate::http::mime;

/// HTTP status codes the server answers with.
///
/// - `Ok` (200): Request successful
/// - `BadRequest` (400): Malformed request line, target or record key
/// - `NotFound` (404): File or record absent
/// - `RequestTimeout` (408): Client stalled, or the datastore did not answer
/// - `NotImplemented` (501): Method other than GET
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 408 Request Timeout
    RequestTimeout,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use catalog_httpd::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::RequestTimeout.as_u16(), 408);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::RequestTimeout => 408,
            StatusCode::NotImplemented => 501,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }
}

/// Formats as the status-line text, e.g. `404 Not Found`.
impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// Where the response body comes from.
#[derive(Debug)]
pub enum Body {
    /// An in-memory buffer: a datastore record or a generated page.
    Bytes(Bytes),
    /// An open file streamed from disk; `len` is its size when opened.
    File { file: File, len: u64 },
}

/// A complete HTTP/1.0 response ready to be sent to a client.
///
/// Only `Content-Length` and `Content-Type` are ever sent, in that order.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Value of the Content-Type header
    pub content_type: &'static str,
    /// Response body
    pub body: Body,
}

impl Response {
    /// Creates a 200 OK response with an in-memory body.
    pub fn ok(content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::Ok,
            content_type,
            body: Body::Bytes(body.into()),
        }
    }

    /// Creates a 200 OK response streaming `len` bytes from `file`.
    pub fn file(content_type: &'static str, file: File, len: u64) -> Self {
        Self {
            status: StatusCode::Ok,
            content_type,
            body: Body::File { file, len },
        }
    }

    /// Creates an error response with the fixed HTML page for `status`.
    ///
    /// # Example
    ///
    /// ```
    /// # use catalog_httpd::http::response::{Response, StatusCode};
    /// let resp = Response::error(StatusCode::NotFound);
    /// assert_eq!(resp.content_length(), 48);
    /// ```
    pub fn error(status: StatusCode) -> Self {
        let page = format!("<html><body><h1>{status}</h1></body></html>");
        Self {
            status,
            content_type: mime::TEXT_HTML,
            body: Body::Bytes(Bytes::from(page)),
        }
    }

    /// Number of body bytes the writer will send.
    pub fn content_length(&self) -> u64 {
        match &self.body {
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } => *len,
        }
    }
}
