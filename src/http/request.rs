use crate::http::uri;

/// HTTP request methods.
///
/// Only `GET` is served; every other method, including ones this enum does
/// not name, is answered with 501 Not Implemented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// Any other token found in the method position
    Extension(String),
}

/// The parts of a request the server acts on.
///
/// Header lines are drained from the socket but not kept.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The raw request target, query string included (e.g. "/?key=photo")
    pub target: String,
    /// Protocol version token as sent (typically "HTTP/1.0")
    pub version: String,
}

impl Method {
    /// Parses a method token. Matching is case-sensitive.
    ///
    /// # Example
    ///
    /// ```
    /// # use catalog_httpd::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::GET);
    /// assert_eq!(Method::parse("get"), Method::Extension("get".into()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "OPTIONS" => Method::OPTIONS,
            "PATCH" => Method::PATCH,
            other => Method::Extension(other.to_string()),
        }
    }
}

impl Request {
    /// The target without its query string.
    pub fn path(&self) -> &str {
        uri::path_of(&self.target)
    }

    /// The still-encoded datastore record key, if the query string carries a
    /// non-empty one.
    pub fn record_key(&self) -> Option<&str> {
        uri::query_param(&self.target, uri::RECORD_KEY).filter(|v| !v.is_empty())
    }
}
