use crate::http::request::{Method, Request};

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The line did not split into method, target and version.
    WrongTokenCount(usize),
    /// The line is not valid UTF-8.
    InvalidEncoding,
}

/// Parses a request line (CRLF already stripped) into a [`Request`].
///
/// The line must hold exactly three whitespace-separated tokens and be valid
/// UTF-8; a target in any other encoding is refused rather than guessed at.
/// The method is not checked here; the connection decides what it serves.
pub fn parse_request_line(line: &[u8]) -> Result<Request, ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidEncoding)?;
    let parts: Vec<&str> = line.split_ascii_whitespace().collect();

    let [method, target, version] = parts[..] else {
        return Err(ParseError::WrongTokenCount(parts.len()));
    };

    Ok(Request {
        method: Method::parse(method),
        target: target.to_string(),
        version: version.to_string(),
    })
}
