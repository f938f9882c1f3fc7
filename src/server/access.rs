//! The per-connection access line: `<client-ip> "<request-line>" <status>`.

use std::fmt;
use std::io::{self, Write};
use std::net::IpAddr;

use crate::http::response::StatusCode;

pub const NO_REQUEST_LINE: &str = "(no request line)";

#[derive(Debug, Clone, Copy)]
pub struct AccessRecord<'a> {
    pub client: IpAddr,
    /// The request line without CRLF, if one arrived
    pub request_line: Option<&'a str>,
    pub status: StatusCode,
}

impl fmt::Display for AccessRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" {}",
            self.client,
            self.request_line.unwrap_or(NO_REQUEST_LINE),
            self.status
        )
    }
}

/// Writes one access line to stdout and flushes it.
///
/// Diagnostics go through `tracing` on stderr; stdout carries only these
/// lines.
pub fn emit(record: &AccessRecord<'_>) {
    let mut out = io::stdout().lock();
    if let Err(e) = writeln!(out, "{record}").and_then(|_| out.flush()) {
        tracing::warn!(error = %e, "failed to write access line");
    }
}
