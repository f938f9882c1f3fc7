use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::datastore::FetchError;
use crate::files::resolver;
use crate::http::mime;
use crate::http::parser::parse_request_line;
use crate::http::reader::{LineReader, ReadError};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::uri;
use crate::http::writer::ResponseWriter;
use crate::server::access::{self, AccessRecord};
use crate::server::ServerContext;

/// Longest request line accepted, CRLF included.
pub const MAX_REQUEST_LINE: usize = 4096;
/// Longest header line accepted, CRLF included.
pub const MAX_HEADER_LINE: usize = 2048;
/// Longest raw `key` query value accepted.
pub const MAX_RECORD_KEY: usize = 511;

/// After answering before the request was fully read, unread input is
/// discarded until the peer is quiet this long, so closing does not reset
/// the connection under the response.
const LINGER_IDLE: Duration = Duration::from_millis(200);
/// Upper bound on input discarded while lingering.
const LINGER_LIMIT: usize = 1 << 20;

/// One accepted client, served exactly once and then closed.
pub struct Connection {
    reader: LineReader<TcpStream>,
    peer: SocketAddr,
    context: Arc<ServerContext>,
    request_line: Option<String>,
    /// Set once the blank line ending the header block has been read.
    request_complete: bool,
    state: ConnectionState,
}

pub enum ConnectionState {
    AwaitRequestLine,
    AwaitHeaders(Request),
    Dispatch(Request),
    Responding(Response),
    Done,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, context: Arc<ServerContext>) -> Self {
        Self {
            reader: LineReader::new(stream, context.read_timeout),
            peer,
            context,
            request_line: None,
            request_complete: false,
            state: ConnectionState::AwaitRequestLine,
        }
    }

    /// Drives the connection to completion and writes its access line.
    ///
    /// An error means the response could not be fully written; the socket
    /// is dropped either way.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut outcome = Ok(());

        loop {
            self.state = match std::mem::replace(&mut self.state, ConnectionState::Done) {
                ConnectionState::AwaitRequestLine => self.read_request_line().await,

                ConnectionState::AwaitHeaders(req) => self.drain_headers(req).await,

                ConnectionState::Dispatch(req) => {
                    ConnectionState::Responding(self.dispatch(&req).await)
                }

                ConnectionState::Responding(response) => {
                    let status = response.status;
                    outcome = ResponseWriter::new(response)
                        .write_to_stream(self.reader.get_mut())
                        .await;
                    access::emit(&AccessRecord {
                        client: self.peer.ip(),
                        request_line: self.request_line.as_deref(),
                        status,
                    });
                    if outcome.is_ok() && !self.request_complete {
                        self.linger().await;
                    }
                    ConnectionState::Done
                }

                ConnectionState::Done => break,
            };
        }

        outcome
    }

    async fn read_request_line(&mut self) -> ConnectionState {
        let line = match self.reader.read_line(MAX_REQUEST_LINE).await {
            Ok(line) => line,
            Err(ReadError::TooLong { limit }) => {
                debug!(peer = %self.peer, limit, "request line too long");
                return respond(StatusCode::BadRequest);
            }
            Err(e) => {
                debug!(peer = %self.peer, error = %e, "no request line");
                return respond(StatusCode::RequestTimeout);
            }
        };
        self.request_line = Some(String::from_utf8_lossy(&line).into_owned());

        let request = match parse_request_line(&line) {
            Ok(request) => request,
            Err(e) => {
                debug!(peer = %self.peer, error = ?e, "malformed request line");
                return respond(StatusCode::BadRequest);
            }
        };

        if request.method != Method::GET {
            return respond(StatusCode::NotImplemented);
        }

        ConnectionState::AwaitHeaders(request)
    }

    async fn drain_headers(&mut self, request: Request) -> ConnectionState {
        loop {
            match self.reader.read_line(MAX_HEADER_LINE).await {
                Ok(line) if line.is_empty() => {
                    self.request_complete = true;
                    return ConnectionState::Dispatch(request);
                }
                Ok(_) => {}
                Err(ReadError::TooLong { limit }) => {
                    debug!(peer = %self.peer, limit, "header line too long");
                    return respond(StatusCode::BadRequest);
                }
                Err(e) => {
                    debug!(peer = %self.peer, error = %e, "headers incomplete");
                    return respond(StatusCode::RequestTimeout);
                }
            }
        }
    }

    /// Half-closes the socket and drains what the peer is still sending.
    async fn linger(&mut self) {
        if let Err(e) = self.reader.get_mut().shutdown().await {
            debug!(peer = %self.peer, error = %e, "shutdown failed");
            return;
        }
        let discarded = self.reader.discard(LINGER_IDLE, LINGER_LIMIT).await;
        debug!(peer = %self.peer, discarded, "discarded unread request bytes");
    }

    async fn dispatch(&self, request: &Request) -> Response {
        if uri::is_bad_uri(&request.target) {
            return Response::error(StatusCode::BadRequest);
        }

        match request.record_key() {
            Some(key) => self.serve_record(key).await,
            None => self.serve_static(request.path()).await,
        }
    }

    async fn serve_record(&self, raw_key: &str) -> Response {
        if raw_key.len() > MAX_RECORD_KEY {
            return Response::error(StatusCode::BadRequest);
        }
        let name = match uri::decode_component(raw_key) {
            Ok(name) => name,
            Err(e) => {
                debug!(peer = %self.peer, error = %e, "undecodable record key");
                return Response::error(StatusCode::BadRequest);
            }
        };
        if name.iter().any(|&b| b == b'/' || b == b'\\') {
            return Response::error(StatusCode::BadRequest);
        }

        match self.context.datastore.fetch(&name).await {
            Ok(record) => Response::ok(mime::IMAGE_JPEG, record.into_bytes()),
            Err(FetchError::NotFound) => Response::error(StatusCode::NotFound),
            Err(e) => {
                debug!(
                    peer = %self.peer,
                    datastore = %self.context.datastore.addr(),
                    error = %e,
                    "record fetch failed"
                );
                Response::error(StatusCode::RequestTimeout)
            }
        }
    }

    async fn serve_static(&self, path: &str) -> Response {
        if hides_traversal(path) {
            return Response::error(StatusCode::BadRequest);
        }

        let resolved = match resolver::resolve(&self.context.doc_root, path).await {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!(peer = %self.peer, error = %e, "unresolvable path");
                return Response::error(StatusCode::BadRequest);
            }
        };

        match resolver::open(resolved).await {
            Ok(file) => Response::file(file.content_type, file.file, file.len),
            Err(e) => {
                debug!(peer = %self.peer, error = %e, "static file unavailable");
                Response::error(StatusCode::NotFound)
            }
        }
    }
}

/// Whether a static path spells a traversal once its escapes are decoded,
/// as in `/%2e%2e/secret`.
///
/// The path itself is resolved undecoded. One that does not decode cleanly
/// (`/100%.txt`) passes.
fn hides_traversal(path: &str) -> bool {
    match uri::decode_path(path) {
        Ok(decoded) => uri::is_bad_uri(&String::from_utf8_lossy(&decoded)),
        Err(_) => false,
    }
}

fn respond(status: StatusCode) -> ConnectionState {
    ConnectionState::Responding(Response::error(status))
}
