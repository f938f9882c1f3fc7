//! HTTP/1.0 protocol implementation.
//!
//! One request per connection, GET only, no keep-alive.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection state machine and request dispatch
//! - **`reader`**: CRLF line framing over the socket with a read timeout
//! - **`parser`**: Splits the request line into method, target and version
//! - **`request`**: HTTP request representation
//! - **`uri`**: Traversal guard, query extraction and percent-decoding
//! - **`response`**: Status codes and response bodies
//! - **`writer`**: Serializes and writes responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitRequestLine │ ← timeout/close → 408, bad line → 400, not GET → 501
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │   AwaitHeaders   │ ← drain until blank line; timeout/close → 408
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │     Dispatch     │ ← ?key=… → datastore, otherwise static file
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │    Responding    │ ← write head + body, emit access line
//!        └────────┬─────────┘
//!                 ▼
//!               Done   (socket closed)
//! ```
//!
//! Any error response skips straight to `Responding`.

pub mod connection;
pub mod mime;
pub mod parser;
pub mod reader;
pub mod request;
pub mod response;
pub mod uri;
pub mod writer;
