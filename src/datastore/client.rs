//! UDP fetch client for the companion datastore.
//!
//! The exchange is one request datagram carrying the record name, answered
//! by a run of data datagrams and a `DONE` sentinel, or by a single
//! `File Not Found` sentinel. There is no acknowledgement or retransmission;
//! a lost datagram shows up as a receive timeout.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Largest datagram the datastore sends.
pub const CHUNK_SIZE: usize = 4096;

const INITIAL_CAPACITY: usize = 8192;

pub const DONE_SENTINEL: &[u8] = b"DONE";
pub const NOT_FOUND_SENTINEL: &[u8] = b"File Not Found";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("record not found")]
    NotFound,
    #[error("datastore did not answer within {0:?}")]
    TimedOut(Duration),
    #[error("datastore transport error: {0}")]
    Transport(#[from] io::Error),
}

/// One received datagram, classified.
#[derive(Debug, PartialEq, Eq)]
pub enum Datagram<'a> {
    Done,
    NotFound,
    Data(&'a [u8]),
}

impl<'a> Datagram<'a> {
    pub fn classify(payload: &'a [u8]) -> Self {
        match payload {
            DONE_SENTINEL => Datagram::Done,
            NOT_FOUND_SENTINEL => Datagram::NotFound,
            data => Datagram::Data(data),
        }
    }
}

/// A fetched record. Dropped as soon as the response body is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    data: Bytes,
}

impl Record {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// Fetches records from a datastore at a fixed address.
///
/// Holds no socket; every fetch opens its own.
#[derive(Debug, Clone)]
pub struct DatastoreClient {
    addr: SocketAddr,
    recv_timeout: Duration,
}

impl DatastoreClient {
    pub fn new(addr: SocketAddr, recv_timeout: Duration) -> Self {
        Self { addr, recv_timeout }
    }

    /// A client for a datastore on the loopback host.
    pub fn loopback(port: u16, recv_timeout: Duration) -> Self {
        Self::new(SocketAddr::from((Ipv4Addr::LOCALHOST, port)), recv_timeout)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Retrieves the record called `name`.
    ///
    /// `name` goes out as the whole datagram payload, unterminated. Replies
    /// are accepted from any source. `recv_timeout` applies to each datagram,
    /// not to the whole transfer.
    pub async fn fetch(&self, name: &[u8]) -> Result<Record, FetchError> {
        let local: SocketAddr = match self.addr.ip() {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;
        socket.send_to(name, self.addr).await?;

        let mut buffer = BytesMut::with_capacity(INITIAL_CAPACITY);
        let mut packet = [0u8; CHUNK_SIZE];

        loop {
            let n = match timeout(self.recv_timeout, socket.recv_from(&mut packet)).await {
                Err(_) => return Err(FetchError::TimedOut(self.recv_timeout)),
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(Err(e)) => return Err(e.into()),
                Ok(Ok((n, _from))) => n,
            };

            match Datagram::classify(&packet[..n]) {
                Datagram::Done => break,
                Datagram::NotFound => return Err(FetchError::NotFound),
                Datagram::Data(payload) => append(&mut buffer, payload),
            }
        }

        tracing::debug!(
            datastore = %self.addr,
            bytes = buffer.len(),
            "record fetched"
        );

        Ok(Record {
            data: buffer.freeze(),
        })
    }
}

/// Appends `payload`, doubling capacity when it does not fit, or growing to
/// fit exactly when doubling is not enough.
fn append(buffer: &mut BytesMut, payload: &[u8]) {
    let free = buffer.capacity() - buffer.len();
    if payload.len() > free {
        let target = (buffer.capacity() * 2).max(buffer.len() + payload.len());
        buffer.reserve(target - buffer.len());
    }
    buffer.extend_from_slice(payload);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_sentinels_exactly() {
        assert_eq!(Datagram::classify(b"DONE"), Datagram::Done);
        assert_eq!(Datagram::classify(b"File Not Found"), Datagram::NotFound);
        assert_eq!(Datagram::classify(b"DONE!"), Datagram::Data(b"DONE!"));
        assert_eq!(
            Datagram::classify(b"File Not Found."),
            Datagram::Data(b"File Not Found.")
        );
    }

    #[test]
    fn append_doubles_capacity() {
        let mut buffer = BytesMut::with_capacity(INITIAL_CAPACITY);
        append(&mut buffer, &[1u8; INITIAL_CAPACITY]);
        append(&mut buffer, &[2u8; 10]);

        assert_eq!(buffer.len(), INITIAL_CAPACITY + 10);
        assert!(buffer.capacity() >= INITIAL_CAPACITY * 2);
    }

    #[test]
    fn append_grows_past_double_for_large_payload() {
        let mut buffer = BytesMut::with_capacity(16);
        append(&mut buffer, &[7u8; 100]);

        assert_eq!(&buffer[..], &[7u8; 100][..]);
    }
}
