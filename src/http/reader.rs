use std::io;
use std::time::Duration;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

const READ_CHUNK: usize = 1024;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("timed out waiting for data")]
    TimedOut,
    #[error("connection closed by peer")]
    Closed,
    #[error("line exceeds {limit} bytes")]
    TooLong { limit: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reads CRLF-terminated lines from a socket, arming `read_timeout` on
/// every read.
pub struct LineReader<R> {
    inner: R,
    buffer: BytesMut,
    read_timeout: Duration,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R, read_timeout: Duration) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(READ_CHUNK * 4),
            read_timeout,
        }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Returns the next line without its CRLF.
    ///
    /// `limit` bounds the line including the terminator. A bare `\n` does not
    /// end a line. When the peer closes after sending part of a line, that
    /// partial line is returned; a close with nothing buffered is
    /// `ReadError::Closed`.
    pub async fn read_line(&mut self, limit: usize) -> Result<Vec<u8>, ReadError> {
        let mut scanned = 0;

        loop {
            if let Some(pos) = find_crlf(&self.buffer[scanned..]) {
                let end = scanned + pos;
                if end + 2 > limit {
                    return Err(ReadError::TooLong { limit });
                }
                let line = self.buffer.split_to(end + 2);
                return Ok(line[..end].to_vec());
            }

            if self.buffer.len() >= limit {
                return Err(ReadError::TooLong { limit });
            }
            // a CR at the very end may pair with an LF from the next read
            scanned = self.buffer.len().saturating_sub(1);

            let mut chunk = [0u8; READ_CHUNK];
            let n = match timeout(self.read_timeout, self.inner.read(&mut chunk)).await {
                Err(_) => return Err(ReadError::TimedOut),
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(Err(e)) => return Err(e.into()),
                Ok(Ok(n)) => n,
            };

            if n == 0 {
                if self.buffer.is_empty() {
                    return Err(ReadError::Closed);
                }
                return Ok(self.buffer.split().to_vec());
            }

            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Throws away buffered input and whatever the peer still sends, until it
    /// closes, goes quiet for `idle`, or `limit` bytes have been dropped.
    /// Returns the number of bytes discarded.
    pub async fn discard(&mut self, idle: Duration, limit: usize) -> usize {
        let mut discarded = self.buffer.len();
        self.buffer.clear();

        let mut chunk = [0u8; READ_CHUNK];
        while discarded < limit {
            match timeout(idle, self.inner.read(&mut chunk)).await {
                Ok(Ok(0)) | Ok(Err(_)) | Err(_) => break,
                Ok(Ok(n)) => discarded += n,
            }
        }
        discarded
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 64;

    #[tokio::test]
    async fn reads_consecutive_lines() {
        let input: &[u8] = b"GET / HTTP/1.0\r\nHost: x\r\n\r\n";
        let mut reader = LineReader::new(input, Duration::from_secs(1));

        assert_eq!(reader.read_line(LIMIT).await.unwrap(), b"GET / HTTP/1.0");
        assert_eq!(reader.read_line(LIMIT).await.unwrap(), b"Host: x");
        assert_eq!(reader.read_line(LIMIT).await.unwrap(), b"");
        assert!(matches!(reader.read_line(LIMIT).await, Err(ReadError::Closed)));
    }

    #[tokio::test]
    async fn bare_lf_does_not_end_a_line() {
        let input: &[u8] = b"a\nb\r\n";
        let mut reader = LineReader::new(input, Duration::from_secs(1));

        assert_eq!(reader.read_line(LIMIT).await.unwrap(), b"a\nb");
    }

    #[tokio::test]
    async fn partial_line_is_returned_on_close() {
        let input: &[u8] = b"GET / HTTP/1.0";
        let mut reader = LineReader::new(input, Duration::from_secs(1));

        assert_eq!(reader.read_line(LIMIT).await.unwrap(), b"GET / HTTP/1.0");
    }

    #[tokio::test]
    async fn overlong_line_is_rejected() {
        let input = vec![b'a'; LIMIT * 2];
        let mut reader = LineReader::new(&input[..], Duration::from_secs(1));

        assert!(matches!(
            reader.read_line(LIMIT).await,
            Err(ReadError::TooLong { limit: LIMIT })
        ));
    }

    #[tokio::test]
    async fn crlf_split_across_reads() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = LineReader::new(server, Duration::from_secs(1));

        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            client.write_all(b"abc\r").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            client.write_all(b"\ndef\r\n").await.unwrap();
        });

        assert_eq!(reader.read_line(LIMIT).await.unwrap(), b"abc");
        assert_eq!(reader.read_line(LIMIT).await.unwrap(), b"def");
    }

    #[tokio::test]
    async fn discard_drops_buffered_and_pending_input() {
        let input: &[u8] = b"POST / HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello";
        let mut reader = LineReader::new(input, Duration::from_secs(1));

        assert_eq!(reader.read_line(LIMIT).await.unwrap(), b"POST / HTTP/1.0");
        let rest = input.len() - b"POST / HTTP/1.0\r\n".len();
        assert_eq!(reader.discard(Duration::from_millis(50), 1 << 20).await, rest);
        assert!(matches!(reader.read_line(LIMIT).await, Err(ReadError::Closed)));
    }

    #[tokio::test]
    async fn discard_stops_when_peer_goes_quiet() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = LineReader::new(server, Duration::from_secs(1));

        use tokio::io::AsyncWriteExt;
        client.write_all(b"leftover").await.unwrap();

        assert_eq!(reader.discard(Duration::from_millis(50), 1 << 20).await, 8);
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let (_client, server) = tokio::io::duplex(64);
        let mut reader = LineReader::new(server, Duration::from_millis(50));

        assert!(matches!(reader.read_line(LIMIT).await, Err(ReadError::TimedOut)));
    }
}
