use std::io;

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.0";
const FILE_CHUNK: usize = 8192;

/// Serializes the status line and headers, including the blank line.
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    format!(
        "{} {}\r\nContent-Length: {}\r\nContent-Type: {}\r\n\r\n",
        HTTP_VERSION,
        resp.status,
        resp.content_length(),
        resp.content_type
    )
    .into_bytes()
}

pub struct ResponseWriter {
    head: Vec<u8>,
    body: Body,
}

impl ResponseWriter {
    pub fn new(response: Response) -> Self {
        Self {
            head: serialize_head(&response),
            body: response.body,
        }
    }

    /// Sends the head and then exactly `Content-Length` body bytes.
    ///
    /// An error part-way through leaves the client with a truncated
    /// response; the caller just drops the connection.
    pub async fn write_to_stream<W>(self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        write_fully(stream, &self.head).await?;

        match self.body {
            Body::Bytes(bytes) => write_fully(stream, &bytes).await?,
            Body::File { mut file, len } => {
                let mut remaining = len;
                let mut chunk = vec![0u8; FILE_CHUNK];

                while remaining > 0 {
                    let want = remaining.min(FILE_CHUNK as u64) as usize;
                    let n = match file.read(&mut chunk[..want]).await {
                        Ok(n) => n,
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(e.into()),
                    };
                    if n == 0 {
                        anyhow::bail!("file shrank with {} bytes still owed", remaining);
                    }
                    write_fully(stream, &chunk[..n]).await?;
                    remaining -= n as u64;
                }
            }
        }

        stream.flush().await?;
        Ok(())
    }
}

async fn write_fully<W>(stream: &mut W, buf: &[u8]) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;

    while written < buf.len() {
        let n = match stream.write(&buf[written..]).await {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        if n == 0 {
            return Err(anyhow::anyhow!("connection closed while writing"));
        }

        written += n;
    }

    Ok(())
}
