//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use catalog_httpd::datastore::DatastoreClient;
use catalog_httpd::server::{listener, ServerContext};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::task::JoinHandle;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A scratch document root, removed on drop.
pub struct TempRoot {
    path: PathBuf,
}

impl TempRoot {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "catalog-httpd-{}-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed),
            nanos
        ));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, rel: &str, contents: &[u8]) {
        let file = self.path.join(rel);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(file, contents).unwrap();
    }

    pub fn mkdir(&self, rel: &str) {
        std::fs::create_dir_all(self.path.join(rel)).unwrap();
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Starts a concurrent server on an ephemeral port and returns its
/// loopback address.
pub async fn start_server(root: &Path, db_port: u16, read_timeout: Duration) -> SocketAddr {
    spawn_server(root, db_port, read_timeout, true).await
}

/// Like [`start_server`], but connections are served one at a time.
pub async fn start_sequential_server(
    root: &Path,
    db_port: u16,
    read_timeout: Duration,
) -> SocketAddr {
    spawn_server(root, db_port, read_timeout, false).await
}

async fn spawn_server(
    root: &Path,
    db_port: u16,
    read_timeout: Duration,
    concurrent: bool,
) -> SocketAddr {
    let listener = listener::bind(0, 16).unwrap();
    let port = listener.local_addr().unwrap().port();
    let context = Arc::new(ServerContext::new(
        root.to_path_buf(),
        DatastoreClient::loopback(db_port, Duration::from_millis(500)),
        read_timeout,
    ));
    tokio::spawn(listener::run(listener, context, concurrent));
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

/// Sends `raw` and reads until the server closes the connection.
pub async fn exchange(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

/// Splits a raw response into (head, body) at the blank line.
pub fn split_response(raw: &[u8]) -> (String, Vec<u8>) {
    let end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    (
        String::from_utf8(raw[..end].to_vec()).unwrap(),
        raw[end + 4..].to_vec(),
    )
}

/// A one-shot fake datastore: answers the first request with `replies` and
/// hands back the request payload it received.
pub async fn fake_datastore(replies: Vec<Vec<u8>>) -> (u16, JoinHandle<Vec<u8>>) {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = socket.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let mut buf = [0u8; 2048];
        let (n, peer) = socket.recv_from(&mut buf).await.unwrap();
        for reply in replies {
            socket.send_to(&reply, peer).await.unwrap();
        }
        buf[..n].to_vec()
    });

    (port, handle)
}

/// A UDP port with nothing listening behind it.
pub async fn silent_port() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let port = socket.local_addr().unwrap().port();
    (socket, port)
}
