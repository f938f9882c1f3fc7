use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket};
use tracing::{debug, info, warn};

use crate::http::connection::Connection;
use crate::server::ServerContext;

/// Binds `0.0.0.0:port` with `SO_REUSEADDR` and starts listening.
///
/// Must be called from inside a tokio runtime.
pub fn bind(port: u16, backlog: u32) -> anyhow::Result<TcpListener> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

    let socket = TcpSocket::new_v4().context("socket")?;
    socket.set_reuseaddr(true).context("setsockopt SO_REUSEADDR")?;
    socket.bind(addr).with_context(|| format!("bind {addr}"))?;
    let listener = socket.listen(backlog).context("listen")?;

    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accepts connections forever.
///
/// With `concurrent` each connection runs on its own task; otherwise the
/// next accept waits until the current connection is done. Accept errors are
/// logged and the loop carries on.
pub async fn run(
    listener: TcpListener,
    context: Arc<ServerContext>,
    concurrent: bool,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        debug!("Accepted connection from {}", peer);

        let conn = Connection::new(socket, peer, Arc::clone(&context));
        if concurrent {
            tokio::spawn(async move {
                if let Err(e) = conn.run().await {
                    debug!("Connection from {} aborted: {}", peer, e);
                }
            });
        } else if let Err(e) = conn.run().await {
            debug!("Connection from {} aborted: {}", peer, e);
        }
    }
}
