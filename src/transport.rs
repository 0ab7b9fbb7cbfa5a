//! Connection establishment and framing.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{info, warn};

use crate::error::ProtocolError;
use crate::line::LineCodec;

/// A framed, line-oriented connection over any byte stream.
pub struct Transport<S> {
    framed: Framed<S, LineCodec>,
}

impl Transport<TcpStream> {
    /// Connect over plain TCP with keepalive enabled.
    pub async fn connect(host: &str, port: u16) -> std::io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        info!(host, port, "connected");
        Ok(Self::tcp(stream))
    }

    pub fn tcp(stream: TcpStream) -> Self {
        if let Err(e) = enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }
        if let Err(e) = stream.set_nodelay(true) {
            warn!("failed to set TCP_NODELAY: {}", e);
        }
        Self::new(stream)
    }
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            framed: Framed::new(stream, LineCodec::new()),
        }
    }

    /// Next inbound line, terminator included. `None` on a clean close.
    pub async fn read_line(&mut self) -> Option<Result<String, ProtocolError>> {
        self.framed.next().await
    }

    /// Write one line; the terminator is appended.
    pub async fn write_line(&mut self, line: String) -> Result<(), ProtocolError> {
        self.framed.send(line).await
    }

    pub fn into_framed(self) -> Framed<S, LineCodec> {
        self.framed
    }
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}
