//! Syslog transports: UDP, TCP and unix datagram sockets

use std::io;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket, UnixDatagram};
use tracing::debug;

pub use contracts::SyslogEndpoint;

/// An established connection to a collector
#[async_trait]
pub trait Transport: Send {
    /// Send one complete syslog message
    async fn send_frame(&mut self, frame: &[u8]) -> io::Result<()>;
}

/// Opens connections to a collector
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> io::Result<Box<dyn Transport>>;

    /// Human-readable target, for logs
    fn target(&self) -> String;
}

/// Whether an I/O error means the connection itself is gone
pub fn is_connection_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::UnexpectedEof
    )
}

/// Socket-backed connector for a [`SyslogEndpoint`]
#[derive(Debug, Clone)]
pub struct NetConnector {
    endpoint: SyslogEndpoint,
}

impl NetConnector {
    pub fn new(endpoint: SyslogEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl Connector for NetConnector {
    async fn connect(&self) -> io::Result<Box<dyn Transport>> {
        let transport = match &self.endpoint {
            SyslogEndpoint::Udp(addr) => {
                let target = tokio::net::lookup_host(addr.as_str())
                    .await?
                    .next()
                    .ok_or_else(|| {
                        io::Error::new(io::ErrorKind::NotFound, format!("cannot resolve {addr}"))
                    })?;
                let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
                let socket = UdpSocket::bind(local).await?;
                socket.connect(target).await?;
                NetTransport::Udp(socket)
            }
            SyslogEndpoint::Tcp(addr) => NetTransport::Tcp(TcpStream::connect(addr.as_str()).await?),
            SyslogEndpoint::Unix(path) => {
                let socket = UnixDatagram::unbound()?;
                socket.connect(path)?;
                NetTransport::Unix(socket)
            }
        };

        debug!(endpoint = %self.endpoint, "Syslog transport connected");
        Ok(Box::new(transport))
    }

    fn target(&self) -> String {
        self.endpoint.to_string()
    }
}

enum NetTransport {
    Udp(UdpSocket),
    Tcp(TcpStream),
    Unix(UnixDatagram),
}

#[async_trait]
impl Transport for NetTransport {
    async fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        match self {
            Self::Udp(socket) => socket.send(frame).await.map(|_| ()),
            Self::Unix(socket) => socket.send(frame).await.map(|_| ()),
            Self::Tcp(stream) => {
                stream.write_all(frame).await?;
                if !frame.ends_with(b"\n") {
                    stream.write_all(b"\n").await?;
                }
                Ok(())
            }
        }
    }
}
