//! MLLP over TCP, optionally wrapped in TLS.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::{TlsAcceptor, TlsConnector};
use tokio_util::codec::Framed;

use crate::error::TransportError;
use crate::frame::MllpCodec;
use crate::handler::MessageHandler;

/// Deadline for a whole client exchange: connect, handshake, write, read.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept loop serving one task per connection.
pub struct MllpServer {
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
    handler: Arc<dyn MessageHandler>,
}

impl MllpServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        handler: Arc<dyn MessageHandler>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::from_listener(listener, handler))
    }

    pub fn from_listener(listener: TcpListener, handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            listener,
            tls: None,
            handler,
        }
    }

    pub fn with_tls(mut self, acceptor: TlsAcceptor) -> Self {
        self.tls = Some(acceptor);
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) {
        self.run_with_shutdown(std::future::pending()).await;
    }

    /// Serve until `shutdown` resolves. Connections already accepted keep
    /// running on their own tasks.
    pub async fn run_with_shutdown<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tracing::info!(
            addr = ?self.listener.local_addr().ok(),
            tls = self.tls.is_some(),
            "MLLP listener started"
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("MLLP listener shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let handler = self.handler.clone();
                        let tls = self.tls.clone();
                        tokio::spawn(async move {
                            serve_connection(stream, peer, tls, handler).await;
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to accept MLLP connection"),
                },
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    tls: Option<TlsAcceptor>,
    handler: Arc<dyn MessageHandler>,
) {
    tracing::info!(peer = %peer, "MLLP connection opened");
    match tls {
        Some(acceptor) => match acceptor.accept(stream).await {
            Ok(stream) => serve_frames(stream, peer, handler).await,
            Err(e) => tracing::warn!(peer = %peer, error = %e, "TLS handshake failed"),
        },
        None => serve_frames(stream, peer, handler).await,
    }
}

async fn serve_frames<S>(io: S, peer: SocketAddr, handler: Arc<dyn MessageHandler>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(io, MllpCodec::new());
    while let Some(frame) = framed.next().await {
        let payload = match frame {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(peer = %peer, error = %e, "closing MLLP connection");
                return;
            }
        };
        let reply = handler.handle(payload).await;
        if let Err(e) = framed.send(reply).await {
            tracing::warn!(peer = %peer, error = %e, "failed to write ACK");
            return;
        }
    }
    tracing::info!(peer = %peer, "MLLP connection closed");
}

#[derive(Clone)]
struct ClientTls {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

/// One-shot MLLP client: each [`send`](MllpClient::send) dials, writes one
/// frame, reads one frame and closes.
#[derive(Clone)]
pub struct MllpClient {
    addr: String,
    tls: Option<ClientTls>,
    timeout: Duration,
}

impl MllpClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            tls: None,
            timeout: DEFAULT_CLIENT_TIMEOUT,
        }
    }

    pub fn with_tls(mut self, connector: TlsConnector, server_name: ServerName<'static>) -> Self {
        self.tls = Some(ClientTls {
            connector,
            server_name,
        });
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub async fn send(&self, payload: Bytes) -> Result<Bytes, TransportError> {
        tokio::time::timeout(self.timeout, self.exchange(payload))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
    }

    async fn exchange(&self, payload: Bytes) -> Result<Bytes, TransportError> {
        let stream =
            TcpStream::connect(&self.addr)
                .await
                .map_err(|source| TransportError::Connect {
                    addr: self.addr.clone(),
                    source,
                })?;

        match &self.tls {
            Some(tls) => {
                let stream = tls
                    .connector
                    .connect(tls.server_name.clone(), stream)
                    .await
                    .map_err(TransportError::Tls)?;
                round_trip(stream, payload).await
            }
            None => round_trip(stream, payload).await,
        }
    }
}

async fn round_trip<S>(io: S, payload: Bytes) -> Result<Bytes, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(io, MllpCodec::new());
    framed.send(payload).await?;
    match framed.next().await {
        Some(reply) => Ok(reply?),
        None => Err(TransportError::ConnectionClosed),
    }
}
