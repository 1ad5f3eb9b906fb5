//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

use crate::{
    Connection, ConnectionId, Handshake, Incoming, Transport, TransportError,
};

/// Largest message the reader accepts by default (1 GiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024 * 1024;

type WsStream = WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
    max_message_size: usize,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        Self::bind_with_limit(addr, DEFAULT_MAX_MESSAGE_SIZE).await
    }

    /// Binds a new WebSocket transport whose reader rejects messages
    /// larger than `max_message_size` bytes.
    pub async fn bind_with_limit(
        addr: &str,
        max_message_size: usize,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self {
            listener,
            max_message_size,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    fn ws_config(&self) -> WebSocketConfig {
        WebSocketConfig::default()
            .max_message_size(Some(self.max_message_size))
            .max_frame_size(Some(self.max_message_size))
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let mut handshake = Handshake::default();
        let capture = |req: &Request,
                       resp: Response|
         -> Result<Response, ErrorResponse> {
            handshake = Handshake {
                path: req.uri().path().to_string(),
                headers: req
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|v| (name.as_str().to_string(), v.to_string()))
                    })
                    .collect(),
            };
            Ok(resp)
        };

        let ws = tokio_tungstenite::accept_hdr_async_with_config(
            stream,
            capture,
            Some(self.ws_config()),
        )
        .await
        .map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId::generate();
        tracing::debug!(%id, %addr, path = %handshake.path, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            handshake,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// A single WebSocket connection.
///
/// The socket is split so the reader and writer halves are locked
/// independently.
pub struct WebSocketConnection {
    id: ConnectionId,
    handshake: Handshake,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    async fn write(&self, msg: Message) -> Result<(), TransportError> {
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        self.write(Message::Binary(data.to_vec().into())).await
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        self.write(Message::Ping(Vec::new().into())).await
    }

    async fn recv(&self) -> Result<Option<Incoming>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(Incoming::Frame(data.into())));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Incoming::Frame(
                        text.as_bytes().to_vec(),
                    )));
                }
                Some(Ok(Message::Pong(_))) => return Ok(Some(Incoming::Pong)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // pings are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> &ConnectionId {
        &self.id
    }

    fn handshake(&self) -> &Handshake {
        &self.handshake
    }
}
