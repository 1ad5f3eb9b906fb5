//! Transport abstraction layer for roomcast.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the physical duplex channel a connection actor owns. The connection
//! actor runs an inbound and an outbound loop against the same
//! [`Connection`], so implementations must allow `recv` and `send` to
//! make progress concurrently.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{DEFAULT_MAX_MESSAGE_SIZE, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;

/// Globally unique identifier for a connection, generated at handshake.
///
/// The identifier travels on the wire as the `src`/`dst` fields of a
/// message, so it is a string rather than a counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generates a fresh random (v4 UUID) identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wraps an existing identifier, e.g. one read from a frame.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as it appears on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the underlying string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What the upgrade request looked like.
///
/// Captured once during the transport handshake and handed to the
/// session collaborator so it can derive the connection's privilege tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handshake {
    /// Request path of the upgrade (e.g. `/ws`).
    pub path: String,
    /// Request headers, in the order they were received.
    pub headers: Vec<(String, String)>,
}

impl Handshake {
    /// Returns the first header value whose name matches `name`
    /// case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// One item read from a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A complete data frame.
    Frame(Vec<u8>),
    /// The peer acknowledged a liveness probe.
    Pong,
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts (and upgrades) the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;
}

/// A single duplex connection that can send and receive frames.
///
/// All methods take `&self`: the inbound loop calls [`recv`](Self::recv)
/// while the outbound loop calls [`send`](Self::send) and
/// [`ping`](Self::ping) on the same connection.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one data frame to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Sends a liveness probe.
    fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next item from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Incoming>, Self::Error>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> &ConnectionId;

    /// Returns the handshake metadata captured when the connection was
    /// upgraded.
    fn handshake(&self) -> &Handshake;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_generate_is_unique() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_connection_id_display_is_wire_form() {
        let id = ConnectionId::new("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(id.into_inner(), "abc");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new("one"), "alice");
        map.insert(ConnectionId::new("two"), "bob");
        assert_eq!(map[&ConnectionId::from("one")], "alice");
    }

    #[test]
    fn test_handshake_header_is_case_insensitive() {
        let hs = Handshake {
            path: "/ws".into(),
            headers: vec![("Cookie".into(), "session=abc".into())],
        };
        assert_eq!(hs.header("cookie"), Some("session=abc"));
        assert_eq!(hs.header("COOKIE"), Some("session=abc"));
        assert_eq!(hs.header("origin"), None);
    }
}
