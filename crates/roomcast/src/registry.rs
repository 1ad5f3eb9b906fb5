//! The connection registry: connection id → handle.

use std::collections::HashMap;
use std::time::Duration;

use roomcast_room::Outbox;
use roomcast_session::Privilege;
use roomcast_transport::{ConnectionId, TransportError};
use tokio::sync::Mutex;

/// A cloneable reference to a live connection: its id, its privilege
/// tag, and a way to queue frames for its peer.
///
/// Holding a handle keeps the connection's outbound queue open, so
/// clones should not outlive the work they were made for.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    privilege: Privilege,
    outbox: Outbox,
    send_timeout: Option<Duration>,
}

impl ConnectionHandle {
    pub(crate) fn new(
        id: ConnectionId,
        privilege: Privilege,
        outbox: Outbox,
        send_timeout: Option<Duration>,
    ) -> Self {
        Self {
            id,
            privilege,
            outbox,
            send_timeout,
        }
    }

    /// The connection's id.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Privilege tag read from the session when the connection opened.
    pub fn privilege(&self) -> &Privilege {
        &self.privilege
    }

    pub(crate) fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Queues a frame for delivery to this connection's peer.
    ///
    /// Waits while the queue is full. With a send timeout configured,
    /// gives up after it and the frame is dropped.
    ///
    /// # Errors
    /// [`TransportError::ConnectionClosed`] if the connection has gone
    /// away, [`TransportError::DeadlineExceeded`] if the timeout expired.
    pub async fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        deliver(&self.outbox, frame, self.send_timeout).await
    }

    /// Returns `true` once the connection's outbound loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }
}

/// Puts one frame on an outbound queue, waiting for space up to `limit`.
pub(crate) async fn deliver(
    outbox: &Outbox,
    frame: Vec<u8>,
    limit: Option<Duration>,
) -> Result<(), TransportError> {
    let sent = match limit {
        None => outbox.send(frame).await,
        Some(limit) => tokio::time::timeout(limit, outbox.send(frame))
            .await
            .map_err(|_| TransportError::DeadlineExceeded("send"))?,
    };
    sent.map_err(|_| TransportError::ConnectionClosed("outbound queue closed".into()))
}

/// Every live connection, by id.
///
/// Entries are added when a connection actor is created and removed at
/// its teardown.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn insert(&self, handle: ConnectionHandle) {
        let mut connections = self.connections.lock().await;
        connections.insert(handle.id.clone(), handle);
    }

    pub(crate) async fn remove(&self, id: &ConnectionId) -> Option<ConnectionHandle> {
        self.connections.lock().await.remove(id)
    }

    /// Looks up a connection by id.
    pub async fn get(&self, id: &ConnectionId) -> Option<ConnectionHandle> {
        self.connections.lock().await.get(id).cloned()
    }

    /// Returns `true` if connection `id` is live.
    pub async fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.lock().await.contains_key(id)
    }

    /// Number of live connections.
    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Returns `true` if no connection is live.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Ids of every live connection, in no particular order.
    pub async fn ids(&self) -> Vec<ConnectionId> {
        self.connections.lock().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn handle(id: &str, capacity: usize, timeout: Option<Duration>) -> (ConnectionHandle, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            ConnectionHandle::new(ConnectionId::from(id), Privilege::new("user"), tx, timeout),
            rx,
        )
    }

    #[tokio::test]
    async fn test_send_queues_frame() {
        let (h, mut rx) = handle("c1", 4, None);
        h.send(b"hi".to_vec()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), b"hi");
        assert_eq!(h.privilege().as_str(), "user");
    }

    #[tokio::test]
    async fn test_send_to_closed_connection_fails() {
        let (h, rx) = handle("c1", 4, None);
        drop(rx);
        assert!(h.is_closed());
        assert!(matches!(
            h.send(b"hi".to_vec()).await,
            Err(TransportError::ConnectionClosed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_timeout_drops_frame_when_queue_stays_full() {
        let (h, mut rx) = handle("c1", 1, Some(Duration::from_millis(100)));
        h.send(b"first".to_vec()).await.unwrap();

        let result = h.send(b"second".to_vec()).await;
        assert!(matches!(result, Err(TransportError::DeadlineExceeded("send"))));

        assert_eq!(rx.recv().await.unwrap(), b"first");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_registry_insert_get_remove() {
        let registry = ConnectionRegistry::new();
        let (h, _rx) = handle("c1", 4, None);
        registry.insert(h).await;

        let id = ConnectionId::from("c1");
        assert!(registry.contains(&id).await);
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.get(&id).await.unwrap().id(), &id);
        assert_eq!(registry.ids().await, vec![id.clone()]);

        assert!(registry.remove(&id).await.is_some());
        assert!(registry.get(&id).await.is_none());
        assert!(registry.is_empty().await);
    }
}
