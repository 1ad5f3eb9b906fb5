//! The connection actor: one peer, two loops.
//!
//! ```text
//!              ┌──────────── inbound loop (this task) ───────────┐
//!  socket ───► │ recv → decode → join / leave / request / relay  │ ──► rooms
//!              └─────────────────────────────────────────────────┘
//!              ┌──────────── outbound loop (spawned) ────────────┐
//!  socket ◄─── │ queue → write (deadline) · periodic probe       │ ◄── rooms, peers
//!              └─────────────────────────────────────────────────┘
//! ```
//!
//! The loops share nothing but the transport and the outbound queue.
//! Either one ending closes the transport, which ends the other.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use roomcast_protocol::{Codec, FrameError, Message, event};
use roomcast_room::{Member, RoomError, RoomHandle};
use roomcast_session::Privilege;
use roomcast_transport::{Connection, ConnectionId, Incoming, TransportError};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::registry::deliver;
use crate::{ConnectionHandle, Hub, render_view};

/// How the inbound loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    /// The peer closed the stream.
    Clean,
    /// A read failed or the read deadline passed.
    Failed,
}

/// One connected peer.
///
/// Created by [`create`](Self::create), which registers it with the hub.
/// [`run`](Self::run) then drives it until the peer goes away.
pub struct ConnectionActor<C: Connection> {
    hub: Arc<Hub>,
    transport: Arc<C>,
    handle: ConnectionHandle,
    /// Receiving end of the outbound queue, until the outbound loop
    /// takes it.
    queue: Option<mpsc::Receiver<Vec<u8>>>,
    /// Rooms this connection has joined. Owned by the inbound loop.
    joined: BTreeMap<String, RoomHandle>,
}

impl<C: Connection> ConnectionActor<C> {
    /// Wraps an accepted transport connection, allocates its outbound
    /// queue, and registers it in the hub's connection registry.
    pub async fn create(hub: Arc<Hub>, transport: C, privilege: Privilege) -> Self {
        let (outbox, queue) = mpsc::channel(hub.config.outbound_capacity.max(1));
        let handle = ConnectionHandle::new(
            transport.id().clone(),
            privilege,
            outbox,
            hub.config.send_timeout(),
        );
        hub.connections.insert(handle.clone()).await;
        tracing::info!(conn_id = %handle.id(), privilege = %handle.privilege(), "connection opened");

        Self {
            hub,
            transport: Arc::new(transport),
            handle,
            queue: Some(queue),
            joined: BTreeMap::new(),
        }
    }

    /// This connection's id.
    pub fn id(&self) -> &ConnectionId {
        self.handle.id()
    }

    /// A cloneable handle to this connection.
    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Names of the rooms this connection is in.
    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.joined.keys().map(String::as_str)
    }

    /// Joins room `name`, creating it if needed. Joining a room twice is
    /// harmless.
    ///
    /// A room can stop between lookup and join (idle reaping); the join
    /// is then retried once against a fresh room.
    pub async fn join(&mut self, name: &str) -> Result<(), RoomError> {
        let member = Member::new(self.id().clone(), self.handle.outbox());
        let mut retried = false;
        loop {
            let room = self.hub.rooms.get_or_create(name).await;
            match room.join(member.clone()).await {
                Ok(()) => {
                    tracing::debug!(conn_id = %self.id(), room = %name, "joined room");
                    self.joined.insert(name.to_string(), room);
                    return Ok(());
                }
                Err(RoomError::Stopped(_)) if !retried => {
                    tracing::debug!(conn_id = %self.id(), room = %name, "room stopped during join, retrying");
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Leaves room `name`. Leaving a room this connection is not in is a
    /// no-op.
    pub async fn leave(&mut self, name: &str) -> Result<(), RoomError> {
        let Some(room) = self.joined.remove(name) else {
            tracing::debug!(conn_id = %self.id(), room = %name, "leave of room not joined");
            return Ok(());
        };
        tracing::debug!(conn_id = %self.id(), room = %name, "left room");
        room.leave(self.id().clone()).await
    }

    /// Queues a frame for this connection's peer. Waits while the queue
    /// is full, up to the configured send timeout if there is one.
    pub async fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.handle.send(frame).await
    }

    /// Runs the connection to completion: starts the outbound loop, joins
    /// the default room, reads until the peer goes away, then tears down.
    pub async fn run(mut self) {
        if let Some(queue) = self.queue.take() {
            tokio::spawn(outbound_loop(
                Arc::clone(&self.transport),
                self.id().clone(),
                queue,
                self.hub.config.write_wait(),
                self.hub.config.ping_period(),
            ));
        }

        let default_room = self.hub.config.default_room.clone();
        if let Err(e) = self.join(&default_room).await {
            tracing::warn!(conn_id = %self.id(), room = %default_room, error = %e, "default room join failed");
        }

        let closed = self.inbound_loop().await;
        self.teardown(closed).await;
    }

    async fn inbound_loop(&mut self) -> Closed {
        let pong_wait = self.hub.config.pong_wait();
        let mut deadline = self
            .hub
            .config
            .initial_read_deadline()
            .and_then(deadline_after);

        loop {
            let read = match deadline {
                None => self.transport.recv().await,
                Some(at) => match tokio::time::timeout_at(at, self.transport.recv()).await {
                    Ok(read) => read,
                    Err(_) => {
                        tracing::info!(conn_id = %self.id(), "read deadline exceeded");
                        return Closed::Failed;
                    }
                },
            };

            match read {
                Ok(Some(Incoming::Frame(frame))) => self.handle_frame(frame).await,
                Ok(Some(Incoming::Pong)) => deadline = deadline_after(pong_wait),
                Ok(None) => {
                    tracing::debug!(conn_id = %self.id(), "peer closed the connection");
                    return Closed::Clean;
                }
                Err(e) => {
                    tracing::debug!(conn_id = %self.id(), error = %e, "read failed");
                    return Closed::Failed;
                }
            }
        }
    }

    /// Decodes one inbound frame and dispatches it, then runs the
    /// application's handlers for its event. Malformed frames are dropped.
    async fn handle_frame(&mut self, frame: Vec<u8>) {
        let msg = match self.decode(&frame) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(conn_id = %self.id(), error = %e, "dropping malformed frame");
                return;
            }
        };

        match msg.event.as_str() {
            event::JOIN => {
                if let Err(e) = self.join(&msg.room).await {
                    tracing::debug!(conn_id = %self.id(), room = %msg.room, error = %e, "join failed");
                }
            }
            event::LEAVE => {
                if let Err(e) = self.leave(&msg.room).await {
                    tracing::debug!(conn_id = %self.id(), room = %msg.room, error = %e, "leave failed");
                }
            }
            event::REQUEST => self.respond(&msg).await,
            _ if !msg.is_broadcast() => self.forward(&msg, frame.clone()).await,
            _ => self.broadcast(&msg.room, frame.clone()).await,
        }

        self.hub.handlers.emit(&self.handle, &frame, &msg);
    }

    fn decode(&self, frame: &[u8]) -> Result<Message, FrameError> {
        let max = self.hub.config.max_frame_size;
        if frame.len() > max {
            return Err(FrameError::TooLarge {
                size: frame.len(),
                max,
            });
        }
        let msg = self.hub.codec.decode(frame)?;
        msg.validate_inbound()?;
        Ok(msg)
    }

    /// Renders the requested path and sends the view back to this
    /// connection alone.
    async fn respond(&self, msg: &Message) {
        let path = String::from_utf8_lossy(&msg.payload);
        let Some(view) = render_view(&self.hub, &path) else {
            return;
        };

        let payload = match serde_json::to_vec(&view) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(conn_id = %self.id(), error = %e, "view encoding failed");
                return;
            }
        };
        let id = self.id().as_str();
        let response = Message::new(self.hub.config.default_room.as_str(), event::RESPONSE, id)
            .to(id)
            .with_payload(payload);

        match self.hub.codec.encode(&response) {
            Ok(frame) => {
                if let Err(e) = self.send(frame).await {
                    tracing::debug!(conn_id = %self.id(), error = %e, "response not delivered");
                }
            }
            Err(e) => tracing::warn!(conn_id = %self.id(), error = %e, "response encoding failed"),
        }
    }

    /// Delivers a frame straight to member `msg.dst` of `msg.room`. The
    /// sender must be in that room; a missing destination drops the frame.
    async fn forward(&self, msg: &Message, frame: Vec<u8>) {
        let Some(room) = self.joined.get(&msg.room) else {
            tracing::debug!(conn_id = %self.id(), room = %msg.room, "forward from outside room dropped");
            return;
        };

        let outbox = match room.member(ConnectionId::new(msg.dst.as_str())).await {
            Ok(Some(outbox)) => outbox,
            Ok(None) => {
                tracing::debug!(conn_id = %self.id(), room = %msg.room, dst = %msg.dst, "forward target not in room");
                return;
            }
            Err(e) => {
                tracing::debug!(conn_id = %self.id(), room = %msg.room, error = %e, "forward lookup failed");
                return;
            }
        };

        if let Err(e) = deliver(&outbox, frame, self.hub.config.send_timeout()).await {
            tracing::warn!(conn_id = %self.id(), dst = %msg.dst, error = %e, "forward dropped");
        }
    }

    /// Hands a frame to room `name` for delivery to its other members.
    async fn broadcast(&self, name: &str, frame: Vec<u8>) {
        let Some(room) = self.hub.rooms.get(name).await else {
            tracing::debug!(conn_id = %self.id(), room = %name, "broadcast to unknown room dropped");
            return;
        };
        if let Err(e) = room.broadcast(self.id().clone(), frame).await {
            tracing::debug!(conn_id = %self.id(), room = %name, error = %e, "broadcast failed");
        }
    }

    /// Leaves every room (announcing the departure first if the peer
    /// closed cleanly), unregisters, and closes the transport.
    async fn teardown(mut self, closed: Closed) {
        let rooms = std::mem::take(&mut self.joined);

        if closed == Closed::Clean {
            for (name, room) in &rooms {
                let left = Message::left(name.as_str(), self.id().as_str());
                match self.hub.codec.encode(&left) {
                    Ok(frame) => {
                        if let Err(e) = room.broadcast(self.id().clone(), frame).await {
                            tracing::debug!(conn_id = %self.id(), room = %name, error = %e, "left notice not sent");
                        }
                    }
                    Err(e) => tracing::warn!(conn_id = %self.id(), error = %e, "left notice encoding failed"),
                }
            }
        }

        for (name, room) in rooms {
            if let Err(e) = room.leave(self.id().clone()).await {
                tracing::debug!(conn_id = %self.id(), room = %name, error = %e, "leave on teardown failed");
            }
        }

        self.hub.connections.remove(self.id()).await;
        close_within(&*self.transport, self.id(), self.hub.config.write_wait()).await;
        tracing::info!(conn_id = %self.id(), clean = closed == Closed::Clean, "connection closed");
    }
}

/// Drains the outbound queue to the transport and sends a liveness probe
/// every `ping_period`. Stops on the first failed or late write, or when
/// every sender of the queue is gone, and closes the transport either way.
async fn outbound_loop<C: Connection>(
    transport: Arc<C>,
    id: ConnectionId,
    mut queue: mpsc::Receiver<Vec<u8>>,
    write_wait: Duration,
    ping_period: Duration,
) {
    let mut ticker = deadline_after(ping_period).map(|first| {
        let mut ticker = tokio::time::interval_at(first, ping_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    loop {
        tokio::select! {
            frame = queue.recv() => {
                let Some(frame) = frame else {
                    tracing::debug!(conn_id = %id, "outbound queue closed");
                    break;
                };
                let written = tokio::time::timeout(write_wait, transport.send(&frame)).await;
                if !write_ok(&id, "frame", written) {
                    break;
                }
            }
            _ = next_tick(&mut ticker) => {
                let written = tokio::time::timeout(write_wait, transport.ping()).await;
                if !write_ok(&id, "probe", written) {
                    break;
                }
            }
        }
    }

    queue.close();
    close_within(&*transport, &id, write_wait).await;
}

/// Closes the transport, giving up after `write_wait`. A peer that
/// stopped reading can leave the close frame unflushable.
async fn close_within<C: Connection>(transport: &C, id: &ConnectionId, write_wait: Duration) {
    let closed = tokio::time::timeout(write_wait, transport.close()).await;
    write_ok(id, "close", closed);
}

/// `None` when `wait` is too long to represent, which means no deadline.
fn deadline_after(wait: Duration) -> Option<Instant> {
    Instant::now().checked_add(wait)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn write_ok<E: std::fmt::Display>(
    id: &ConnectionId,
    what: &'static str,
    written: Result<Result<(), E>, tokio::time::error::Elapsed>,
) -> bool {
    match written {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::debug!(conn_id = %id, error = %e, "{what} write failed");
            false
        }
        Err(_) => {
            tracing::debug!(conn_id = %id, "{what} write deadline exceeded");
            false
        }
    }
}
