//! Room actor: an isolated Tokio task that owns one room's member set.
//!
//! Each room runs in its own task, communicating with the outside world
//! through a bounded mpsc channel. Callers submit requests; only the
//! control loop ever touches the member set.

use std::collections::HashMap;
use std::time::Duration;

use roomcast_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use crate::{RoomConfig, RoomError, RoomState};

/// The outbound queue of a connection: encoded frames waiting to be
/// written to its peer.
pub type Outbox = mpsc::Sender<Vec<u8>>;

/// A connection as a room sees it.
///
/// The outbox is held weakly: a room never keeps a connection's queue
/// alive after the connection itself is gone.
#[derive(Debug, Clone)]
pub struct Member {
    id: ConnectionId,
    outbox: mpsc::WeakSender<Vec<u8>>,
}

impl Member {
    /// Creates a member entry for connection `id` delivering to `outbox`.
    pub fn new(id: ConnectionId, outbox: &Outbox) -> Self {
        Self {
            id,
            outbox: outbox.downgrade(),
        }
    }

    /// The member's connection id.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }
}

/// Requests sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel. Leave
/// and broadcast are one-way.
enum RoomCommand {
    /// Add a member (duplicate ids collapse to one entry). The reply
    /// fires once the member is in the set.
    Join {
        member: Member,
        reply: oneshot::Sender<()>,
    },

    /// Remove a member; a no-op for non-members.
    Leave { id: ConnectionId },

    /// Deliver `frame` to every member except `sender`.
    Broadcast { sender: ConnectionId, frame: Vec<u8> },

    /// Look up one member's outbox for direct delivery.
    Lookup {
        id: ConnectionId,
        reply: oneshot::Sender<Option<Outbox>>,
    },

    /// Request a snapshot of room metadata.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Stop only if the room has been empty for at least `grace`.
    StopIfIdle {
        grace: Duration,
        reply: oneshot::Sender<bool>,
    },

    /// Stop unconditionally.
    Stop,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's name.
    pub name: String,
    /// Current lifecycle state.
    pub state: RoomState,
    /// Number of current members.
    pub member_count: usize,
    /// How long the room has been empty, if it is empty.
    pub idle_for: Option<Duration>,
}

/// Handle to a running room actor. Used to send requests to it.
///
/// Cheap to clone: an `mpsc::Sender` plus a state watcher.
#[derive(Clone)]
pub struct RoomHandle {
    name: String,
    sender: mpsc::Sender<RoomCommand>,
    state: watch::Receiver<RoomState>,
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

impl RoomHandle {
    /// Returns the room's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the room's current lifecycle state.
    pub fn state(&self) -> RoomState {
        *self.state.borrow()
    }

    /// Returns `true` once the room has stopped.
    pub fn is_stopped(&self) -> bool {
        self.state().is_stopped()
    }

    /// Returns `true` if both handles address the same room actor.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Adds a member and waits until the control loop has applied it.
    ///
    /// Joining twice is harmless. Fails with [`RoomError::Stopped`] if the
    /// room stopped before the request was applied.
    pub async fn join(&self, member: Member) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.submit(RoomCommand::Join { member, reply }).await?;
        rx.await.map_err(|_| RoomError::Stopped(self.name.clone()))
    }

    /// Submits a leave request.
    pub async fn leave(&self, id: ConnectionId) -> Result<(), RoomError> {
        self.submit(RoomCommand::Leave { id }).await
    }

    /// Submits `frame` for delivery to every member except `sender`.
    /// `sender` need not be a member itself.
    pub async fn broadcast(
        &self,
        sender: ConnectionId,
        frame: Vec<u8>,
    ) -> Result<(), RoomError> {
        self.submit(RoomCommand::Broadcast { sender, frame }).await
    }

    /// Returns the outbox of member `id`, or `None` if it is not a
    /// member (or has already gone away).
    pub async fn member(
        &self,
        id: ConnectionId,
    ) -> Result<Option<Outbox>, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.submit(RoomCommand::Lookup { id, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.name.clone()))
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.submit(RoomCommand::Info { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.name.clone()))
    }

    /// Stops the room if it has been empty for at least `grace`. Returns
    /// whether it stopped.
    ///
    /// The check runs inside the control loop, so a join queued ahead
    /// of it keeps the room alive.
    pub async fn stop_if_idle(
        &self,
        grace: Duration,
    ) -> Result<bool, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.submit(RoomCommand::StopIfIdle { grace, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.name.clone()))
    }

    /// Tells the room to stop.
    pub async fn stop(&self) -> Result<(), RoomError> {
        self.submit(RoomCommand::Stop).await
    }

    async fn submit(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Stopped(self.name.clone()))
    }
}

/// What happened to one delivery attempt.
enum Delivery {
    Delivered,
    /// The member's connection is gone.
    Closed,
    /// The member's outbox stayed full past the send timeout.
    TimedOut,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    name: String,
    config: RoomConfig,
    members: HashMap<ConnectionId, mpsc::WeakSender<Vec<u8>>>,
    /// When the member set last became empty.
    empty_since: Option<Instant>,
    state: watch::Sender<RoomState>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing requests until stopped.
    async fn run(mut self) {
        self.state.send_replace(RoomState::Running);
        tracing::info!(room = %self.name, "room started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { member, reply } => {
                    self.handle_join(member);
                    let _ = reply.send(());
                }
                RoomCommand::Leave { id } => self.handle_leave(&id),
                RoomCommand::Broadcast { sender, frame } => {
                    self.handle_broadcast(&sender, frame).await;
                }
                RoomCommand::Lookup { id, reply } => {
                    let outbox =
                        self.members.get(&id).and_then(mpsc::WeakSender::upgrade);
                    let _ = reply.send(outbox);
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::StopIfIdle { grace, reply } => {
                    let idle = self
                        .empty_since
                        .is_some_and(|since| since.elapsed() >= grace);
                    if idle {
                        tracing::info!(room = %self.name, "room idle, stopping");
                        self.shut();
                        let _ = reply.send(true);
                        break;
                    }
                    let _ = reply.send(false);
                }
                RoomCommand::Stop => {
                    tracing::info!(room = %self.name, "room stopping");
                    self.shut();
                    break;
                }
            }
        }

        // Requests still queued are dropped with the receiver; their
        // reply channels close, so waiting callers see the room as stopped.
        tracing::info!(room = %self.name, "room stopped");
    }

    /// Publishes `Stopped`, then refuses new requests. In that order, any
    /// caller whose request fails can already observe the stopped state.
    fn shut(&mut self) {
        self.state.send_replace(RoomState::Stopped);
        self.receiver.close();
    }

    fn handle_join(&mut self, member: Member) {
        self.members.insert(member.id.clone(), member.outbox);
        self.empty_since = None;
        tracing::debug!(
            room = %self.name,
            conn_id = %member.id,
            members = self.members.len(),
            "member joined"
        );
    }

    fn handle_leave(&mut self, id: &ConnectionId) {
        if self.members.remove(id).is_none() {
            return;
        }
        tracing::debug!(
            room = %self.name,
            conn_id = %id,
            members = self.members.len(),
            "member left"
        );
        self.mark_if_empty();
    }

    async fn handle_broadcast(&mut self, sender: &ConnectionId, frame: Vec<u8>) {
        let mut gone = Vec::new();
        for (id, weak) in &self.members {
            if id == sender {
                continue;
            }
            let Some(outbox) = weak.upgrade() else {
                gone.push(id.clone());
                continue;
            };
            match self.deliver(&outbox, frame.clone()).await {
                Delivery::Delivered => {}
                Delivery::Closed => gone.push(id.clone()),
                Delivery::TimedOut => {
                    tracing::warn!(
                        room = %self.name,
                        conn_id = %id,
                        "member outbox full, frame dropped"
                    );
                }
            }
        }

        for id in gone {
            tracing::debug!(room = %self.name, conn_id = %id, "pruning closed member");
            self.members.remove(&id);
        }
        self.mark_if_empty();
    }

    /// Sends one frame to one outbox, waiting for capacity (bounded by the
    /// configured send timeout, if any).
    async fn deliver(&self, outbox: &Outbox, frame: Vec<u8>) -> Delivery {
        let sent = match self.config.send_timeout() {
            None => outbox.send(frame).await,
            Some(limit) => {
                match tokio::time::timeout(limit, outbox.send(frame)).await {
                    Ok(sent) => sent,
                    Err(_) => return Delivery::TimedOut,
                }
            }
        };
        match sent {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Closed,
        }
    }

    fn mark_if_empty(&mut self) {
        if self.members.is_empty() && self.empty_since.is_none() {
            self.empty_since = Some(Instant::now());
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            name: self.name.clone(),
            state: *self.state.borrow(),
            member_count: self.members.len(),
            idle_for: self.empty_since.map(|since| since.elapsed()),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with
/// it.
pub(crate) fn spawn_room(name: &str, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_capacity.max(1));
    let (state_tx, state_rx) = watch::channel(RoomState::Created);

    let actor = RoomActor {
        name: name.to_string(),
        config,
        members: HashMap::new(),
        empty_since: Some(Instant::now()),
        state: state_tx,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        name: name.to_string(),
        sender: tx,
        state: state_rx,
    }
}
