//! The message envelope exchanged over the wire.

use crate::FrameError;

/// Event names the connection actor handles itself.
///
/// Any other event is application-defined and is either forwarded to a
/// single member (`dst` set) or broadcast to the room (`dst` empty).
pub mod event {
    /// Join the room named in the frame.
    pub const JOIN: &str = "join";
    /// Leave the room named in the frame.
    pub const LEAVE: &str = "leave";
    /// Resolve the path carried in the payload and render a response.
    pub const REQUEST: &str = "request";
    /// Reply to a `request`, addressed to the requester alone.
    pub const RESPONSE: &str = "response";
    /// Synthetic notification that a member closed its connection.
    pub const LEFT: &str = "left";
}

/// One envelope: which room, which event, who sent it, who it is for,
/// and an opaque payload.
///
/// Messages are plain values. Actors exchange encoded frames, never
/// shared references to a `Message`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Room the message belongs to.
    pub room: String,
    /// Event name.
    pub event: String,
    /// Destination connection id; empty means broadcast.
    pub dst: String,
    /// Source connection id.
    pub src: String,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
}

impl Message {
    /// Creates a broadcast message with an empty payload.
    pub fn new(
        room: impl Into<String>,
        event: impl Into<String>,
        src: impl Into<String>,
    ) -> Self {
        Self {
            room: room.into(),
            event: event.into(),
            src: src.into(),
            ..Self::default()
        }
    }

    /// Addresses the message to a single connection.
    pub fn to(mut self, dst: impl Into<String>) -> Self {
        self.dst = dst.into();
        self
    }

    /// Sets the payload.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// The synthetic notification a room receives when `src` closes its
    /// connection cleanly. The payload repeats the leaving id.
    pub fn left(room: impl Into<String>, src: &str) -> Self {
        Self::new(room, event::LEFT, src).with_payload(src.as_bytes())
    }

    /// Returns `true` when the message has no single destination.
    pub fn is_broadcast(&self) -> bool {
        self.dst.is_empty()
    }

    /// Checks the invariant every inbound frame must satisfy: `room` and
    /// `event` are both non-empty.
    pub fn validate_inbound(&self) -> Result<(), FrameError> {
        if self.room.is_empty() {
            return Err(FrameError::EmptyField("room"));
        }
        if self.event.is_empty() {
            return Err(FrameError::EmptyField("event"));
        }
        Ok(())
    }
}
