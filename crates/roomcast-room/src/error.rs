//! Error types for the room layer.

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The room's control loop has stopped; it accepts no more requests.
    #[error("room {0} is stopped")]
    Stopped(String),

    /// The room dropped a request before replying.
    #[error("room {0} is unavailable")]
    Unavailable(String),
}
