//! Room configuration and state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room a registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Capacity of each room's request queue. Callers wait when it is
    /// full.
    pub command_capacity: usize,

    /// Upper bound on delivering one frame to one member, in
    /// milliseconds. `None` blocks until the member's outbox has room,
    /// which lets one slow member stall a whole broadcast. With a bound,
    /// the frame is dropped for that member once it expires.
    pub send_timeout_ms: Option<u64>,

    /// When set, rooms that have had no members for this many seconds
    /// are stopped and removed from the registry. `None` keeps rooms for
    /// the life of the process.
    pub idle_grace_secs: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            command_capacity: 64,
            send_timeout_ms: None,
            idle_grace_secs: None,
        }
    }
}

impl RoomConfig {
    /// Per-member delivery timeout, if any.
    pub fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout_ms.map(Duration::from_millis)
    }

    /// Idle grace period, if idle reaping is enabled.
    pub fn idle_grace(&self) -> Option<Duration> {
        self.idle_grace_secs.map(Duration::from_secs)
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Created → Running → Stopped
/// ```
///
/// - **Created**: the handle exists; the control loop has not started.
/// - **Running**: the control loop is processing requests.
/// - **Stopped**: terminal. Every further request fails with
///   [`RoomError::Stopped`](crate::RoomError::Stopped).
///
/// Nothing moves a room back to `Created`, and an empty room is not
/// stopped unless idle reaping is enabled or someone asks explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    /// Spawned but not yet running.
    Created,
    /// Processing requests.
    Running,
    /// Terminated.
    Stopped,
}

impl RoomState {
    /// Returns `true` once the room will accept no more requests.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// The state that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Running),
            Self::Running => Some(Self::Stopped),
            Self::Stopped => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_next_follows_strict_order() {
        assert_eq!(RoomState::Created.next(), Some(RoomState::Running));
        assert_eq!(RoomState::Running.next(), Some(RoomState::Stopped));
        assert_eq!(RoomState::Stopped.next(), None);
    }

    #[test]
    fn test_room_state_can_transition_to() {
        assert!(RoomState::Created.can_transition_to(RoomState::Running));
        assert!(!RoomState::Created.can_transition_to(RoomState::Stopped));
        assert!(!RoomState::Stopped.can_transition_to(RoomState::Created));
        assert!(!RoomState::Running.can_transition_to(RoomState::Created));
    }

    #[test]
    fn test_room_state_display() {
        assert_eq!(RoomState::Running.to_string(), "Running");
        assert_eq!(RoomState::Stopped.to_string(), "Stopped");
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.command_capacity, 64);
        assert_eq!(config.send_timeout(), None);
        assert_eq!(config.idle_grace(), None);
    }

    #[test]
    fn test_room_config_durations() {
        let config = RoomConfig {
            send_timeout_ms: Some(250),
            idle_grace_secs: Some(30),
            ..RoomConfig::default()
        };
        assert_eq!(config.send_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.idle_grace(), Some(Duration::from_secs(30)));
    }
}
