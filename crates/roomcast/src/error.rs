//! Unified error type for roomcast.

use roomcast_protocol::FrameError;
use roomcast_room::RoomError;
use roomcast_route::RouteError;
use roomcast_transport::TransportError;

use crate::{RenderError, StoreError};

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoomcastError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A malformed or oversized frame.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A room-level error (stopped, unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// An invalid route in the configuration.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The persistence collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The rendering collaborator failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// The configuration is not valid JSON for [`ServerConfig`](crate::ServerConfig).
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The configuration parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    ConfigInvalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let roomcast_err: RoomcastError = err.into();
        assert!(matches!(roomcast_err, RoomcastError::Transport(_)));
        assert!(roomcast_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_frame_error() {
        let err = FrameError::TrailingBytes(3);
        let roomcast_err: RoomcastError = err.into();
        assert!(matches!(roomcast_err, RoomcastError::Frame(_)));
        assert!(roomcast_err.to_string().contains("3 trailing bytes"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::Stopped("lobby".into());
        let roomcast_err: RoomcastError = err.into();
        assert!(matches!(roomcast_err, RoomcastError::Room(_)));
    }

    #[test]
    fn test_from_store_error() {
        let err = StoreError::NotFound {
            table: "users".into(),
            key: "7".into(),
        };
        let roomcast_err: RoomcastError = err.into();
        assert!(matches!(roomcast_err, RoomcastError::Store(_)));
    }

    #[test]
    fn test_config_parse_error_is_reported() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let roomcast_err: RoomcastError = err.into();
        assert!(roomcast_err.to_string().starts_with("failed to parse config"));
    }
}
