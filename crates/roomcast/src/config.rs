//! Server configuration.

use std::path::Path;
use std::time::Duration;

use roomcast_room::RoomConfig;
use roomcast_route::RouteEntry;
use serde::{Deserialize, Serialize};

use crate::RoomcastError;

/// Longest wait, in seconds, a config file may ask for. Anything longer
/// is indistinguishable from "forever" and risks overflowing deadlines.
pub const MAX_WAIT_SECS: u64 = 365 * 24 * 60 * 60;

/// Everything a [`RoomcastServer`](crate::RoomcastServer) can be told at
/// startup. Every field has a default, so a config file only needs the
/// keys it changes.
///
/// ```json
/// {
///   "bind": "0.0.0.0:8080",
///   "room": { "idle_grace_secs": 300 },
///   "routes": [
///     { "path": "/", "template": "index", "table": "posts" },
///     { "path": "^/post/(\\d+)$", "template": "post", "table": "posts", "key": "$1" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind: String,

    /// Room every connection joins as soon as it is created. Responses
    /// to `request` events are addressed through this room too.
    pub default_room: String,

    /// Capacity of each connection's outbound queue, in frames.
    pub outbound_capacity: usize,

    /// Deadline for writing one frame or probe to the socket.
    pub write_wait_secs: u64,

    /// Liveness window: how long after a probe acknowledgment the peer
    /// may stay silent. Probes go out every 9/10 of this.
    pub pong_wait_secs: u64,

    /// Read deadline before the first probe acknowledgment. `None`
    /// leaves the first read unbounded.
    pub initial_read_deadline_secs: Option<u64>,

    /// Largest inbound frame accepted, in bytes.
    pub max_frame_size: usize,

    /// Bound on waiting for space in a connection's outbound queue, in
    /// milliseconds. `None` waits as long as it takes.
    pub send_timeout_ms: Option<u64>,

    /// Settings applied to every room.
    pub room: RoomConfig,

    /// Route table, in match order.
    pub routes: Vec<RouteEntry>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            default_room: "root".to_string(),
            outbound_capacity: 256,
            write_wait_secs: 10,
            pong_wait_secs: 60,
            initial_read_deadline_secs: None,
            max_frame_size: 1024 * 1024 * 1024,
            send_timeout_ms: None,
            room: RoomConfig::default(),
            routes: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Parses a configuration from JSON text and [validates](Self::validate) it.
    pub fn from_json(text: &str) -> Result<Self, RoomcastError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RoomcastError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Rejects waits longer than [`MAX_WAIT_SECS`] and a zero write wait.
    ///
    /// # Errors
    /// [`RoomcastError::ConfigInvalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), RoomcastError> {
        let waits = [
            ("write_wait_secs", Some(self.write_wait_secs)),
            ("pong_wait_secs", Some(self.pong_wait_secs)),
            ("initial_read_deadline_secs", self.initial_read_deadline_secs),
            ("send_timeout_ms", self.send_timeout_ms.map(|ms| ms / 1000)),
            ("room.send_timeout_ms", self.room.send_timeout_ms.map(|ms| ms / 1000)),
            ("room.idle_grace_secs", self.room.idle_grace_secs),
        ];
        for (field, secs) in waits {
            if secs.is_some_and(|secs| secs > MAX_WAIT_SECS) {
                return Err(RoomcastError::ConfigInvalid(format!(
                    "{field} exceeds {MAX_WAIT_SECS} seconds"
                )));
            }
        }
        if self.write_wait_secs == 0 {
            return Err(RoomcastError::ConfigInvalid(
                "write_wait_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Deadline for one socket write, probe, or close.
    pub fn write_wait(&self) -> Duration {
        Duration::from_secs(self.write_wait_secs)
    }

    /// Liveness window renewed by each probe acknowledgment.
    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_secs)
    }

    /// Interval between liveness probes: 9/10 of the liveness window, so
    /// a probe always goes out before the peer's deadline.
    pub fn ping_period(&self) -> Duration {
        (self.pong_wait() / 10 * 9).max(Duration::from_millis(1))
    }

    /// Read deadline before the first probe acknowledgment, if any.
    pub fn initial_read_deadline(&self) -> Option<Duration> {
        self.initial_read_deadline_secs.map(Duration::from_secs)
    }

    /// Bound on queueing a frame for one connection, if any.
    pub fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout_ms.map(Duration::from_millis)
    }
}
