//! Room brokers for roomcast.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! member set. Join, leave, and broadcast requests are queued to the
//! room's control loop and applied strictly in arrival order, so the
//! member set never needs a lock.
//!
//! # Key types
//!
//! - [`RoomHandle`] — send requests to a running room
//! - [`RoomRegistry`] — room name → handle, creating rooms lazily
//! - [`Member`] — a connection as a room sees it (id + weak outbox)
//! - [`RoomState`] — `Created → Running → Stopped`
//! - [`RoomConfig`] — queue sizes, delivery timeout, idle reaping

mod config;
mod error;
mod registry;
mod room;

pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{Member, Outbox, RoomHandle, RoomInfo};
