//! # roomcast
//!
//! A real-time messaging backbone: persistent WebSocket connections,
//! organized into named rooms, relaying binary frames between members.
//!
//! Each accepted connection becomes a [`ConnectionActor`] with two loops:
//! the inbound loop decodes frames and dispatches them (join, leave,
//! request, direct forward, broadcast), and the outbound loop drains the
//! connection's queue to the socket and sends liveness probes. Rooms are
//! independent actors from [`roomcast_room`]; paths requested by clients
//! are resolved by [`roomcast_route`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomcast::prelude::*;
//!
//! # async fn start() -> Result<(), RoomcastError> {
//! let server = RoomcastServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .on("chat", |conn, _frame, msg| {
//!         tracing::info!(conn_id = %conn.id(), room = %msg.room, "chat");
//!     })
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod connection;
mod content;
mod error;
mod events;
mod hub;
mod registry;
mod server;
mod view;

pub use config::{MAX_WAIT_SECS, ServerConfig};
pub use connection::ConnectionActor;
pub use content::{JsonRenderer, MemoryStore, RenderError, Renderer, Store, StoreError};
pub use error::RoomcastError;
pub use events::{EventHandler, EventHandlers};
pub use hub::Hub;
pub use registry::{ConnectionHandle, ConnectionRegistry};
pub use server::{RoomcastServer, RoomcastServerBuilder};
pub use view::{ViewResponse, render_view};

/// Re-exports for the common case.
pub mod prelude {
    pub use crate::{
        ConnectionActor, ConnectionHandle, EventHandlers, Hub, JsonRenderer, MemoryStore,
        RenderError, Renderer, RoomcastError, RoomcastServer, RoomcastServerBuilder,
        ServerConfig, Store, StoreError, ViewResponse,
    };
    pub use roomcast_protocol::{BinaryCodec, Codec, FrameError, Message, event};
    pub use roomcast_room::{RoomConfig, RoomError, RoomHandle, RoomState};
    pub use roomcast_route::{RouteDescriptor, RouteEntry, RouteTable};
    pub use roomcast_session::{GuestSession, Identity, NoSession, Privilege, SessionReader};
    pub use roomcast_transport::{Connection, ConnectionId, Handshake, Incoming, TransportError};
}
