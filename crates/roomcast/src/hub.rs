//! The application-wide context shared by every connection.

use roomcast_protocol::BinaryCodec;
use roomcast_room::RoomRegistry;
use roomcast_route::RouteTable;

use crate::{ConnectionRegistry, EventHandlers, Renderer, ServerConfig, Store};

/// State shared by every connection actor for the life of the server:
/// both registries, the route table, the content collaborators, and the
/// application's event handlers.
///
/// Built by [`RoomcastServerBuilder`](crate::RoomcastServerBuilder) and
/// shared behind an `Arc`.
pub struct Hub {
    pub(crate) config: ServerConfig,
    pub(crate) connections: ConnectionRegistry,
    pub(crate) rooms: RoomRegistry,
    pub(crate) routes: RouteTable,
    pub(crate) store: Box<dyn Store>,
    pub(crate) renderer: Box<dyn Renderer>,
    pub(crate) handlers: EventHandlers,
    pub(crate) codec: BinaryCodec,
}

impl Hub {
    /// The configuration the server was built with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Every live connection.
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Every room that has been referenced.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// The route table `request` events resolve against.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The persistence collaborator views read from.
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// The rendering collaborator.
    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// Application handlers, by event name.
    pub fn handlers(&self) -> &EventHandlers {
        &self.handlers
    }

    /// The wire codec.
    pub fn codec(&self) -> &BinaryCodec {
        &self.codec
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("config", &self.config)
            .field("routes", &self.routes.len())
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}
