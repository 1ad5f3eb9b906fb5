//! `RoomcastServer` builder and accept loop.
//!
//! This is the entry point for running a roomcast server. It ties
//! together all the layers: transport → session → connection actor →
//! rooms.

use std::sync::Arc;
use std::time::Duration;

use roomcast_protocol::{BinaryCodec, Message};
use roomcast_room::RoomRegistry;
use roomcast_route::{RouteEntry, RouteTable};
use roomcast_session::{GuestSession, SessionReader};
use roomcast_transport::{Connection, Transport, WebSocketTransport};

use crate::{
    ConnectionActor, ConnectionHandle, ConnectionRegistry, EventHandlers, Hub, JsonRenderer,
    MemoryStore, Renderer, RoomcastError, ServerConfig, Store,
};

/// Builder for configuring and starting a roomcast server.
///
/// Defaults: [`ServerConfig::default`], every peer a
/// [`GuestSession`] guest, an empty [`MemoryStore`], and the
/// [`JsonRenderer`].
///
/// # Example
///
/// ```rust,no_run
/// use roomcast::prelude::*;
///
/// # async fn start() -> Result<(), RoomcastError> {
/// let config = ServerConfig::from_file("config.json")?;
/// let server = RoomcastServer::builder()
///     .config(config)
///     .session(NoSession)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RoomcastServerBuilder {
    config: ServerConfig,
    session: Box<dyn SessionReader>,
    store: Box<dyn Store>,
    renderer: Box<dyn Renderer>,
    handlers: EventHandlers,
}

impl RoomcastServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            session: Box::new(GuestSession),
            store: Box::new(MemoryStore::new()),
            renderer: Box::new(JsonRenderer),
            handlers: EventHandlers::new(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind = addr.to_string();
        self
    }

    /// Replaces the whole configuration, including its bind address and
    /// routes.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the route table.
    pub fn routes(mut self, routes: impl IntoIterator<Item = RouteEntry>) -> Self {
        self.config.routes = routes.into_iter().collect();
        self
    }

    /// Sets how peers are identified when they connect.
    pub fn session(mut self, session: impl SessionReader) -> Self {
        self.session = Box::new(session);
        self
    }

    /// Sets the store views read records from.
    pub fn store(mut self, store: impl Store) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Sets the renderer views are rendered with.
    pub fn renderer(mut self, renderer: impl Renderer) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Registers a handler for inbound frames carrying `event`. See
    /// [`EventHandlers::on`].
    pub fn on<F>(mut self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&ConnectionHandle, &[u8], &Message) + Send + Sync + 'static,
    {
        self.handlers.on(event, handler);
        self
    }

    /// Builds the shared context without binding a listener. Used to
    /// drive connection actors over custom transports.
    ///
    /// # Errors
    /// [`RoomcastError::ConfigInvalid`] if the configuration does not
    /// [validate](ServerConfig::validate), [`RoomcastError::Route`] if a
    /// route pattern does not compile.
    pub fn into_hub(self) -> Result<Hub, RoomcastError> {
        self.into_parts().map(|(hub, _)| hub)
    }

    fn into_parts(self) -> Result<(Hub, Box<dyn SessionReader>), RoomcastError> {
        self.config.validate()?;
        let routes = RouteTable::from_entries(self.config.routes.iter().cloned())?;
        let hub = Hub {
            rooms: RoomRegistry::new(self.config.room.clone()),
            connections: ConnectionRegistry::new(),
            routes,
            store: self.store,
            renderer: self.renderer,
            handlers: self.handlers,
            codec: BinaryCodec,
            config: self.config,
        };
        Ok((hub, self.session))
    }

    /// Binds the WebSocket listener and returns the server, ready to
    /// [`run`](RoomcastServer::run).
    pub async fn build(self) -> Result<RoomcastServer, RoomcastError> {
        let (hub, session) = self.into_parts()?;
        let transport =
            WebSocketTransport::bind_with_limit(&hub.config.bind, hub.config.max_frame_size)
                .await?;

        Ok(RoomcastServer {
            transport,
            hub: Arc::new(hub),
            session: Arc::from(session),
        })
    }
}

impl Default for RoomcastServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound roomcast server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RoomcastServer {
    transport: WebSocketTransport,
    hub: Arc<Hub>,
    session: Arc<dyn SessionReader>,
}

impl RoomcastServer {
    /// Creates a new builder.
    pub fn builder() -> RoomcastServerBuilder {
        RoomcastServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The shared context, for inspecting rooms and connections.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Runs the server accept loop.
    ///
    /// Each accepted connection is identified through the session
    /// reader and handed to its own [`ConnectionActor`] task. Accept
    /// failures are logged and do not stop the loop. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), RoomcastError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "roomcast server running");

        if let Some(grace) = self.hub.config.room.idle_grace() {
            tokio::spawn(reap_idle_rooms(Arc::clone(&self.hub), grace));
        }

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let hub = Arc::clone(&self.hub);
                    let session = Arc::clone(&self.session);
                    tokio::spawn(serve(hub, session, conn));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Identifies one accepted connection and runs its actor to completion.
async fn serve<C: Connection>(hub: Arc<Hub>, session: Arc<dyn SessionReader>, conn: C) {
    let privilege = session
        .read_identity(conn.handshake())
        .map(|identity| identity.privilege)
        .unwrap_or_default();
    let actor = ConnectionActor::create(hub, conn, privilege).await;
    actor.run().await;
}

/// Periodically stops rooms that have stayed empty for `grace`.
async fn reap_idle_rooms(hub: Arc<Hub>, grace: Duration) {
    let mut ticker = tokio::time::interval(grace.max(Duration::from_secs(1)));
    loop {
        ticker.tick().await;
        let reaped = hub.rooms.reap_idle(grace).await;
        if !reaped.is_empty() {
            tracing::debug!(count = reaped.len(), "reaped idle rooms");
        }
    }
}
