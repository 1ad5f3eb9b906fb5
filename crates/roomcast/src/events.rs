//! Application event handlers.

use std::collections::HashMap;
use std::sync::Arc;

use roomcast_protocol::Message;

use crate::ConnectionHandle;

/// A handler for one event name: receives the connection the frame came
/// from, the raw frame, and the decoded message.
///
/// Handlers run on the connection's inbound loop, after roomcast's own
/// dispatch. Anything slow or async should be spawned.
pub type EventHandler = Arc<dyn Fn(&ConnectionHandle, &[u8], &Message) + Send + Sync>;

/// Handlers registered by the hosting application, by event name.
///
/// Registration happens while the server is being built; the table is
/// read-only once connections are accepted.
#[derive(Clone, Default)]
pub struct EventHandlers {
    handlers: HashMap<String, Vec<EventHandler>>,
}

impl EventHandlers {
    /// Creates an empty handler set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler for `event`. Handlers for the same event run in
    /// the order they were added.
    pub fn on<F>(&mut self, event: impl Into<String>, handler: F)
    where
        F: Fn(&ConnectionHandle, &[u8], &Message) + Send + Sync + 'static,
    {
        self.handlers
            .entry(event.into())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Runs every handler registered for `msg.event`. Returns how many
    /// ran.
    pub fn emit(&self, conn: &ConnectionHandle, frame: &[u8], msg: &Message) -> usize {
        let Some(handlers) = self.handlers.get(&msg.event) else {
            return 0;
        };
        for handler in handlers {
            handler(conn, frame, msg);
        }
        handlers.len()
    }

    /// Returns `true` if at least one handler is registered for `event`.
    pub fn contains(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    /// Number of event names with handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut events: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        events.sort_unstable();
        f.debug_struct("EventHandlers").field("events", &events).finish()
    }
}
