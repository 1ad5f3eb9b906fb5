//! Room registry: room name → running room, creating rooms on first use.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::room::spawn_room;
use crate::{RoomConfig, RoomError, RoomHandle};

/// Tracks every live room by name.
///
/// Safe to share between connection actors. The lock is only held for
/// map operations, never while waiting on a room.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, RoomHandle>>,
    config: RoomConfig,
}

impl RoomRegistry {
    /// Creates an empty registry. Every room it spawns uses `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// The configuration applied to new rooms.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Returns the room called `name`, spawning it if it does not exist.
    ///
    /// A stopped room still in the map is replaced by a fresh one.
    pub async fn get_or_create(&self, name: &str) -> RoomHandle {
        let mut rooms = self.rooms.lock().await;
        if let Some(handle) = rooms.get(name) {
            if !handle.is_stopped() {
                return handle.clone();
            }
            tracing::debug!(room = %name, "replacing stopped room");
        }

        let handle = spawn_room(name, self.config.clone());
        rooms.insert(name.to_string(), handle.clone());
        tracing::info!(room = %name, "room created");
        handle
    }

    /// Returns the room called `name` if it exists and is still running.
    pub async fn get(&self, name: &str) -> Option<RoomHandle> {
        let rooms = self.rooms.lock().await;
        rooms.get(name).filter(|h| !h.is_stopped()).cloned()
    }

    /// Stops the room called `name` and forgets it.
    pub async fn stop_room(&self, name: &str) -> Result<(), RoomError> {
        let handle = self.rooms.lock().await.remove(name);
        match handle {
            Some(handle) => {
                tracing::info!(room = %name, "room removed");
                handle.stop().await
            }
            None => Ok(()),
        }
    }

    /// Stops and removes every room that has been empty for at least
    /// `grace`. Returns the names of the rooms removed.
    ///
    /// Each room decides for itself inside its control loop, so a room
    /// that gained a member since the last check survives.
    pub async fn reap_idle(&self, grace: Duration) -> Vec<String> {
        let handles: Vec<RoomHandle> =
            self.rooms.lock().await.values().cloned().collect();

        let mut reaped = Vec::new();
        for handle in handles {
            // A room that already stopped counts as reaped.
            let stopped = handle.stop_if_idle(grace).await.unwrap_or(true);
            if !stopped {
                continue;
            }

            let mut rooms = self.rooms.lock().await;
            // The name may already point at a newer room.
            if rooms
                .get(handle.name())
                .is_some_and(|current| current.same_room(&handle))
            {
                rooms.remove(handle.name());
                tracing::info!(room = %handle.name(), "idle room reaped");
                reaped.push(handle.name().to_string());
            }
        }
        reaped
    }

    /// Returns the number of rooms in the registry.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Lists the names of all rooms in the registry.
    pub async fn names(&self) -> Vec<String> {
        self.rooms.lock().await.keys().cloned().collect()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
