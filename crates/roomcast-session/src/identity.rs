//! Who a connection belongs to.

use std::fmt;

/// Opaque privilege tag attached to a connection at creation time.
///
/// roomcast never interprets the tag; event handlers registered by the
/// hosting application may. A connection with no identity carries the
/// empty tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Privilege(String);

impl Privilege {
    /// Wraps a tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the tag carried by anonymous connections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity a session collaborator reports for a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Display name.
    pub username: String,
    /// Privilege tag copied onto the connection.
    pub privilege: Privilege,
}

impl Identity {
    /// Creates an identity.
    pub fn new(username: impl Into<String>, privilege: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            privilege: Privilege::new(privilege),
        }
    }

    /// The identity handed to visitors who have not logged in.
    pub fn guest() -> Self {
        Self::new("guest", "user")
    }
}
