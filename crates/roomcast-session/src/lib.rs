//! Session collaborator contract for roomcast.
//!
//! roomcast does not authenticate anyone. Whoever hosts the server
//! decides who a peer is (cookies, proxy headers, tokens) and reports it
//! through the [`SessionReader`] trait when the connection is upgraded.
//! The connection actor keeps only the resulting [`Privilege`] tag.
//!
//! ```text
//! Handshake (path + headers) → SessionReader → Identity → Privilege tag
//! ```

mod identity;
mod reader;

pub use identity::{Identity, Privilege};
pub use reader::{CookieSession, GuestSession, NoSession, SessionReader, cookie};
