//! Wire protocol for roomcast.
//!
//! This crate defines what travels between peers:
//!
//! - **Message** ([`Message`]) — the envelope: room, event, source,
//!   destination, and an opaque payload.
//! - **Codec** ([`Codec`] trait, [`BinaryCodec`]) — the flat,
//!   length-prefixed binary encoding of that envelope.
//! - **Errors** ([`FrameError`]) — malformed or oversized frames.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Connection actor (dispatch)
//! ```

mod codec;
mod error;
mod message;

pub use codec::{BinaryCodec, Codec, LENGTH_PREFIX_SIZE};
pub use error::FrameError;
pub use message::{Message, event};
