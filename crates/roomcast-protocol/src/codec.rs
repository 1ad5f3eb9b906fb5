//! Codec trait and the binary envelope codec.
//!
//! A frame is a flat concatenation of five length-prefixed fields:
//!
//! ```text
//! roomLen room | eventLen event | dstLen dst | srcLen src | payloadLen payload
//! ```
//!
//! Each length is a 4-byte big-endian unsigned integer, which admits
//! payloads up to the 1 GiB frame limit. There is no outer framing: the
//! transport delivers whole messages.

use crate::{FrameError, Message};

/// Width of every length prefix, in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Converts messages to frames and back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a message into one frame.
    ///
    /// # Errors
    /// Returns [`FrameError::FieldTooLong`] if a field does not fit its
    /// length prefix.
    fn encode(&self, msg: &Message) -> Result<Vec<u8>, FrameError>;

    /// Parses one frame.
    ///
    /// # Errors
    /// Returns a [`FrameError`] for truncated input, over-long declared
    /// lengths, trailing bytes, or non-UTF-8 strings. No partial message
    /// is ever returned.
    fn decode(&self, data: &[u8]) -> Result<Message, FrameError>;
}

/// The length-prefixed binary [`Codec`].
///
/// ```rust
/// use roomcast_protocol::{BinaryCodec, Codec, Message};
///
/// let codec = BinaryCodec;
/// let msg = Message::new("lobby", "chat", "c1").with_payload("hi");
/// let frame = codec.encode(&msg).unwrap();
/// assert_eq!(codec.decode(&frame).unwrap(), msg);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl Codec for BinaryCodec {
    fn encode(&self, msg: &Message) -> Result<Vec<u8>, FrameError> {
        let fields: [(&'static str, &[u8]); 5] = [
            ("room", msg.room.as_bytes()),
            ("event", msg.event.as_bytes()),
            ("dst", msg.dst.as_bytes()),
            ("src", msg.src.as_bytes()),
            ("payload", &msg.payload),
        ];

        let body: usize = fields.iter().map(|(_, f)| f.len()).sum();
        let mut out = Vec::with_capacity(body + fields.len() * LENGTH_PREFIX_SIZE);
        for (name, field) in fields {
            let len = u32::try_from(field.len()).map_err(|_| {
                FrameError::FieldTooLong {
                    field: name,
                    len: field.len(),
                }
            })?;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(field);
        }
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> Result<Message, FrameError> {
        let mut reader = Reader { data, pos: 0 };
        let room = reader.string("room")?;
        let event = reader.string("event")?;
        let dst = reader.string("dst")?;
        let src = reader.string("src")?;
        let payload = reader.field("payload")?.to_vec();

        let trailing = data.len() - reader.pos;
        if trailing != 0 {
            return Err(FrameError::TrailingBytes(trailing));
        }

        Ok(Message {
            room,
            event,
            dst,
            src,
            payload,
        })
    }
}

/// Cursor over a frame being decoded.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn field(&mut self, name: &'static str) -> Result<&'a [u8], FrameError> {
        if self.remaining() < LENGTH_PREFIX_SIZE {
            return Err(FrameError::Truncated {
                field: name,
                needed: LENGTH_PREFIX_SIZE,
                remaining: self.remaining(),
            });
        }
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        prefix.copy_from_slice(&self.data[self.pos..self.pos + LENGTH_PREFIX_SIZE]);
        self.pos += LENGTH_PREFIX_SIZE;

        let declared = u32::from_be_bytes(prefix) as usize;
        if declared > self.remaining() {
            return Err(FrameError::LengthOverflow {
                field: name,
                declared,
                remaining: self.remaining(),
            });
        }
        let body = &self.data[self.pos..self.pos + declared];
        self.pos += declared;
        Ok(body)
    }

    fn string(&mut self, name: &'static str) -> Result<String, FrameError> {
        let bytes = self.field(name)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| FrameError::InvalidUtf8(name))
    }
}
