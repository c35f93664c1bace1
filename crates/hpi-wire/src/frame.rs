//! Message framing.
//!
//! Every message is a 10-byte header followed by its payload:
//!
//! ```text
//! ┌──────────┬───────────┬────────────────┬──────────────┬─────────────┐
//! │ Kind (1B)│ Flags (1B)│ Operation (4B) │ Length (4B)  │ Payload     │
//! └──────────┴───────────┴────────────────┴──────────────┴─────────────┘
//! ```
//!
//! Bit 0 of the flags tells whether the multi-byte fields of the header and
//! of the payload are little endian, and the high nibble holds the protocol
//! version.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::ByteOrder;

/// Size of a frame header.
pub const HEADER_LENGTH: usize = 10;

/// Maximum size of a whole message, header included.
pub const MAX_MESSAGE_LENGTH: usize = 0xFFFF;

/// Maximum size of a payload.
pub const MAX_PAYLOAD_LENGTH: usize = MAX_MESSAGE_LENGTH - HEADER_LENGTH;

/// Protocol version carried by each header.
pub const RPC_VERSION: u8 = 1;

const LITTLE_ENDIAN_FLAG: u8 = 0x01;
const VERSION_SHIFT: u8 = 4;

/// Kind of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// A request or a reply.
    Message,
    /// A rejected frame.
    Error,
    /// Any other kind byte.
    Unknown(u8),
}

impl FrameKind {
    /// Returns the kind of a kind byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::Message,
            2 => Self::Error,
            other => Self::Unknown(other),
        }
    }

    /// Returns the kind byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Message => 1,
            Self::Error => 2,
            Self::Unknown(byte) => byte,
        }
    }
}

/// A frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Frame kind.
    pub kind: FrameKind,
    /// Byte order of the multi-byte fields.
    pub byte_order: ByteOrder,
    /// Operation id.
    pub operation_id: u32,
    /// Payload length.
    pub length: u32,
}

impl FrameHeader {
    /// Parses a header out of its first [`HEADER_LENGTH`] bytes.
    ///
    /// Returns `Ok(None)` when fewer bytes are available.
    ///
    /// # Errors
    ///
    /// Fails when the header carries another protocol version.
    pub fn parse(bytes: &[u8]) -> Result<Option<Self>, FrameError> {
        let Some(header) = bytes.get(..HEADER_LENGTH) else {
            return Ok(None);
        };

        let flags = header[1];
        let version = flags >> VERSION_SHIFT;
        if version != RPC_VERSION {
            return Err(FrameError::Version(version));
        }

        let byte_order = if flags & LITTLE_ENDIAN_FLAG == 0 {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        };
        let mut fields = &header[2..];
        let (operation_id, length) = match byte_order {
            ByteOrder::Little => (fields.get_u32_le(), fields.get_u32_le()),
            ByteOrder::Big => (fields.get_u32(), fields.get_u32()),
        };

        Ok(Some(Self {
            kind: FrameKind::from_byte(header[0]),
            byte_order,
            operation_id,
            length,
        }))
    }

    /// Writes the header.
    pub fn write(&self, dst: &mut impl BufMut) {
        let mut flags = RPC_VERSION << VERSION_SHIFT;
        if self.byte_order == ByteOrder::Little {
            flags |= LITTLE_ENDIAN_FLAG;
        }
        dst.put_u8(self.kind.as_byte());
        dst.put_u8(flags);
        match self.byte_order {
            ByteOrder::Little => {
                dst.put_u32_le(self.operation_id);
                dst.put_u32_le(self.length);
            }
            ByteOrder::Big => {
                dst.put_u32(self.operation_id);
                dst.put_u32(self.length);
            }
        }
    }
}

/// A frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame kind.
    pub kind: FrameKind,
    /// Operation id.
    pub operation_id: u32,
    /// Byte order of the sender.
    pub byte_order: ByteOrder,
    /// Payload.
    pub payload: Bytes,
}

impl Frame {
    /// Creates a message frame.
    #[must_use]
    pub fn message(operation_id: u32, byte_order: ByteOrder, payload: impl Into<Bytes>) -> Self {
        Self {
            kind: FrameKind::Message,
            operation_id,
            byte_order,
            payload: payload.into(),
        }
    }

    /// Creates an error frame, with an empty payload.
    #[must_use]
    pub const fn error(operation_id: u32, byte_order: ByteOrder) -> Self {
        Self {
            kind: FrameKind::Error,
            operation_id,
            byte_order,
            payload: Bytes::new(),
        }
    }

    /// Encodes the frame.
    ///
    /// # Errors
    ///
    /// Fails when the payload is longer than `max_payload`.
    pub fn encode(&self, dst: &mut BytesMut, max_payload: usize) -> Result<(), FrameError> {
        let length = self.payload.len();
        if length > max_payload {
            return Err(FrameError::TooLarge {
                length,
                max: max_payload,
            });
        }
        dst.reserve(HEADER_LENGTH + length);
        FrameHeader {
            kind: self.kind,
            byte_order: self.byte_order,
            operation_id: self.operation_id,
            length: length as u32,
        }
        .write(dst);
        dst.put_slice(&self.payload);
        Ok(())
    }

    /// Decodes a frame from the front of `src`, consuming it.
    ///
    /// Returns `Ok(None)`, without consuming anything, until `src` holds a
    /// whole frame.
    ///
    /// # Errors
    ///
    /// Fails on a version mismatch or when the announced payload is longer
    /// than `max_payload`.
    pub fn decode(src: &mut BytesMut, max_payload: usize) -> Result<Option<Self>, FrameError> {
        let Some(header) = FrameHeader::parse(&src[..])? else {
            return Ok(None);
        };

        let length = header.length as usize;
        if length > max_payload {
            return Err(FrameError::TooLarge {
                length,
                max: max_payload,
            });
        }
        if src.len() < HEADER_LENGTH + length {
            src.reserve(HEADER_LENGTH + length - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LENGTH);
        let payload = src.split_to(length).freeze();
        Ok(Some(Self {
            kind: header.kind,
            operation_id: header.operation_id,
            byte_order: header.byte_order,
            payload,
        }))
    }
}

/// Framing errors.
#[derive(Debug)]
pub enum FrameError {
    /// The header carries another protocol version.
    Version(u8),
    /// The payload is longer than allowed.
    TooLarge {
        /// Payload length.
        length: usize,
        /// Maximum payload length.
        max: usize,
    },
    /// An input/output error of the underlying stream.
    Io(std::io::Error),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version(version) => write!(
                f,
                "Unsupported protocol version {version}, expected {RPC_VERSION}"
            ),
            Self::TooLarge { length, max } => {
                write!(f, "Payload of {length} bytes exceeds the {max} bytes limit")
            }
            Self::Io(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FrameError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// A `tokio-util` codec reading and writing [`Frame`]s.
#[cfg(feature = "codec")]
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_payload: usize,
}

#[cfg(feature = "codec")]
impl FrameCodec {
    /// Creates a [`FrameCodec`] accepting payloads up to `max_payload` bytes.
    ///
    /// The limit is clamped to [`MAX_PAYLOAD_LENGTH`].
    #[must_use]
    pub const fn new(max_payload: usize) -> Self {
        Self {
            max_payload: if max_payload < MAX_PAYLOAD_LENGTH {
                max_payload
            } else {
                MAX_PAYLOAD_LENGTH
            },
        }
    }

    /// Returns the payload limit.
    #[must_use]
    pub const fn max_payload(&self) -> usize {
        self.max_payload
    }
}

#[cfg(feature = "codec")]
impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_PAYLOAD_LENGTH)
    }
}

#[cfg(feature = "codec")]
impl tokio_util::codec::Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Frame::decode(src, self.max_payload)
    }
}

#[cfg(feature = "codec")]
impl tokio_util::codec::Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst, self.max_payload)
    }
}
