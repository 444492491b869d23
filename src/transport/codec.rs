//! Delimiter framing for lomy.
//!
//! Wire format: every message is its UTF-8 payload followed by a single
//! [`FRAME_DELIMITER`] byte. There is no length prefix, header or version:
//!
//! ```text
//! +--------------------------+----+
//! | payload (no 0x0A inside) | \n |
//! +--------------------------+----+
//! ```

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::{FrameError, DEFAULT_MAX_FRAME_LENGTH, FRAME_DELIMITER};

/// Codec splitting a byte stream on [`FRAME_DELIMITER`].
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// Largest payload accepted in either direction.
    max_length: usize,
    /// Bytes of the buffer already scanned for a delimiter.
    next_index: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    /// Create a codec with the default maximum frame length.
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_FRAME_LENGTH)
    }

    /// Create a codec accepting payloads of at most `max_length` bytes.
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
        }
    }

    /// Get the maximum payload length.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Check that a payload can be framed.
    pub fn check(&self, payload: &str) -> Result<(), FrameError> {
        if payload.as_bytes().contains(&FRAME_DELIMITER) {
            return Err(FrameError::DelimiterInPayload);
        }
        if payload.len() > self.max_length {
            return Err(FrameError::TooLong {
                length: payload.len(),
                max: self.max_length,
            });
        }
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let scanned = self.next_index.min(src.len());
        let Some(offset) = src[scanned..].iter().position(|b| *b == FRAME_DELIMITER) else {
            if src.len() > self.max_length {
                return Err(FrameError::TooLong {
                    length: src.len(),
                    max: self.max_length,
                });
            }
            self.next_index = src.len();
            return Ok(None);
        };

        let length = scanned + offset;
        self.next_index = 0;
        if length > self.max_length {
            return Err(FrameError::TooLong {
                length,
                max: self.max_length,
            });
        }

        let mut frame = src.split_to(length + 1);
        frame.truncate(length);
        String::from_utf8(frame.to_vec())
            .map(Some)
            .map_err(|_| FrameError::InvalidUtf8)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            Ok(None)
        } else {
            Err(FrameError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "link closed in the middle of a frame",
            )))
        }
    }
}

impl Encoder<String> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.check(&item)?;
        dst.reserve(item.len() + 1);
        dst.put_slice(item.as_bytes());
        dst.put_u8(FRAME_DELIMITER);
        Ok(())
    }
}
