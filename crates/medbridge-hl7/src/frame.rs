//! MLLP byte envelope: `0x0B <payload> 0x1C 0x0D`.
//!
//! A `0x1C` only ends a frame when the very next byte is `0x0D`. Any other
//! pair starting with `0x1C` is payload, and the second byte of that pair is
//! never examined as a potential end marker itself.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;

pub const START_BLOCK: u8 = 0x0B;
pub const END_BLOCK: u8 = 0x1C;
pub const CARRIAGE_RETURN: u8 = 0x0D;

/// Streaming MLLP codec for use with `tokio_util::codec::Framed`.
#[derive(Debug, Default, Clone)]
pub struct MllpCodec {
    // Resume offset into the buffered frame, so partial reads are not rescanned.
    next_index: usize,
}

impl MllpCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for MllpCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(&first) = src.first() else {
            return Ok(None);
        };
        if first != START_BLOCK {
            return Err(FrameError::InvalidStartByte(first));
        }

        let mut index = self.next_index.max(1);
        while index < src.len() {
            if src[index] != END_BLOCK {
                index += 1;
                continue;
            }
            match src.get(index + 1) {
                None => {
                    self.next_index = index;
                    return Ok(None);
                }
                Some(&CARRIAGE_RETURN) => {
                    let mut frame = src.split_to(index + 2);
                    frame.truncate(index);
                    let payload = frame.split_off(1);
                    self.next_index = 0;
                    return Ok(Some(payload.freeze()));
                }
                Some(_) => index += 2,
            }
        }

        self.next_index = index;
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => {
                self.next_index = 0;
                Err(FrameError::IncompleteFrame)
            }
        }
    }
}

impl<T: AsRef<[u8]>> Encoder<T> for MllpCodec {
    type Error = FrameError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = item.as_ref();
        dst.reserve(payload.len() + 3);
        dst.put_u8(START_BLOCK);
        dst.put_slice(payload);
        dst.put_u8(END_BLOCK);
        dst.put_u8(CARRIAGE_RETURN);
        Ok(())
    }
}

/// Wrap a payload in a single MLLP frame.
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + 3);
    buf.put_u8(START_BLOCK);
    buf.put_slice(payload);
    buf.put_u8(END_BLOCK);
    buf.put_u8(CARRIAGE_RETURN);
    buf.freeze()
}

/// Decode the first frame of a complete byte buffer. Bytes after the first
/// terminator are ignored.
pub fn decode_frame(bytes: &[u8]) -> Result<Bytes, FrameError> {
    let mut buf = BytesMut::from(bytes);
    MllpCodec::new()
        .decode_eof(&mut buf)?
        .ok_or(FrameError::IncompleteFrame)
}
