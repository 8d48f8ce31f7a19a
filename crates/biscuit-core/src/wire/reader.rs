use std::ops::Range;

use super::error::DecodeError;
use super::layout;

/// Cursor over a window `[pos, end)` of a borrowed buffer.
///
/// Nested messages are decoded by handing out a new reader over a sub-window
/// of the same buffer, so offsets in errors stay absolute.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
}

/// A decoded field header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldKey {
    pub field_id: u32,
    pub wire_type: u8,
    pub offset: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            end: buf.len(),
        }
    }

    /// Reader over `buf[window]`. The window is clamped to the buffer.
    pub fn window(buf: &'a [u8], window: Range<usize>) -> Self {
        let end = window.end.min(buf.len());
        Self {
            buf,
            pos: window.start.min(end),
            end,
        }
    }

    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.end
    }

    pub fn require(&self, needed: usize) -> Result<(), DecodeError> {
        if self.remaining() < needed {
            return Err(DecodeError::TruncatedBuffer {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let start = self.pos;
        let mut value = 0u64;
        for index in 0..layout::VARINT_MAX_LEN {
            let byte = match self.buf.get(self.pos) {
                Some(byte) if self.pos < self.end => *byte,
                _ => return Err(DecodeError::MalformedVarint { offset: start }),
            };
            self.pos += 1;

            if index == layout::VARINT_MAX_LEN - 1 && byte > layout::VARINT_LAST_BYTE_MAX {
                return Err(DecodeError::MalformedVarint { offset: start });
            }
            value |= u64::from(byte & layout::VARINT_PAYLOAD_MASK) << (7 * index);
            if byte & layout::VARINT_CONTINUATION == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::MalformedVarint { offset: start })
    }

    pub fn read_key(&mut self) -> Result<FieldKey, DecodeError> {
        let offset = self.pos;
        let key = self.read_varint()?;
        let wire_type = (key & layout::WIRE_TYPE_MASK) as u8;
        let field_id = key >> layout::WIRE_TYPE_BITS;
        if field_id < u64::from(layout::FIELD_ID_MIN) || field_id > u64::from(layout::FIELD_ID_MAX)
        {
            return Err(DecodeError::InvalidFieldId { field_id, offset });
        }
        Ok(FieldKey {
            field_id: field_id as u32,
            wire_type,
            offset,
        })
    }

    pub fn read_fixed32(&mut self) -> Result<[u8; layout::FIXED32_LEN], DecodeError> {
        let range = self.take(layout::FIXED32_LEN)?;
        let mut bytes = [0u8; layout::FIXED32_LEN];
        bytes.copy_from_slice(&self.buf[range]);
        Ok(bytes)
    }

    pub fn read_fixed64(&mut self) -> Result<[u8; layout::FIXED64_LEN], DecodeError> {
        let range = self.take(layout::FIXED64_LEN)?;
        let mut bytes = [0u8; layout::FIXED64_LEN];
        bytes.copy_from_slice(&self.buf[range]);
        Ok(bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.read_fixed32().map(f32::from_le_bytes)
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        self.read_fixed64().map(f64::from_le_bytes)
    }

    /// Reads a varint length prefix and returns the window it covers.
    pub fn read_length_delimited(&mut self) -> Result<Range<usize>, DecodeError> {
        let length_offset = self.pos;
        let length = self.read_varint()?;
        let length = usize::try_from(length).map_err(|_| DecodeError::TruncatedBuffer {
            offset: length_offset,
            needed: usize::MAX,
            available: self.remaining(),
        })?;
        self.take(length)
    }

    fn take(&mut self, len: usize) -> Result<Range<usize>, DecodeError> {
        self.require(len)?;
        let start = self.pos;
        self.pos += len;
        Ok(start..self.pos)
    }
}
