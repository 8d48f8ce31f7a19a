use super::layout;

/// Builds wire-format buffers field by field.
///
/// # Examples
/// ```
/// use biscuit_core::wire::encode::MessageBuilder;
///
/// let bytes = MessageBuilder::new().varint(1, 150).build();
/// assert_eq!(bytes, vec![0x08, 0x96, 0x01]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    buf: Vec<u8>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn varint(mut self, field_id: u32, value: u64) -> Self {
        self.key(field_id, layout::WIRE_VARINT);
        write_varint(&mut self.buf, value);
        self
    }

    pub fn float(mut self, field_id: u32, value: f32) -> Self {
        self.key(field_id, layout::WIRE_FIXED32);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn double(mut self, field_id: u32, value: f64) -> Self {
        self.key(field_id, layout::WIRE_FIXED64);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn string(self, field_id: u32, value: &str) -> Self {
        self.bytes(field_id, value.as_bytes())
    }

    pub fn bytes(mut self, field_id: u32, value: &[u8]) -> Self {
        self.key(field_id, layout::WIRE_LENGTH_DELIMITED);
        write_varint(&mut self.buf, value.len() as u64);
        self.buf.extend_from_slice(value);
        self
    }

    pub fn message(self, field_id: u32, nested: MessageBuilder) -> Self {
        self.bytes(field_id, &nested.buf)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }

    fn key(&mut self, field_id: u32, wire_type: u8) {
        let key = (u64::from(field_id) << layout::WIRE_TYPE_BITS) | u64::from(wire_type);
        write_varint(&mut self.buf, key);
    }
}

pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value > u64::from(layout::VARINT_PAYLOAD_MASK) {
        buf.push((value as u8 & layout::VARINT_PAYLOAD_MASK) | layout::VARINT_CONTINUATION);
        value >>= 7;
    }
    buf.push(value as u8);
}
