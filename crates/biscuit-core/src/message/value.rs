use super::SerializedMessage;
use super::kind::FieldKind;

/// One decoded value. Exactly one variant is active.
///
/// Text and byte payloads borrow from the decoded buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageValue<'a> {
    Varint(u64),
    Float(f32),
    Double(f64),
    String(&'a str),
    Bytes(&'a [u8]),
    Message(SerializedMessage<'a>),
}

impl<'a> MessageValue<'a> {
    pub fn kind(&self) -> FieldKind {
        match self {
            MessageValue::Varint(_) => FieldKind::Varint,
            MessageValue::Float(_) => FieldKind::Float,
            MessageValue::Double(_) => FieldKind::Double,
            MessageValue::String(_) => FieldKind::String,
            MessageValue::Bytes(_) => FieldKind::Bytes,
            MessageValue::Message(_) => FieldKind::Message,
        }
    }

    pub fn as_varint(&self) -> Option<u64> {
        match self {
            MessageValue::Varint(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            MessageValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            MessageValue::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            MessageValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self {
            MessageValue::Bytes(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&SerializedMessage<'a>> {
        match self {
            MessageValue::Message(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MessageValue;
    use crate::message::kind::FieldKind;

    #[test]
    fn accessors_only_match_their_variant() {
        let value = MessageValue::Float(1.5);
        assert_eq!(value.kind(), FieldKind::Float);
        assert_eq!(value.as_float(), Some(1.5));
        assert_eq!(value.as_varint(), None);
        assert_eq!(value.as_double(), None);
    }
}
