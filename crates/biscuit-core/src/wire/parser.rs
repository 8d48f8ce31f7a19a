use std::ops::Range;

use super::error::DecodeError;
use super::layout;
use super::reader::WireReader;
use crate::matcher::PacketSchema;
use crate::message::{FieldKind, MessageValue, SerializedMessage};

/// Decode a whole buffer without any schema knowledge.
///
/// Length-delimited payloads are classified by content: a payload that
/// decodes completely as a non-empty nested message becomes a `Message`,
/// printable UTF-8 becomes a `String`, anything else stays `Bytes`.
///
/// # Errors
/// Returns the first `DecodeError` met; nothing is returned partially.
pub fn decode(buf: &[u8]) -> Result<SerializedMessage<'_>, DecodeError> {
    decode_window(buf, 0..buf.len(), 0, None)
}

/// Decode `buf[offset..]`, returning the message and the bytes consumed.
pub fn decode_at(buf: &[u8], offset: usize) -> Result<(SerializedMessage<'_>, usize), DecodeError> {
    if offset > buf.len() {
        return Err(DecodeError::TruncatedBuffer {
            offset: buf.len(),
            needed: offset - buf.len(),
            available: 0,
        });
    }
    let message = decode_window(buf, offset..buf.len(), 0, None)?;
    Ok((message, buf.len() - offset))
}

/// Decode a buffer, interpreting top-level length-delimited fields with the
/// kinds recorded in `schema`.
///
/// A field the schema declares as `string` must be valid UTF-8 and a field
/// declared as `message` must decode; otherwise decoding fails. Schema kinds
/// that contradict the wire type are ignored and the value is inferred.
pub fn decode_with_schema<'a>(
    buf: &'a [u8],
    schema: &PacketSchema,
) -> Result<SerializedMessage<'a>, DecodeError> {
    decode_window(buf, 0..buf.len(), 0, Some(schema))
}

fn decode_window<'a>(
    buf: &'a [u8],
    window: Range<usize>,
    depth: usize,
    schema: Option<&PacketSchema>,
) -> Result<SerializedMessage<'a>, DecodeError> {
    if depth > layout::MAX_NESTING_DEPTH {
        return Err(DecodeError::NestingTooDeep {
            limit: layout::MAX_NESTING_DEPTH,
        });
    }

    let mut reader = WireReader::window(buf, window);
    let mut message = SerializedMessage::new();
    while !reader.is_at_end() {
        let key = reader.read_key()?;
        let value = match key.wire_type {
            layout::WIRE_VARINT => MessageValue::Varint(reader.read_varint()?),
            layout::WIRE_FIXED64 => MessageValue::Double(reader.read_f64()?),
            layout::WIRE_FIXED32 => MessageValue::Float(reader.read_f32()?),
            layout::WIRE_LENGTH_DELIMITED => {
                let payload = reader.read_length_delimited()?;
                let expected = schema.and_then(|schema| schema.kind_of(key.field_id));
                read_payload(buf, payload, key.field_id, depth, expected)?
            }
            wire_type => {
                return Err(DecodeError::UnsupportedWireType {
                    wire_type,
                    offset: key.offset,
                });
            }
        };
        message.push(key.field_id, value);
    }
    Ok(message)
}

fn read_payload<'a>(
    buf: &'a [u8],
    payload: Range<usize>,
    field_id: u32,
    depth: usize,
    expected: Option<FieldKind>,
) -> Result<MessageValue<'a>, DecodeError> {
    let bytes = &buf[payload.clone()];
    match expected {
        Some(FieldKind::String) => std::str::from_utf8(bytes)
            .map(MessageValue::String)
            .map_err(|_| DecodeError::InvalidEncoding {
                field_id,
                offset: payload.start,
            }),
        Some(FieldKind::Bytes) => Ok(MessageValue::Bytes(bytes)),
        Some(FieldKind::Message) => decode_window(buf, payload, depth + 1, None)
            .map(MessageValue::Message)
            .map_err(|source| DecodeError::NestedDecodeError {
                field_id,
                source: Box::new(source),
            }),
        _ => infer_payload(buf, payload, depth),
    }
}

/// Only `NestingTooDeep` escapes; any other nested failure means the payload
/// is not a message.
fn infer_payload(
    buf: &[u8],
    payload: Range<usize>,
    depth: usize,
) -> Result<MessageValue<'_>, DecodeError> {
    let bytes = &buf[payload.clone()];
    match decode_window(buf, payload, depth + 1, None) {
        Ok(nested) if !nested.is_empty() => return Ok(MessageValue::Message(nested)),
        Err(err @ DecodeError::NestingTooDeep { .. }) => return Err(err),
        _ => {}
    }
    Ok(match std::str::from_utf8(bytes) {
        Ok(text) if is_printable(text) => MessageValue::String(text),
        _ => MessageValue::Bytes(bytes),
    })
}

fn is_printable(text: &str) -> bool {
    text.chars()
        .all(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
}
