use thiserror::Error;

/// Errors returned by wire decoding.
///
/// Every variant is fatal for the buffer being decoded; no partial message
/// is handed back to the caller.
///
/// # Examples
/// ```
/// use biscuit_core::DecodeError;
///
/// let err = DecodeError::TruncatedBuffer { offset: 3, needed: 4, available: 1 };
/// assert!(err.to_string().contains("truncated buffer"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed varint at offset {offset}")]
    MalformedVarint { offset: usize },
    #[error("truncated buffer at offset {offset}: need {needed} bytes, got {available}")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("invalid text encoding in field {field_id} at offset {offset}")]
    InvalidEncoding { field_id: u32, offset: usize },
    #[error("nested message in field {field_id} failed to decode: {source}")]
    NestedDecodeError {
        field_id: u32,
        #[source]
        source: Box<DecodeError>,
    },
    #[error("nesting deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
    #[error("invalid field id {field_id} at offset {offset}")]
    InvalidFieldId { field_id: u64, offset: usize },
    #[error("unsupported wire type {wire_type} at offset {offset}")]
    UnsupportedWireType { wire_type: u8, offset: usize },
}
