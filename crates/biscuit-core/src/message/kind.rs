use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decoded kind of a field value.
///
/// Fixed32 fields decode as `Float`, fixed64 as `Double`; length-delimited
/// fields become `String`, `Bytes` or `Message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Varint,
    Float,
    Double,
    String,
    Bytes,
    Message,
}

impl FieldKind {
    pub const ALL: [FieldKind; 6] = [
        FieldKind::Varint,
        FieldKind::Float,
        FieldKind::Double,
        FieldKind::String,
        FieldKind::Bytes,
        FieldKind::Message,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Varint => "varint",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Message => "message",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field type '{0}'")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldKind {
    type Err = UnknownFieldType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownFieldType(value.to_string()))
    }
}
