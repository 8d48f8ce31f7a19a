//! Biscuit core library: schema-less packet decoding and identification.
//!
//! This crate decodes protobuf-style binary packets without a schema and
//! infers packet identity from what it sees. The layers are:
//! - `wire`: byte-oriented decoder (layout/reader/parser), side-effect free.
//! - `message`: decoded messages with typed accessors over borrowed input.
//! - `registry` and `matcher`: known packets, per-packet schemas and the
//!   comparers that fold field evidence into them.
//! - `capture`: packet sources; all capture I/O lives there.
//!
//! Invariants:
//! - Decoding never copies payloads; strings, bytes and nested messages
//!   borrow the input buffer.
//! - The registry only grows; a field's first-seen kind is never replaced.
//! - Report outputs are deterministic and stable across runs.
//!
//! # Examples
//! ```
//! use biscuit_core::decode;
//!
//! let message = decode(&[0x08, 0x96, 0x01, 0x12, 0x02, b'h', b'i'])?;
//! assert_eq!(message.varint(1), Some(150));
//! assert_eq!(message.string(2), Some("hi"));
//! # Ok::<(), biscuit_core::DecodeError>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
pub mod capture;
pub mod config;
pub mod host;
pub mod matcher;
pub mod message;
pub mod registry;
pub mod wire;

pub use analysis::{
    AnalysisError, analyze_capture_file, analyze_source, decode_to_report, matcher_from_config,
};
pub use capture::{JsonLinesSource, PacketEvent, PacketSource, SourceError};
pub use config::{Config, ConfigError, Hint, MatchingConfig};
pub use host::{DefaultHost, Host, HostError};
pub use matcher::{
    CompareContext, Comparer, FieldData, FieldUpdate, MatchError, Matcher, Packet, PacketSchema,
    ShapeComparer,
};
pub use message::{FieldKind, MessageValue, SerializedMessage, UnknownFieldType};
pub use registry::{PacketId, PacketKey, Registry, SharedRegistry};
pub use wire::{DecodeError, decode, decode_at, decode_with_schema};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Decoded view of a single buffer.
///
/// # Examples
/// ```
/// use biscuit_core::make_decode_report;
///
/// let report = make_decode_report("packet.bin", 12);
/// assert_eq!(report.report_version, biscuit_core::REPORT_VERSION);
/// assert!(report.fields.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    pub input: InputInfo,
    /// Packet ID whose schema guided the decode, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_id: Option<PacketId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_name: Option<String>,
    /// One entry per decoded value, in decode order.
    pub fields: Vec<FieldSummary>,
}

/// A decoded value. Nested messages carry their own fields instead of a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub id: u32,
    pub kind: FieldKind,
    /// Scalars as JSON numbers, strings as-is, bytes as lowercase hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSummary>,
}

/// Result of running a capture through the matcher.
///
/// # Examples
/// ```
/// use biscuit_core::make_match_report;
///
/// let report = make_match_report("capture.jsonl", 123);
/// assert_eq!(report.generated_at, biscuit_core::DEFAULT_GENERATED_AT);
/// assert!(report.packets.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp derived from the capture, never the wall clock.
    pub generated_at: String,
    /// Input capture metadata.
    pub input: InputInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Per-ID packet counts ordered by packet ID.
    pub packets: Vec<PacketSummary>,
    /// Registry state after the whole capture was processed.
    pub registry: RegistrySummary,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use biscuit_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "biscuit".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "biscuit");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "biscuit").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided by the caller.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Basic capture summary (timestamps may be absent).
///
/// # Examples
/// ```
/// use biscuit_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     packets_total: 10,
///     decode_errors: 1,
///     time_start: None,
///     time_end: None,
/// };
/// assert_eq!(summary.packets_total, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Total packet count observed in the capture.
    pub packets_total: u64,
    /// Packets whose header or data failed to decode.
    pub decode_errors: u64,
    /// RFC3339 timestamp of the earliest packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the latest packet (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketSummary {
    pub id: PacketId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub count: u64,
    pub identified: bool,
}

/// Registry snapshot. Names and IDs keep insertion order; mappings and
/// schemas are ordered by packet ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySummary {
    pub known_names: Vec<String>,
    pub known_ids: Vec<PacketId>,
    pub id_map: Vec<IdMapping>,
    pub schemas: Vec<SchemaSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdMapping {
    pub id: PacketId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub packet_id: PacketId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: Vec<SchemaFieldSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub oneofs: Vec<OneofSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFieldSummary {
    pub field_id: u32,
    pub kind: FieldKind,
    /// Primary name first, then candidates in the order they were reported.
    pub names: Vec<String>,
}

/// Field IDs that were reported under the same name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneofSummary {
    pub name: String,
    pub field_ids: Vec<u32>,
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "biscuit".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Build a decode report with base fields filled and no fields.
pub fn make_decode_report(input_path: &str, input_bytes: u64) -> DecodeReport {
    DecodeReport {
        report_version: REPORT_VERSION,
        tool: tool_info(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        packet_id: None,
        packet_name: None,
        fields: vec![],
    }
}

/// Build a match report with base fields filled and empty aggregates.
pub fn make_match_report(input_path: &str, input_bytes: u64) -> MatchReport {
    MatchReport {
        report_version: REPORT_VERSION,
        tool: tool_info(),
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_summary: None,
        packets: vec![],
        registry: RegistrySummary::default(),
    }
}
