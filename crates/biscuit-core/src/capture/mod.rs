//! Packet capture sources.
//!
//! A source yields raw packets (ID, header bytes, data bytes and an optional
//! timestamp) for the analysis pipeline. I/O lives here; decoding does not.

mod jsonl;

pub use jsonl::JsonLinesSource;

use thiserror::Error;

use crate::registry::PacketId;

#[derive(Debug, Clone, PartialEq)]
pub struct PacketEvent {
    pub ts: Option<f64>,
    pub id: PacketId,
    pub header: Vec<u8>,
    pub data: Vec<u8>,
}

pub trait PacketSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid record on line {line}: {message}")]
    Record { line: usize, message: String },
    #[error("invalid base64 in '{field}' on line {line}: {message}")]
    Base64 {
        line: usize,
        field: &'static str,
        message: String,
    },
}
