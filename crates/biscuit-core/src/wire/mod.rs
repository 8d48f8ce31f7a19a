//! Schema-less wire decoding.
//!
//! The format is a sequence of `(key, value)` records where the key varint
//! carries the field ID and a 3-bit wire type:
//! - `0` varint, `1` fixed64, `2` length-delimited, `5` fixed32.
//!
//! Layering:
//! - `layout`: wire constants (source of truth)
//! - `reader`: bounded cursor over a window of the input
//! - `parser`: message decoding and payload classification
//! - `error`: explicit decode errors
//! - `encode`: builder for producing buffers
//!
//! Decoding is pure; nested messages and payloads borrow windows of the
//! input buffer instead of copying it.

pub mod encode;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::DecodeError;
pub use parser::{decode, decode_at, decode_with_schema};
