//! Packet identification.
//!
//! The matcher folds field evidence into per-packet schemas and records
//! packet names and IDs in an injected [`Registry`]. Decoded packets are run
//! through a list of [`Comparer`]s, each of which may identify the packet
//! through its [`CompareContext`].
//!
//! Every `identify` call is applied as a whole or not at all: the field type
//! is validated first, then the schema update and the registry record happen
//! under a single lock. When a field ID is reported again with a different
//! kind, the first kind wins and the conflict is logged as a warning.
//!
//! [`Registry`]: crate::Registry

use std::sync::Arc;

mod comparer;
mod context;
mod error;
mod schema;

pub use comparer::{Comparer, DEFAULT_MIN_SCORE, Packet, ShapeComparer};
pub use context::CompareContext;
pub use error::MatchError;
pub use schema::{FieldData, FieldUpdate, PacketSchema, SchemaField};

use crate::config::Hint;
use crate::host::{DefaultHost, Host};
use crate::message::SerializedMessage;
use crate::registry::{PacketId, PacketKey, Registry, SharedRegistry};
use crate::wire;

pub struct Matcher {
    registry: SharedRegistry,
    host: Arc<dyn Host>,
    comparers: Vec<Box<dyn Comparer>>,
}

impl Matcher {
    pub fn new(registry: SharedRegistry) -> Self {
        Self::with_host(registry, Arc::new(DefaultHost::default()))
    }

    pub fn with_host(registry: SharedRegistry, host: Arc<dyn Host>) -> Self {
        Self {
            registry,
            host,
            comparers: Vec::new(),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    pub fn add_comparer(&mut self, comparer: Box<dyn Comparer>) {
        self.comparers.push(comparer);
    }

    /// Folds one field of evidence into `packet_id`'s schema and records the
    /// packet under `packet_name`.
    ///
    /// # Examples
    /// ```
    /// use biscuit_core::{FieldData, FieldUpdate, Matcher, Registry};
    ///
    /// let matcher = Matcher::new(Registry::shared());
    /// let update = matcher.identify("Ping", 5, &FieldData::new("seq", "varint", 1))?;
    /// assert_eq!(update, FieldUpdate::Added);
    /// assert!(matcher.is_known("Ping"));
    /// assert!(matcher.is_known(5u16));
    /// # Ok::<(), biscuit_core::MatchError>(())
    /// ```
    ///
    /// # Errors
    /// `MatchError::UnknownFieldType` when `field_type` is not a known kind;
    /// the registry is left untouched.
    pub fn identify(
        &self,
        packet_name: &str,
        packet_id: PacketId,
        field: &FieldData,
    ) -> Result<FieldUpdate, MatchError> {
        context::identify(&self.registry, self.host(), packet_name, packet_id, field)
    }

    /// Records a packet name and ID without any field evidence.
    pub fn declare(&self, packet_name: &str, packet_id: PacketId) -> Result<(), MatchError> {
        context::lock(&self.registry)?.record(packet_name, packet_id);
        Ok(())
    }

    /// Never fails; a poisoned registry reads as empty.
    pub fn is_known<'k>(&self, key: impl Into<PacketKey<'k>>) -> bool {
        context::is_known(&self.registry, key.into())
    }

    pub fn schema(&self, packet_id: PacketId) -> Option<PacketSchema> {
        let registry = self.registry.lock().ok()?;
        registry.schema(packet_id).cloned()
    }

    /// A copy of the registry as it stands.
    pub fn snapshot(&self) -> Result<Registry, MatchError> {
        Ok(context::lock(&self.registry)?.clone())
    }

    /// Applies configured hints. Returns how many fields were applied; a
    /// failing field is logged and skipped. A hint that contributes no field
    /// still has its name and ID recorded.
    pub fn seed(&self, hints: &[Hint]) -> Result<usize, MatchError> {
        let mut applied = 0;
        for hint in hints {
            let mut applied_here = 0;
            for field in &hint.fields {
                match self.identify(&hint.name, hint.id, field) {
                    Ok(_) => applied_here += 1,
                    Err(MatchError::RegistryPoisoned) => return Err(MatchError::RegistryPoisoned),
                    Err(err) => self.host.warn(&format!(
                        "skipping hint field {} of {} ({}): {err}",
                        field.field_id, hint.name, hint.id
                    )),
                }
            }
            if applied_here == 0 {
                self.declare(&hint.name, hint.id)?;
            }
            applied += applied_here;
        }
        log::info!("seeded {applied} field(s) from {} hint(s)", hints.len());
        Ok(applied)
    }

    /// Decodes `data` using the schema known for `packet_id`, if any.
    pub fn decode_known<'a>(
        &self,
        packet_id: PacketId,
        data: &'a [u8],
    ) -> Result<SerializedMessage<'a>, MatchError> {
        let decoded = match self.schema(packet_id) {
            Some(schema) => wire::decode_with_schema(data, &schema),
            None => wire::decode(data),
        };
        decoded.map_err(|source| MatchError::Decode {
            context: "packet data",
            source,
        })
    }

    /// Decodes a packet and runs it through every comparer. The data is
    /// decoded with the packet's schema when one is known.
    ///
    /// A failing comparer is logged and does not stop the others.
    ///
    /// # Errors
    /// `MatchError::Decode` when the header or data cannot be decoded.
    pub fn compare(&mut self, packet_id: PacketId, header: &[u8], data: &[u8]) -> Result<(), MatchError> {
        let header = wire::decode(header).map_err(|source| MatchError::Decode {
            context: "packet header",
            source,
        })?;
        let data = self.decode_known(packet_id, data)?;
        let packet = Packet {
            id: packet_id,
            header,
            data,
        };

        let cx = CompareContext::new(&self.registry, self.host.as_ref());
        for comparer in &mut self.comparers {
            if let Err(err) = comparer.compare(&cx, &packet) {
                log::warn!(
                    "comparer '{}' failed on packet {}: {err}",
                    comparer.name(),
                    packet_id
                );
            }
        }
        Ok(())
    }
}
