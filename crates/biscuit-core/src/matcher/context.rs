use std::sync::MutexGuard;

use super::error::MatchError;
use super::schema::{FieldData, FieldUpdate, PacketSchema};
use crate::host::Host;
use crate::message::FieldKind;
use crate::registry::{PacketId, PacketKey, Registry, SharedRegistry};

/// Registry access handed to comparers for the duration of one packet.
pub struct CompareContext<'m> {
    registry: &'m SharedRegistry,
    host: &'m dyn Host,
}

impl<'m> CompareContext<'m> {
    pub fn new(registry: &'m SharedRegistry, host: &'m dyn Host) -> Self {
        Self { registry, host }
    }

    pub fn host(&self) -> &dyn Host {
        self.host
    }

    pub fn identify(
        &self,
        packet_name: &str,
        packet_id: PacketId,
        field: &FieldData,
    ) -> Result<FieldUpdate, MatchError> {
        identify(self.registry, self.host, packet_name, packet_id, field)
    }

    pub fn is_known<'k>(&self, key: impl Into<PacketKey<'k>>) -> bool {
        is_known(self.registry, key.into())
    }

    pub fn name_of(&self, packet_id: PacketId) -> Option<String> {
        let registry = self.registry.lock().ok()?;
        registry.name_of(packet_id).map(str::to_string)
    }

    pub fn schema(&self, packet_id: PacketId) -> Option<PacketSchema> {
        let registry = self.registry.lock().ok()?;
        registry.schema(packet_id).cloned()
    }

    /// Named, non-empty schemas ordered by packet ID.
    pub fn candidates(&self) -> Result<Vec<(PacketId, String, PacketSchema)>, MatchError> {
        let registry = lock(self.registry)?;
        let mut candidates: Vec<_> = registry
            .schemas()
            .filter(|(_, schema)| !schema.is_empty())
            .filter_map(|(id, schema)| {
                registry
                    .name_of(id)
                    .map(|name| (id, name.to_string(), schema.clone()))
            })
            .collect();
        candidates.sort_by_key(|(id, _, _)| *id);
        Ok(candidates)
    }
}

pub(crate) fn lock(registry: &SharedRegistry) -> Result<MutexGuard<'_, Registry>, MatchError> {
    registry.lock().map_err(|_| MatchError::RegistryPoisoned)
}

/// Folds one field into the packet's schema, then records the packet.
///
/// The field type is validated before the registry is touched, so a failed
/// call leaves it unchanged. A kind conflict keeps the first-seen kind.
pub(crate) fn identify(
    registry: &SharedRegistry,
    host: &dyn Host,
    packet_name: &str,
    packet_id: PacketId,
    field: &FieldData,
) -> Result<FieldUpdate, MatchError> {
    let kind: FieldKind = field.field_type.parse()?;
    let mut registry = lock(registry)?;

    let update = registry
        .schema_mut(packet_id)
        .insert_field(field.field_id, kind, &field.field_name);
    if let FieldUpdate::Conflict { existing, rejected } = update {
        host.warn(&format!(
            "packet {packet_name} ({packet_id}): field {} '{}' reported as {rejected}, keeping {existing}",
            field.field_id, field.field_name
        ));
    }
    registry.record(packet_name, packet_id);
    log::debug!(
        "identify {packet_name} ({packet_id}) field {} -> {update:?}",
        field.field_id
    );
    Ok(update)
}

pub(crate) fn is_known(registry: &SharedRegistry, key: PacketKey<'_>) -> bool {
    registry
        .lock()
        .map(|registry| registry.is_known(key))
        .unwrap_or(false)
}
