use serde_json::Value;

use crate::message::{MessageValue, SerializedMessage};
use crate::registry::Registry;
use crate::{
    FieldSummary, IdMapping, OneofSummary, RegistrySummary, SchemaFieldSummary, SchemaSummary,
};

/// Flattens a decoded message into report entries, one per stored value in
/// decode order.
pub(crate) fn summarize_message(message: &SerializedMessage<'_>) -> Vec<FieldSummary> {
    message
        .iter()
        .map(|(id, value)| {
            let (value_json, fields) = match value {
                MessageValue::Varint(value) => (Some(Value::from(*value)), Vec::new()),
                MessageValue::Float(value) => (Some(Value::from(f64::from(*value))), Vec::new()),
                MessageValue::Double(value) => (Some(Value::from(*value)), Vec::new()),
                MessageValue::String(value) => (Some(Value::from(*value)), Vec::new()),
                MessageValue::Bytes(value) => (Some(Value::from(hex::encode(value))), Vec::new()),
                MessageValue::Message(nested) => (None, summarize_message(nested)),
            };
            FieldSummary {
                id,
                kind: value.kind(),
                value: value_json,
                fields,
            }
        })
        .collect()
}

/// Registry snapshot with every collection in a stable order.
pub(crate) fn summarize_registry(registry: &Registry) -> RegistrySummary {
    let mut id_map: Vec<IdMapping> = registry
        .id_map()
        .iter()
        .map(|(id, name)| IdMapping {
            id: *id,
            name: name.clone(),
        })
        .collect();
    id_map.sort_by_key(|mapping| mapping.id);

    let mut schemas: Vec<SchemaSummary> = registry
        .schemas()
        .map(|(packet_id, schema)| SchemaSummary {
            packet_id,
            name: registry.name_of(packet_id).map(str::to_string),
            fields: schema
                .fields()
                .map(|(field_id, field)| SchemaFieldSummary {
                    field_id,
                    kind: field.kind,
                    names: field.names.clone(),
                })
                .collect(),
            oneofs: schema
                .oneofs()
                .into_iter()
                .map(|(name, field_ids)| OneofSummary { name, field_ids })
                .collect(),
        })
        .collect();
    schemas.sort_by_key(|schema| schema.packet_id);

    RegistrySummary {
        known_names: registry.known_names().to_vec(),
        known_ids: registry.known_ids().to_vec(),
        id_map,
        schemas,
    }
}
