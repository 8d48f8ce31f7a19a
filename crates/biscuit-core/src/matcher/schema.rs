use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::message::FieldKind;

/// Field evidence supplied by an identification call.
///
/// A `field_name` repeated across several field IDs marks those fields as
/// alternatives of a oneof.
///
/// # Examples
/// ```
/// use biscuit_core::FieldData;
///
/// let field = FieldData::new("sequence", "varint", 1);
/// assert_eq!(field.field_id, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldData {
    pub field_name: String,
    pub field_type: String,
    pub field_id: u32,
}

impl FieldData {
    pub fn new(field_name: impl Into<String>, field_type: impl Into<String>, field_id: u32) -> Self {
        Self {
            field_name: field_name.into(),
            field_type: field_type.into(),
            field_id,
        }
    }
}

/// One inferred field slot of a packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub kind: FieldKind,
    /// Candidate names, first-seen first.
    pub names: Vec<String>,
}

impl SchemaField {
    /// The first name this slot was reported under.
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }
}

/// Result of folding one field into a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate {
    /// The field ID was new.
    Added,
    /// The field ID existed with the same kind; the name joined its candidates.
    AddedCandidate,
    /// Nothing new was learned.
    Unchanged,
    /// The field ID exists with another kind; the first kind is kept.
    Conflict {
        existing: FieldKind,
        rejected: FieldKind,
    },
}

/// Partial schema accumulated for one packet ID.
///
/// Any snapshot is a valid schema; there is no finalize step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketSchema {
    fields: IndexMap<u32, SchemaField>,
}

impl PacketSchema {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, field_id: u32) -> Option<&SchemaField> {
        self.fields.get(&field_id)
    }

    pub fn kind_of(&self, field_id: u32) -> Option<FieldKind> {
        self.field(field_id).map(|field| field.kind)
    }

    /// Fields in first-observed order.
    pub fn fields(&self) -> impl Iterator<Item = (u32, &SchemaField)> {
        self.fields.iter().map(|(id, field)| (*id, field))
    }

    /// Folds one field observation into the schema.
    ///
    /// On a kind conflict the schema is left untouched.
    pub fn insert_field(&mut self, field_id: u32, kind: FieldKind, name: &str) -> FieldUpdate {
        match self.fields.get_mut(&field_id) {
            None => {
                self.fields.insert(
                    field_id,
                    SchemaField {
                        kind,
                        names: vec![name.to_string()],
                    },
                );
                FieldUpdate::Added
            }
            Some(field) if field.kind != kind => FieldUpdate::Conflict {
                existing: field.kind,
                rejected: kind,
            },
            Some(field) if field.names.iter().any(|known| known == name) => {
                FieldUpdate::Unchanged
            }
            Some(field) => {
                field.names.push(name.to_string());
                FieldUpdate::AddedCandidate
            }
        }
    }

    /// Names carried by more than one field ID, with those IDs.
    ///
    /// Such fields are alternatives of a single logical oneof.
    pub fn oneofs(&self) -> Vec<(String, Vec<u32>)> {
        let mut groups: IndexMap<&str, Vec<u32>> = IndexMap::new();
        for (id, field) in &self.fields {
            for name in &field.names {
                groups.entry(name.as_str()).or_default().push(*id);
            }
        }
        groups
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(name, ids)| (name.to_string(), ids))
            .collect()
    }

    /// How well an observed message shape fits this schema, in `0.0..=1.0`.
    ///
    /// Computed as `matched / (schema fields + unexplained observed fields)`,
    /// where a field matches when its ID is known with the same kind.
    pub fn score(&self, shape: &[(u32, FieldKind)]) -> f64 {
        if self.fields.is_empty() {
            return 0.0;
        }
        let matched = shape
            .iter()
            .filter(|(id, kind)| self.kind_of(*id) == Some(*kind))
            .count();
        let unexplained = shape.len() - matched;
        matched as f64 / (self.fields.len() + unexplained) as f64
    }
}
