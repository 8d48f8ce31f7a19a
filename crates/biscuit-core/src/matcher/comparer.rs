use super::context::CompareContext;
use super::error::MatchError;
use super::schema::{FieldData, PacketSchema};
use crate::message::SerializedMessage;
use crate::registry::PacketId;

/// A decoded packet handed to comparers.
#[derive(Debug, Clone)]
pub struct Packet<'a> {
    pub id: PacketId,
    pub header: SerializedMessage<'a>,
    pub data: SerializedMessage<'a>,
}

/// Inspects decoded packets and feeds evidence back through the context.
pub trait Comparer: Send {
    fn name(&self) -> &str;

    fn compare(
        &mut self,
        cx: &CompareContext<'_>,
        packet: &Packet<'_>,
    ) -> Result<(), MatchError>;
}

pub const DEFAULT_MIN_SCORE: f64 = 0.75;

/// Identifies unknown packet IDs whose data shape fits a known schema.
///
/// Each known schema is scored with [`PacketSchema::score`]; the best score
/// at or above `min_score` wins, ties going to the lowest packet ID. A zero
/// score never identifies, whatever `min_score` is. The
/// packet is then identified under the winner's current name, one field at
/// a time.
///
/// [`PacketSchema::score`]: super::PacketSchema::score
#[derive(Debug, Clone)]
pub struct ShapeComparer {
    min_score: f64,
}

impl ShapeComparer {
    pub fn new(min_score: f64) -> Self {
        Self { min_score }
    }
}

impl Default for ShapeComparer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SCORE)
    }
}

impl Comparer for ShapeComparer {
    fn name(&self) -> &str {
        "shape"
    }

    fn compare(
        &mut self,
        cx: &CompareContext<'_>,
        packet: &Packet<'_>,
    ) -> Result<(), MatchError> {
        if cx.is_known(packet.id) {
            return Ok(());
        }
        let shape = packet.data.shape();
        if shape.is_empty() {
            return Ok(());
        }

        let mut best: Option<(f64, PacketId, String, PacketSchema)> = None;
        for (id, name, schema) in cx.candidates()? {
            let score = schema.score(&shape);
            let better = match &best {
                None => true,
                Some((best_score, best_id, _, _)) => {
                    score > *best_score || (score == *best_score && id < *best_id)
                }
            };
            if better {
                best = Some((score, id, name, schema));
            }
        }

        let Some((score, matched_id, name, schema)) = best else {
            return Ok(());
        };
        if score <= 0.0 || score < self.min_score {
            log::debug!(
                "packet {} closest to {} ({}) with score {:.2}, below {:.2}",
                packet.id,
                name,
                matched_id,
                score,
                self.min_score
            );
            return Ok(());
        }

        cx.host().info(&format!(
            "identified packet {} as {} (shape of {}, score {:.2})",
            packet.id, name, matched_id, score
        ));
        for (field_id, kind) in shape {
            let field_name = schema
                .field(field_id)
                .map(|field| field.name().to_string())
                .unwrap_or_else(|| format!("field_{field_id}"));
            let field = FieldData::new(field_name, kind.as_str(), field_id);
            cx.identify(&name, packet.id, &field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Comparer, Packet, ShapeComparer};
    use crate::host::DefaultHost;
    use crate::matcher::context::CompareContext;
    use crate::matcher::schema::FieldData;
    use crate::registry::Registry;
    use crate::wire::decode;
    use crate::wire::encode::MessageBuilder;

    fn seeded() -> crate::registry::SharedRegistry {
        let registry = Registry::shared();
        let host = DefaultHost::default();
        let cx = CompareContext::new(&registry, &host);
        cx.identify("Move", 10, &FieldData::new("x", "float", 1))
            .unwrap();
        cx.identify("Move", 10, &FieldData::new("y", "float", 2))
            .unwrap();
        cx.identify("Chat", 11, &FieldData::new("text", "string", 1))
            .unwrap();
        registry
    }

    #[test]
    fn identifies_matching_shape() {
        let registry = seeded();
        let host = DefaultHost::default();
        let bytes = MessageBuilder::new().float(1, 1.0).float(2, 2.0).build();
        let packet = Packet {
            id: 40,
            header: Default::default(),
            data: decode(&bytes).unwrap(),
        };

        let mut comparer = ShapeComparer::default();
        let cx = CompareContext::new(&registry, &host);
        comparer.compare(&cx, &packet).unwrap();

        let registry = registry.lock().unwrap();
        assert_eq!(registry.name_of(40), Some("Move"));
        let schema = registry.schema(40).unwrap();
        assert_eq!(schema.field(1).unwrap().name(), "x");
        assert_eq!(schema.field(2).unwrap().name(), "y");
    }

    #[test]
    fn ignores_poor_match() {
        let registry = seeded();
        let host = DefaultHost::default();
        let bytes = MessageBuilder::new()
            .float(1, 1.0)
            .varint(7, 3)
            .varint(8, 4)
            .build();
        let packet = Packet {
            id: 41,
            header: Default::default(),
            data: decode(&bytes).unwrap(),
        };

        let mut comparer = ShapeComparer::default();
        let cx = CompareContext::new(&registry, &host);
        comparer.compare(&cx, &packet).unwrap();

        assert!(!registry.lock().unwrap().is_known(41u16));
    }

    #[test]
    fn leaves_known_packets_alone() {
        let registry = seeded();
        let host = DefaultHost::default();
        let bytes = MessageBuilder::new().string(1, "hello").build();
        let packet = Packet {
            id: 10,
            header: Default::default(),
            data: decode(&bytes).unwrap(),
        };

        let mut comparer = ShapeComparer::new(0.0);
        let cx = CompareContext::new(&registry, &host);
        comparer.compare(&cx, &packet).unwrap();

        let registry = registry.lock().unwrap();
        assert_eq!(registry.name_of(10), Some("Move"));
        assert_eq!(registry.schema(10).unwrap().len(), 2);
    }

    #[test]
    fn unknown_fields_get_placeholder_names() {
        let registry = seeded();
        let host = DefaultHost::default();
        let bytes = MessageBuilder::new()
            .string(1, "ok")
            .varint(3, 1)
            .build();
        let packet = Packet {
            id: 42,
            header: Default::default(),
            data: decode(&bytes).unwrap(),
        };

        let mut comparer = ShapeComparer::new(0.5);
        let cx = CompareContext::new(&registry, &host);
        comparer.compare(&cx, &packet).unwrap();

        let registry = registry.lock().unwrap();
        assert_eq!(registry.name_of(42), Some("Chat"));
        assert_eq!(registry.schema(42).unwrap().field(3).unwrap().name(), "field_3");
    }

    #[test]
    fn zero_score_never_identifies() {
        let registry = seeded();
        let host = DefaultHost::default();
        let bytes = MessageBuilder::new().varint(9, 1).build();
        let packet = Packet {
            id: 50,
            header: Default::default(),
            data: decode(&bytes).unwrap(),
        };

        let mut comparer = ShapeComparer::new(0.0);
        let cx = CompareContext::new(&registry, &host);
        comparer.compare(&cx, &packet).unwrap();

        let registry = registry.lock().unwrap();
        assert!(!registry.is_known(50u16));
        assert!(registry.schema(50).is_none());
    }
}
