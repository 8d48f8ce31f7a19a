//! Decoded messages and their typed field views.
//!
//! A `SerializedMessage` keeps every decoded value in decode order. Values
//! sharing a field ID collapse into one slot: single accessors (`varint`,
//! `string`, ...) read the first value of the slot and return `None` when it
//! has a different kind, bulk accessors (`all_varint`, `all_string`, ...)
//! return every value of the requested kind in decode order.
//!
//! Lookups never fail. A missing field and a kind mismatch are both a plain
//! `None`, since the schema is inferred rather than declared.

use indexmap::IndexMap;

mod kind;
mod value;

pub use kind::{FieldKind, UnknownFieldType};
pub use value::MessageValue;

/// A message decoded without a schema, borrowing from its input buffer.
///
/// # Examples
/// ```
/// let message = biscuit_core::decode(&[0x08, 0x96, 0x01])?;
/// assert_eq!(message.varint(1), Some(150));
/// assert_eq!(message.string(1), None);
/// # Ok::<(), biscuit_core::DecodeError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedMessage<'a> {
    entries: Vec<(u32, MessageValue<'a>)>,
    slots: IndexMap<u32, Vec<usize>>,
}

impl<'a> SerializedMessage<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, field_id: u32, value: MessageValue<'a>) {
        let index = self.entries.len();
        self.entries.push((field_id, value));
        self.slots.entry(field_id).or_default().push(index);
    }

    /// Number of decoded values, counting every repeat.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, field_id: u32) -> bool {
        self.slots.contains_key(&field_id)
    }

    /// Distinct field IDs in first-seen order.
    pub fn keys(&self) -> Vec<u32> {
        self.slots.keys().copied().collect()
    }

    /// Every `(field_id, value)` pair in decode order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &MessageValue<'a>)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    /// First value stored for `field_id`, whatever its kind.
    pub fn get(&self, field_id: u32) -> Option<&MessageValue<'a>> {
        let index = *self.slots.get(&field_id)?.first()?;
        self.entries.get(index).map(|(_, value)| value)
    }

    /// All values stored for `field_id`, in decode order.
    pub fn values(&self, field_id: u32) -> Vec<&MessageValue<'a>> {
        self.slots
            .get(&field_id)
            .map(|indices| {
                indices
                    .iter()
                    .filter_map(|index| self.entries.get(*index))
                    .map(|(_, value)| value)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `(field_id, kind)` of every slot's first value, in first-seen order.
    pub fn shape(&self) -> Vec<(u32, FieldKind)> {
        self.slots
            .iter()
            .filter_map(|(id, indices)| {
                let index = *indices.first()?;
                self.entries.get(index).map(|(_, value)| (*id, value.kind()))
            })
            .collect()
    }

    pub fn varint(&self, field_id: u32) -> Option<u64> {
        self.get(field_id)?.as_varint()
    }

    pub fn float(&self, field_id: u32) -> Option<f32> {
        self.get(field_id)?.as_float()
    }

    pub fn double(&self, field_id: u32) -> Option<f64> {
        self.get(field_id)?.as_double()
    }

    pub fn string(&self, field_id: u32) -> Option<&'a str> {
        self.get(field_id)?.as_str()
    }

    pub fn bytes(&self, field_id: u32) -> Option<&'a [u8]> {
        self.get(field_id)?.as_bytes()
    }

    pub fn message(&self, field_id: u32) -> Option<&SerializedMessage<'a>> {
        self.get(field_id)?.as_message()
    }

    pub fn all_varint(&self) -> Vec<(u32, u64)> {
        self.collect_kind(MessageValue::as_varint)
    }

    pub fn all_float(&self) -> Vec<(u32, f32)> {
        self.collect_kind(MessageValue::as_float)
    }

    pub fn all_double(&self) -> Vec<(u32, f64)> {
        self.collect_kind(MessageValue::as_double)
    }

    pub fn all_string(&self) -> Vec<(u32, &'a str)> {
        self.collect_kind(MessageValue::as_str)
    }

    pub fn all_bytes(&self) -> Vec<(u32, &'a [u8])> {
        self.collect_kind(MessageValue::as_bytes)
    }

    pub fn all_message(&self) -> Vec<(u32, &SerializedMessage<'a>)> {
        self.entries
            .iter()
            .filter_map(|(id, value)| value.as_message().map(|message| (*id, message)))
            .collect()
    }

    fn collect_kind<T>(&self, extract: impl Fn(&MessageValue<'a>) -> Option<T>) -> Vec<(u32, T)> {
        self.entries
            .iter()
            .filter_map(|(id, value)| extract(value).map(|value| (*id, value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldKind, MessageValue, SerializedMessage};

    fn sample() -> SerializedMessage<'static> {
        let mut message = SerializedMessage::new();
        message.push(7, MessageValue::String("first"));
        message.push(3, MessageValue::Float(0.5));
        message.push(7, MessageValue::String("second"));
        message.push(1, MessageValue::Varint(9));
        message
    }

    #[test]
    fn keys_follow_first_seen_order() {
        assert_eq!(sample().keys(), vec![7, 3, 1]);
    }

    #[test]
    fn repeated_field_collapses_into_one_slot() {
        let message = sample();
        assert_eq!(message.len(), 4);
        assert_eq!(message.string(7), Some("first"));
        assert_eq!(message.values(7).len(), 2);
        assert_eq!(message.all_string(), vec![(7, "first"), (7, "second")]);
    }

    #[test]
    fn kind_mismatch_is_absent() {
        let message = sample();
        assert_eq!(message.varint(3), None);
        assert_eq!(message.double(3), None);
        assert_eq!(message.float(3), Some(0.5));
    }

    #[test]
    fn missing_field_is_absent() {
        let message = sample();
        assert!(message.get(42).is_none());
        assert!(message.values(42).is_empty());
        assert!(!message.contains(42));
    }

    #[test]
    fn shape_reports_first_value_kinds() {
        assert_eq!(
            sample().shape(),
            vec![
                (7, FieldKind::String),
                (3, FieldKind::Float),
                (1, FieldKind::Varint)
            ]
        );
    }

    #[test]
    fn bulk_accessors_keep_decode_order_across_ids() {
        let mut message = SerializedMessage::new();
        message.push(9, MessageValue::Varint(1));
        message.push(2, MessageValue::Varint(2));
        message.push(9, MessageValue::Varint(3));
        assert_eq!(message.all_varint(), vec![(9, 1), (2, 2), (9, 3)]);
    }
}
