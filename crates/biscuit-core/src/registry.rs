//! Known packet names and IDs.
//!
//! The registry only grows or reclassifies: names and IDs are appended once
//! and never removed, while the ID → name map is overwritten on every new
//! identification of an ID. Per-packet schemas live next to it so one lock
//! covers a whole identification.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::matcher::PacketSchema;

/// A registry shared between a matcher and its comparers.
pub type SharedRegistry = Arc<Mutex<Registry>>;

/// Numeric packet identifier.
pub type PacketId = u16;

/// Lookup key for [`Registry::is_known`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKey<'a> {
    Id(PacketId),
    Name(&'a str),
}

impl From<PacketId> for PacketKey<'_> {
    fn from(value: PacketId) -> Self {
        PacketKey::Id(value)
    }
}

impl<'a> From<&'a str> for PacketKey<'a> {
    fn from(value: &'a str) -> Self {
        PacketKey::Name(value)
    }
}

impl<'a> From<&'a String> for PacketKey<'a> {
    fn from(value: &'a String) -> Self {
        PacketKey::Name(value.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    known_names: Vec<String>,
    known_ids: Vec<PacketId>,
    id_map: HashMap<PacketId, String>,
    schemas: HashMap<PacketId, PacketSchema>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry behind a fresh lock.
    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// # Examples
    /// ```
    /// use biscuit_core::{PacketKey, Registry};
    ///
    /// let registry = Registry::new();
    /// assert!(!registry.is_known(PacketKey::Id(5)));
    /// assert!(!registry.is_known("Ping"));
    /// ```
    pub fn is_known<'k>(&self, key: impl Into<PacketKey<'k>>) -> bool {
        match key.into() {
            PacketKey::Id(id) => self.known_ids.contains(&id),
            PacketKey::Name(name) => self.known_names.iter().any(|known| known == name),
        }
    }

    pub fn known_names(&self) -> &[String] {
        &self.known_names
    }

    pub fn known_ids(&self) -> &[PacketId] {
        &self.known_ids
    }

    /// Current best guess for the name of `id`.
    pub fn name_of(&self, id: PacketId) -> Option<&str> {
        self.id_map.get(&id).map(String::as_str)
    }

    pub fn id_map(&self) -> &HashMap<PacketId, String> {
        &self.id_map
    }

    pub fn schema(&self, id: PacketId) -> Option<&PacketSchema> {
        self.schemas.get(&id)
    }

    pub fn schemas(&self) -> impl Iterator<Item = (PacketId, &PacketSchema)> {
        self.schemas.iter().map(|(id, schema)| (*id, schema))
    }

    pub(crate) fn schema_mut(&mut self, id: PacketId) -> &mut PacketSchema {
        self.schemas.entry(id).or_default()
    }

    /// Records that `id` is currently believed to be `name`.
    pub(crate) fn record(&mut self, name: &str, id: PacketId) {
        if !self.known_names.iter().any(|known| known == name) {
            self.known_names.push(name.to_string());
        }
        if !self.known_ids.contains(&id) {
            self.known_ids.push(id);
        }
        self.id_map.insert(id, name.to_string());
    }
}
