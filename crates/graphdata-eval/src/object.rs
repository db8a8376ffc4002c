//! Property storage with JavaScript enumeration order.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::number::array_index;
use crate::value::Value;

/// The properties of an object literal.
///
/// Enumerates like a JavaScript object: array-index keys first in ascending
/// numeric order, then every other key in insertion order. Re-assigning an
/// existing key keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectMap {
    indexed: BTreeMap<u32, Value>,
    named: IndexMap<String, Value>,
}

impl ObjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.indexed.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match array_index(key) {
            Some(index) => self.indexed.get(&index),
            None => self.named.get(key),
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match array_index(key) {
            Some(index) => self.indexed.get_mut(&index),
            None => self.named.get_mut(key),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match array_index(&key) {
            Some(index) => {
                self.indexed.insert(index, value);
            }
            None => {
                self.named.insert(key, value);
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Entries in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &Value)> + '_ {
        self.indexed
            .iter()
            .map(|(index, value)| (index.to_string(), value))
            .chain(self.named.iter().map(|(key, value)| (key.clone(), value)))
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.indexed.values().chain(self.named.values())
    }

    /// Move every value into `out` in enumeration order, dropping the keys.
    pub fn drain_values(self, out: &mut Vec<Value>) {
        out.extend(self.indexed.into_values());
        out.extend(self.named.into_values());
    }
}

impl FromIterator<(String, Value)> for ObjectMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = ObjectMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for ObjectMap {
    type Item = (String, Value);
    type IntoIter = Box<dyn Iterator<Item = (String, Value)>>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(
            self.indexed
                .into_iter()
                .map(|(index, value)| (index.to_string(), value))
                .chain(self.named),
        )
    }
}
