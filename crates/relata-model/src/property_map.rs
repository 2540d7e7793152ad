//! Flat property maps: the boundary shape between entities and adapters.

use crate::value::Value;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A flat, insertion-ordered map of property name to [`Value`].
///
/// This is the shape a storage adapter hands to `construct` (a merged
/// read-back row or parsed request body) and receives from `deconstruct`
/// (one map per inheritance level). Insertion order is preserved so the
/// adapter can rely on a stable column order.
///
/// Serializes as a plain JSON object keyed by property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, Value)>,
}

impl PropertyMap {
    /// Create an empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty map with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a value, replacing any existing entry with the same name.
    ///
    /// A replaced entry keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Get a value by property name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Check whether the map contains the given property name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Remove an entry by name, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Iterate over property names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Fold another map into this one; entries from `other` win on conflict.
    ///
    /// Used by adapters to merge the per-level maps produced by
    /// deconstruction back into a single row.
    pub fn merge(&mut self, other: PropertyMap) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }

    /// Merge a sequence of maps into one, later maps winning on conflict.
    pub fn merged(maps: impl IntoIterator<Item = PropertyMap>) -> PropertyMap {
        let mut out = PropertyMap::new();
        for map in maps {
            out.merge(map);
        }
        out
    }
}

impl Serialize for PropertyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertyMapVisitor;

        impl<'de> Visitor<'de> for PropertyMapVisitor {
            type Value = PropertyMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of property name to value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PropertyMap, A::Error> {
                let mut map = PropertyMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, Value>()? {
                    map.insert(name, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(PropertyMapVisitor)
    }
}

impl FromIterator<(String, Value)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl IntoIterator for PropertyMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut map = PropertyMap::new();
        assert!(map.is_empty());

        map.insert("id", 7i64);
        map.insert("name", "Rex");

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("id"), Some(&Value::Int64(7)));
        assert_eq!(map.get("name"), Some(&Value::String("Rex".into())));
        assert!(map.get("missing").is_none());
        assert!(map.contains("name"));
    }

    #[test]
    fn test_replace_keeps_position() {
        let map = PropertyMap::new()
            .with("a", 1i32)
            .with("b", 2i32)
            .with("a", 10i32);

        let names: Vec<_> = map.names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&Value::Int32(10)));
    }

    #[test]
    fn test_merge_later_wins() {
        let base = PropertyMap::new().with("id", 1i64).with("name", "Pet");
        let derived = PropertyMap::new().with("id", 1i64).with("trained", true);

        let merged = PropertyMap::merged([base, derived]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("trained"), Some(&Value::Bool(true)));

        let names: Vec<_> = merged.names().collect();
        assert_eq!(names, vec!["id", "name", "trained"]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let map = PropertyMap::new()
            .with("id", 42i64)
            .with("name", "Milou")
            .with("owner_id", Value::Null);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            r#"{"id":{"Int64":42},"name":{"String":"Milou"},"owner_id":"Null"}"#
        );

        let back: PropertyMap = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }
}
