use hashbrown::HashMap;

use crate::err::NameCollisionError;

/// A string-keyed map which remembers insertion order.
///
/// Entries live in a vector and a side table maps each key to its slot. Replacing an existing key
/// keeps the original slot, so the encounter order of a decoded container survives edits.
#[derive(Debug, Clone)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V: PartialEq> PartialEq for OrderedMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from `entries`, reporting every key that replaced an earlier one in `scope`.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, V)>,
        scope: &str,
    ) -> (Self, Vec<NameCollisionError>) {
        let mut map = OrderedMap::new();
        let mut collisions = Vec::new();

        for (key, value) in entries {
            if map.contains_key(&key) {
                collisions.push(NameCollisionError {
                    scope: scope.to_owned(),
                    name: key.clone(),
                });
            }
            map.insert(key, value);
        }

        (map, collisions)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        match self.index.get(key) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }

    /// Position of `key` in insertion order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn get_index(&self, position: usize) -> Option<(&str, &V)> {
        self.entries.get(position).map(|(k, v)| (k.as_str(), v))
    }

    /// Inserts `value` under `key`. An existing value is replaced in place and returned.
    pub fn insert(&mut self, key: String, value: V) -> Option<V> {
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl ExactSizeIterator<Item = (&str, &mut V)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_keeps_position() {
        let mut map = OrderedMap::new();
        assert_eq!(map.insert("b".to_owned(), 1), None);
        assert_eq!(map.insert("a".to_owned(), 2), None);
        assert_eq!(map.insert("b".to_owned(), 3), Some(1));

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&3));
        assert_eq!(map.position("a"), Some(1));
    }

    #[test]
    fn test_from_entries_reports_collisions() {
        let (map, collisions) = OrderedMap::from_entries(
            vec![
                ("Resource0".to_owned(), 1),
                ("Resource1".to_owned(), 2),
                ("Resource0".to_owned(), 3),
            ],
            "header `fx`",
        );

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Resource0"), Some(&3));
        assert_eq!(
            collisions,
            vec![NameCollisionError {
                scope: "header `fx`".to_owned(),
                name: "Resource0".to_owned(),
            }]
        );
    }
}
