//! Ordered entity collections keyed by a unique string id.
//!
//! Slices never mutate records in place: a fetch-all replaces the whole list,
//! a create appends the server's record, a delete filters it out.

use serde::{Deserialize, Serialize};

/// A record with a server-assigned identifier.
pub trait Entity {
    /// Unique identifier within its collection
    fn id(&self) -> &str;
}

/// Ordered list of entities with unique ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Collection<T> {
    /// Create an empty collection
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Replace every record (fetch-all)
    ///
    /// If the response repeats an id, the first occurrence is kept.
    pub fn replace_all(&mut self, items: Vec<T>) {
        let mut unique: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.iter().any(|existing| existing.id() == item.id()) {
                unique.push(item);
            }
        }
        self.items = unique;
    }

    /// Append a newly created record
    ///
    /// A record whose id is already present replaces the existing one in place.
    pub fn append(&mut self, item: T) {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Remove the record with `id`, returning it if present
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let position = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(position))
    }

    /// Look up a record by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether a record with `id` exists
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T> Collection<T> {
    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate records in order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Records as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Entity> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        let mut collection = Self::new();
        collection.replace_all(items);
        collection
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Item {
        id: String,
        label: String,
    }

    impl Entity for Item {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn item(id: &str, label: &str) -> Item {
        Item {
            id: id.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn replace_all_drops_duplicate_ids() {
        let mut collection = Collection::new();
        collection.replace_all(vec![item("a", "first"), item("b", "b"), item("a", "second")]);

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get("a").map(|i| i.label.as_str()), Some("first"));
    }

    #[test]
    fn append_existing_id_replaces_in_place() {
        let mut collection = Collection::from(vec![item("a", "old"), item("b", "b")]);
        collection.append(item("a", "new"));

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.as_slice()[0], item("a", "new"));
    }

    #[test]
    fn remove_missing_id_is_noop() {
        let mut collection = Collection::from(vec![item("a", "a")]);
        assert!(collection.remove("zzz").is_none());
        assert_eq!(collection.len(), 1);
    }

    fn ids() -> impl Strategy<Value = Vec<String>> {
        prop::collection::hash_set("[a-z]{1,6}", 0..12).prop_map(|set| set.into_iter().collect())
    }

    proptest! {
        #[test]
        fn append_keeps_prior_contents_and_adds_once(existing in ids(), new_id in "[A-Z]{1,6}") {
            let prior: Vec<Item> = existing.iter().map(|id| item(id, "x")).collect();
            let mut collection = Collection::from(prior.clone());
            collection.append(item(&new_id, "new"));

            prop_assert_eq!(collection.iter().filter(|i| i.id == new_id).count(), 1);
            for record in &prior {
                prop_assert!(collection.iter().any(|i| i == record));
            }
        }

        #[test]
        fn remove_only_drops_target(existing in ids(), pick in any::<prop::sample::Index>()) {
            prop_assume!(!existing.is_empty());
            let target = existing[pick.index(existing.len())].clone();
            let prior: Vec<Item> = existing.iter().map(|id| item(id, "x")).collect();
            let mut collection = Collection::from(prior.clone());
            collection.remove(&target);

            prop_assert!(!collection.contains(&target));
            let expected: Vec<Item> = prior.into_iter().filter(|i| i.id != target).collect();
            prop_assert_eq!(collection.as_slice(), expected.as_slice());
        }
    }
}
