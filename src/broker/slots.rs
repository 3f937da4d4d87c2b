//! Index-stable slot list
//!
//! Each channel keeps its registrations in a `SlotList`. Insertion hands out a
//! `SlotKey` that removes the entry again in O(1), no matter how many other
//! entries came and went in between. Freed slots are reused, and every slot
//! carries a generation so that a key from a previous occupant never removes
//! the current one.

/// Removal handle returned by [`SlotList::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    index: usize,
    generation: u64,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    value: Option<T>,
}

/// Vector of slots with free-list reuse
#[derive(Debug)]
pub struct SlotList<T> {
    slots: Vec<Slot<T>>,
    /// Indices of vacant slots, reused LIFO
    free: Vec<usize>,
    len: usize,
}

impl<T> SlotList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Insert a value and return its removal handle
    pub fn insert(&mut self, value: T) -> SlotKey {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.generation += 1;
            slot.value = Some(value);
            return SlotKey {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SlotKey {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Remove the value behind `key`
    ///
    /// Returns `None` if the key is stale (already removed, or the slot has
    /// been reused since).
    pub fn remove(&mut self, key: SlotKey) -> Option<T> {
        let slot = self.slots.get_mut(key.index)?;
        if slot.generation != key.generation {
            return None;
        }

        let value = slot.value.take()?;
        self.free.push(key.index);
        self.len -= 1;
        Some(value)
    }

    /// Get the value behind `key`
    pub fn get(&self, key: SlotKey) -> Option<&T> {
        self.slots
            .get(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over occupied slots
    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    SlotKey {
                        index,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }

    /// Iterate over occupied values
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }
}

impl<T> Default for SlotList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut list = SlotList::new();
        let a = list.insert("a");
        let b = list.insert("b");

        assert_eq!(list.len(), 2);
        assert_eq!(list.get(a), Some(&"a"));
        assert_eq!(list.remove(a), Some("a"));
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(b), Some(&"b"));
        assert_eq!(list.remove(b), Some("b"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_double_remove_is_noop() {
        let mut list = SlotList::new();
        let a = list.insert(1);

        assert_eq!(list.remove(a), Some(1));
        assert_eq!(list.remove(a), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_stale_key_after_reuse() {
        let mut list = SlotList::new();
        let old = list.insert(1);
        list.remove(old);

        // Slot is reused for the next insert
        let new = list.insert(2);
        assert_ne!(old, new);

        // The old handle must not remove the new occupant
        assert_eq!(list.remove(old), None);
        assert_eq!(list.get(old), None);
        assert_eq!(list.get(new), Some(&2));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_iter_skips_vacant() {
        let mut list = SlotList::new();
        let a = list.insert('a');
        let _b = list.insert('b');
        let _c = list.insert('c');
        list.remove(a);

        let values: Vec<char> = list.values().copied().collect();
        assert_eq!(values, vec!['b', 'c']);

        let keys: Vec<SlotKey> = list.iter().map(|(k, _)| k).collect();
        assert_eq!(keys.len(), 2);
        for key in keys {
            assert!(list.get(key).is_some());
        }
    }
}
