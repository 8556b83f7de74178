/// Default number of slots
pub const DEFAULT_CAPACITY: usize = (1 << 20) + 7; // prime value

#[derive(Copy, Clone)]
struct Entry<V> {
    key: u64,
    value: V,
}

/// A direct-mapped cache from position keys to search results
///
/// Every key maps to the slot `key % capacity`. A write replaces whatever the
/// slot held, and a read only succeeds when the stored key matches exactly.
#[derive(Clone)]
pub struct TranspositionTable<V: Copy> {
    entries: Vec<Option<Entry<V>>>,
}

impl<V: Copy> TranspositionTable<V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A table with `capacity` slots (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: vec![None; capacity.max(1)],
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    fn index(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    pub fn put(&mut self, key: u64, value: V) {
        let i = self.index(key);
        self.entries[i] = Some(Entry { key, value });
    }

    pub fn get(&self, key: u64) -> Option<V> {
        match self.entries[self.index(key)] {
            Some(entry) if entry.key == key => Some(entry.value),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = None;
        }
    }
}

impl<V: Copy> Default for TranspositionTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_after_put() {
        let mut table = TranspositionTable::with_capacity(97);
        table.put(12345, 7i32);
        assert_eq!(table.get(12345), Some(7));
        assert_eq!(table.get(54321), None);
    }

    #[test]
    fn colliding_key_overwrites() {
        let mut table = TranspositionTable::with_capacity(97);
        table.put(3, 'a');
        table.put(3 + 97, 'b');
        assert_eq!(table.get(3), None);
        assert_eq!(table.get(3 + 97), Some('b'));
    }

    #[test]
    fn key_zero_is_a_real_key() {
        let mut table = TranspositionTable::with_capacity(11);
        assert_eq!(table.get(0), None);
        table.put(0, 1u8);
        assert_eq!(table.get(0), Some(1));
    }

    #[test]
    fn reset_clears_all_slots() {
        let mut table = TranspositionTable::with_capacity(13);
        for key in 0..13u64 {
            table.put(key, key);
        }
        table.reset();
        assert!((0..13u64).all(|key| table.get(key).is_none()));
        assert_eq!(table.capacity(), 13);
    }

    #[test]
    fn zero_capacity_still_usable() {
        let mut table = TranspositionTable::with_capacity(0);
        table.put(9, ());
        assert_eq!(table.get(9), Some(()));
    }
}
