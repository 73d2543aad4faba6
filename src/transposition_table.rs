//! Fixed-capacity cache of search scores keyed by position fingerprint

use crate::config::DEFAULT_TABLE_CAPACITY;

/// How a cached score relates to the true minimax value of its position
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Slot holds nothing
    Empty,
    /// The score is the exact value
    Exact,
    /// The search failed high, the true value is at least the score
    Lower,
    /// The search failed low, the true value is at most the score
    Upper,
}

#[derive(Copy, Clone, Debug)]
pub struct Entry {
    pub key: u64,
    pub score: i32,
    /// Remaining search depth the score was computed with
    pub depth: u32,
    pub bound: Bound,
}

impl Entry {
    pub fn new() -> Self {
        Self {
            key: 0,
            score: 0,
            depth: 0,
            bound: Bound::Empty,
        }
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::new()
    }
}

/// A direct-mapped table: each fingerprint maps to one slot and newer entries
/// always replace older ones
///
/// The full 64-bit fingerprint is stored, and fingerprints identify boards
/// uniquely, so a hit always belongs to the probed board. Owned by a single
/// search and never shared between threads.
#[derive(Clone)]
pub struct TranspositionTable {
    entries: Vec<Entry>,
    hits: usize,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TABLE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: vec![Entry::new(); capacity.max(1)],
            hits: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn set(&mut self, key: u64, score: i32, depth: u32, bound: Bound) {
        let len = self.entries.len();
        self.entries[(key % len as u64) as usize] = Entry {
            key,
            score,
            depth,
            bound,
        };
    }

    /// Looks up an entry for `key` that was searched at least `depth` plies deep
    pub fn get(&mut self, key: u64, depth: u32) -> Option<Entry> {
        let entry = self.entries[(key % self.entries.len() as u64) as usize];
        if entry.bound != Bound::Empty && entry.key == key && entry.depth >= depth {
            self.hits += 1;
            Some(entry)
        } else {
            None
        }
    }

    /// Number of successful lookups since the table was created or cleared
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = Entry::new();
        }
        self.hits = 0;
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}
