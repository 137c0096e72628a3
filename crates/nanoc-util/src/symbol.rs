//! String interning for identifiers and labels.
//!
//! A [`Symbol`] is a compact, `Copy` handle to a string stored once in a
//! global table. Every identifier, label, and synthesized temporary name
//! that flows through the pipeline is interned so that later passes can
//! compare names in O(1) instead of carrying owned `String`s around.

use ahash::AHasher;
use dashmap::DashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(StringTable::new);

struct StringTable {
    by_hash: DashMap<u64, (&'static str, u32)>,
    by_index: DashMap<u32, &'static str>,
    next: AtomicU32,
}

impl StringTable {
    fn new() -> Self {
        Self {
            by_hash: DashMap::new(),
            by_index: DashMap::new(),
            next: AtomicU32::new(0),
        }
    }

    fn hash_of(s: &str) -> u64 {
        let mut hasher = AHasher::default();
        s.hash(&mut hasher);
        hasher.finish()
    }

    fn intern(&self, s: &str) -> u32 {
        let hash = Self::hash_of(s);
        if let Some(idx) = self.probe(hash, s) {
            return idx;
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let idx = self.next.fetch_add(1, Ordering::Relaxed);
        self.by_index.insert(idx, leaked);

        // Linear probing on collision: two distinct strings hashing to the
        // same slot must never be merged into one Symbol.
        let mut slot = hash;
        while self.by_hash.contains_key(&slot) {
            slot = slot.wrapping_add(1);
        }
        self.by_hash.insert(slot, (leaked, idx));
        idx
    }

    /// Looks for `s` starting at `hash`, following the same probe sequence
    /// `intern` used to place it. Returns `None` once an empty slot is hit.
    fn probe(&self, hash: u64, s: &str) -> Option<u32> {
        let mut slot = hash;
        loop {
            let entry = self.by_hash.get(&slot)?;
            if entry.0 == s {
                return Some(entry.1);
            }
            slot = slot.wrapping_add(1);
        }
    }

    fn resolve(&self, idx: u32) -> &'static str {
        *self
            .by_index
            .get(&idx)
            .expect("Symbol index not present in string table")
    }
}

/// An interned string: 4 bytes, `Copy`, comparable by index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Intern `s`, returning the same `Symbol` for equal strings.
    pub fn intern(s: &str) -> Self {
        Symbol(STRING_TABLE.intern(s))
    }

    /// The original string this symbol was interned from.
    pub fn as_str(self) -> &'static str {
        STRING_TABLE.resolve(self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::intern(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::intern(&s)
    }
}
