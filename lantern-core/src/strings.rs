//! String interner
//!
//! Maps byte strings to stable handles: an append-only character arena plus
//! a content-hash bucket map. Interned ids are 1-based and never move;
//! `clear` bumps the table generation so handles from a previous epoch stop
//! resolving.
//!
//! The engine runs two independent tables: the asset registry interns names,
//! type tags, and extensions; the graphics state interns uniform names.

use core::hash::{BuildHasher, Hash, Hasher};

use hashbrown::{DefaultHashBuilder, HashMap};

use crate::handle::Handle;

/// Case-sensitive interner. Main-thread confined, like everything else in
/// the core.
pub struct StringTable {
    arena: String,
    spans: Vec<(u32, u32)>,
    buckets: HashMap<u64, Vec<u32>>,
    hasher: DefaultHashBuilder,
    generation: u8,
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            arena: String::new(),
            spans: Vec::new(),
            buckets: HashMap::new(),
            hasher: DefaultHashBuilder::default(),
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Interns `value`, returning the existing id when the content is
    /// already present. Empty input is the null handle.
    pub fn add(&mut self, value: &str) -> Handle {
        let found = self.find(value);
        if found.is_some() {
            return found;
        }
        if value.is_empty() {
            return Handle::NONE;
        }

        let offset = self.arena.len() as u32;
        self.arena.push_str(value);
        self.spans.push((offset, value.len() as u32));

        let id = self.spans.len() as u32;
        self.buckets
            .entry(self.content_hash(value))
            .or_default()
            .push(id);
        Handle::new(id, self.generation)
    }

    /// Looks `value` up without interning; unknown content is the null
    /// handle.
    pub fn find(&self, value: &str) -> Handle {
        if value.is_empty() {
            return Handle::NONE;
        }
        let Some(bucket) = self.buckets.get(&self.content_hash(value)) else {
            return Handle::NONE;
        };
        for &id in bucket {
            if self.span(id) == value {
                return Handle::new(id, self.generation);
            }
        }
        Handle::NONE
    }

    pub fn get(&self, handle: Handle) -> Option<&str> {
        let id = handle.id();
        if id == 0 || id as usize > self.spans.len() {
            return None;
        }
        if handle.generation() != self.generation {
            tracing::warn!("string handle {handle:?} is from a cleared table");
            return None;
        }
        Some(self.span(id))
    }

    /// Forgets every interned string and invalidates outstanding handles.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.spans.clear();
        self.buckets.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    fn span(&self, id: u32) -> &str {
        let (offset, length) = self.spans[id as usize - 1];
        &self.arena[offset as usize..(offset + length) as usize]
    }

    fn content_hash(&self, value: &str) -> u64 {
        let mut state = self.hasher.build_hasher();
        value.hash(&mut state);
        state.finish()
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}
