//! Uniform bags
//!
//! An ordered sequence of `(name id, bytes)` entries over one packed
//! payload buffer: the on-wire unit of a material and of transient
//! per-draw overrides. Duplicate ids are allowed; the executor uploads
//! every entry in order, so a later entry can temporarily shadow an
//! earlier material binding.

use crate::handle::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformEntry {
    /// Interned uniform name.
    pub id: Handle,
    pub size: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default)]
pub struct UniformBag {
    headers: Vec<UniformEntry>,
    payload: Vec<u8>,
}

impl UniformBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn clear(&mut self) {
        self.headers.clear();
        self.payload.clear();
    }

    /// Appends an entry; duplicates are allowed.
    pub fn push(&mut self, id: Handle, value: &[u8]) {
        if id.is_none() {
            return;
        }
        self.headers.push(UniformEntry {
            id,
            size: value.len() as u32,
            offset: self.payload.len() as u32,
        });
        self.payload.extend_from_slice(value);
    }

    /// Appends a zero-filled entry of `size` bytes.
    pub fn push_zeroed(&mut self, id: Handle, size: u32) {
        if id.is_none() {
            return;
        }
        self.headers.push(UniformEntry {
            id,
            size,
            offset: self.payload.len() as u32,
        });
        self.payload.resize(self.payload.len() + size as usize, 0);
    }

    pub fn push_value<T: bytemuck::NoUninit>(&mut self, id: Handle, value: &T) {
        self.push(id, bytemuck::bytes_of(value));
    }

    /// Payload of the first entry matching `id`.
    pub fn get(&self, id: Handle) -> Option<&[u8]> {
        let entry = self.headers.iter().find(|entry| entry.id == id)?;
        Some(self.entry_payload(entry))
    }

    pub fn get_mut(&mut self, id: Handle) -> Option<&mut [u8]> {
        let entry = *self.headers.iter().find(|entry| entry.id == id)?;
        let offset = entry.offset as usize;
        Some(&mut self.payload[offset..offset + entry.size as usize])
    }

    /// Overwrites the first matching entry's payload. Sizes must agree.
    pub fn set(&mut self, id: Handle, value: &[u8]) -> bool {
        match self.get_mut(id) {
            Some(slot) if slot.len() == value.len() => {
                slot.copy_from_slice(value);
                true
            }
            Some(_) => {
                tracing::warn!("uniform size mismatch on set, entry untouched");
                false
            }
            None => false,
        }
    }

    pub fn set_value<T: bytemuck::NoUninit>(&mut self, id: Handle, value: &T) -> bool {
        self.set(id, bytemuck::bytes_of(value))
    }

    pub fn headers(&self) -> &[UniformEntry] {
        &self.headers
    }

    /// `(entry, payload)` at a header index.
    pub fn entry(&self, index: usize) -> Option<(&UniformEntry, &[u8])> {
        let entry = self.headers.get(index)?;
        Some((entry, self.entry_payload(entry)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UniformEntry, &[u8])> {
        self.headers
            .iter()
            .map(|entry| (entry, self.entry_payload(entry)))
    }

    fn entry_payload(&self, entry: &UniformEntry) -> &[u8] {
        let offset = entry.offset as usize;
        &self.payload[offset..offset + entry.size as usize]
    }
}
