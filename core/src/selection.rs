//! Chunks the user has marked for the next operation.

use crate::backend::{ChunkId, ChunkRef};

/// Set of chunks keyed by id. Iteration follows selection order, which is the
/// order ids are sent for merges and template creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    chunks: Vec<ChunkRef>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the chunk, or removes it if a chunk with the same id is already
    /// selected. Returns whether the chunk is selected afterwards.
    pub fn toggle(&mut self, chunk: ChunkRef) -> bool {
        if let Some(pos) = self.position(chunk.id) {
            self.chunks.remove(pos);
            false
        } else {
            self.chunks.push(chunk);
            true
        }
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn contains(&self, id: ChunkId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: ChunkId) -> Option<&ChunkRef> {
        self.chunks.iter().find(|c| c.id == id)
    }

    /// Swaps in a newer copy of an already selected chunk.
    pub fn replace(&mut self, chunk: ChunkRef) -> bool {
        match self.position(chunk.id) {
            Some(pos) => {
                self.chunks[pos] = chunk;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkRef> {
        self.chunks.iter()
    }

    pub fn as_slice(&self) -> &[ChunkRef] {
        &self.chunks
    }

    pub fn ids(&self) -> Vec<ChunkId> {
        self.chunks.iter().map(|c| c.id).collect()
    }

    /// True when every selected chunk shares one language (vacuously for < 2).
    pub fn same_language(&self) -> bool {
        match self.chunks.split_first() {
            Some((first, rest)) => rest.iter().all(|c| c.language == first.language),
            None => true,
        }
    }

    pub fn has_incomplete(&self) -> bool {
        self.chunks.iter().any(|c| c.incomplete)
    }

    fn position(&self, id: ChunkId) -> Option<usize> {
        self.chunks.iter().position(|c| c.id == id)
    }
}
