//! Segmented memory.
//!
//! The address space is a growable table of segments. Segment 0 always
//! holds the running program; every other id is handed out by
//! [`Memory::allocate`] and returned with [`Memory::release`]. Released ids
//! go onto a LIFO free list so the most recently freed id is reused first.

use log::debug;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Id of the program segment.
pub const PROGRAM_SEGMENT: u32 = 0;

/// The address space: segment table plus free list.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    /// `None` marks an unmapped slot whose id sits on the free list.
    segments: Vec<Option<Vec<u32>>>,
    /// Unmapped ids, most recently freed last.
    free: Vec<u32>,
}

impl Memory {
    /// Create an address space holding only an empty program segment.
    pub fn new() -> Self {
        Self {
            segments: vec![Some(Vec::new())],
            free: Vec::new(),
        }
    }

    /// Install `words` as the program segment, dropping the previous one.
    pub fn load_program(&mut self, words: Vec<u32>) {
        debug!("program segment loaded with {} words", words.len());
        self.segments[PROGRAM_SEGMENT as usize] = Some(words);
    }

    /// Map a new zero-filled segment of `word_count` words and return its id.
    ///
    /// A size the host cannot back is reported as
    /// [`MemoryError::AllocationFailed`] rather than aborting the process.
    pub fn allocate(&mut self, word_count: u32) -> Result<u32, MemoryError> {
        let mut words = Vec::new();
        words
            .try_reserve_exact(word_count as usize)
            .map_err(|_| MemoryError::AllocationFailed { words: word_count })?;
        words.resize(word_count as usize, 0u32);

        if let Some(id) = self.free.pop() {
            self.segments[id as usize] = Some(words);
            debug!("mapped segment {} ({} words, reused)", id, word_count);
            return Ok(id);
        }

        let id = u32::try_from(self.segments.len())
            .map_err(|_| MemoryError::AddressSpaceExhausted)?;
        self.segments.push(Some(words));
        debug!("mapped segment {} ({} words)", id, word_count);
        Ok(id)
    }

    /// Unmap a segment and push its id onto the free list.
    pub fn release(&mut self, id: u32) -> Result<(), MemoryError> {
        if id == PROGRAM_SEGMENT {
            return Err(MemoryError::InvalidUnmap(id));
        }
        match self.segments.get_mut(id as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                self.free.push(id);
                debug!("unmapped segment {}", id);
                Ok(())
            }
            _ => Err(MemoryError::InvalidUnmap(id)),
        }
    }

    /// Read one word.
    #[inline]
    pub fn read(&self, id: u32, offset: u32) -> Result<u32, MemoryError> {
        self.segments
            .get(id as usize)
            .and_then(|slot| slot.as_ref())
            .and_then(|words| words.get(offset as usize))
            .copied()
            .ok_or(MemoryError::OutOfBounds { segment: id, offset })
    }

    /// Overwrite one word.
    #[inline]
    pub fn write(&mut self, id: u32, offset: u32, value: u32) -> Result<(), MemoryError> {
        let word = self
            .segments
            .get_mut(id as usize)
            .and_then(|slot| slot.as_mut())
            .ok_or(MemoryError::OutOfBounds { segment: id, offset })?
            .get_mut(offset as usize)
            .ok_or(MemoryError::OutOfBounds { segment: id, offset })?;
        *word = value;
        Ok(())
    }

    /// Replace the program segment with a copy of segment `id`.
    ///
    /// The source segment stays mapped and unchanged.
    pub fn replace_program(&mut self, id: u32) -> Result<(), MemoryError> {
        let copy = self.segment(id)?.clone();
        debug!("program segment replaced by copy of segment {} ({} words)", id, copy.len());
        self.segments[PROGRAM_SEGMENT as usize] = Some(copy);
        Ok(())
    }

    /// Fetch the instruction at `pc`, or `None` once `pc` is past the end.
    #[inline]
    pub fn fetch(&self, pc: u32) -> Option<u32> {
        self.program().get(pc as usize).copied()
    }

    /// The words of the program segment.
    pub fn program(&self) -> &[u32] {
        self.segments[PROGRAM_SEGMENT as usize]
            .as_deref()
            .unwrap_or(&[])
    }

    /// Number of words in the program segment.
    pub fn program_len(&self) -> usize {
        self.program().len()
    }

    /// Length of a mapped segment.
    pub fn segment_len(&self, id: u32) -> Result<usize, MemoryError> {
        Ok(self.segment(id)?.len())
    }

    /// Returns true if `id` names a currently mapped segment.
    pub fn is_mapped(&self, id: u32) -> bool {
        matches!(self.segments.get(id as usize), Some(Some(_)))
    }

    /// Number of currently mapped segments, including the program segment.
    pub fn mapped_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_some()).count()
    }

    /// Ids waiting for reuse, in the order they will be handed out.
    pub fn free_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.free.iter().rev().copied()
    }

    fn segment(&self, id: u32) -> Result<&Vec<u32>, MemoryError> {
        self.segments
            .get(id as usize)
            .and_then(|slot| slot.as_ref())
            .ok_or(MemoryError::OutOfBounds { segment: id, offset: 0 })
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("program_words", &self.program_len())
            .field("mapped_segments", &self.mapped_count())
            .field("free_ids", &self.free.len())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Access to an unmapped segment or past the end of a mapped one.
    #[error("segment {segment} offset {offset} is out of bounds")]
    OutOfBounds { segment: u32, offset: u32 },

    /// Unmapping segment 0 or a segment that is not mapped.
    #[error("cannot unmap segment {0}")]
    InvalidUnmap(u32),

    /// Every 32-bit segment id is in use.
    #[error("no segment ids left to allocate")]
    AddressSpaceExhausted,

    /// The host could not provide storage for a new segment.
    #[error("cannot allocate a segment of {words} words")]
    AllocationFailed { words: u32 },
}
