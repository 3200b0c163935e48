//! Bounded Frame Buffer for Serial Line Reception
//!
//! ## Overview
//!
//! Incoming GPS sentences are accumulated one byte at a time into a
//! fixed-capacity buffer sized by a const generic. The buffer never grows and
//! never allocates; once full, further bytes are dropped and the buffer
//! remembers that it truncated the line.
//!
//! ### Reserved Slot
//!
//! A `FrameBuffer<N>` stores at most `N - 1` bytes. The last slot is kept
//! free so that a frame always fits a C-style sentinel-terminated copy of
//! itself, and so that scanning code can assume `len < N`:
//!
//! ```text
//! FrameBuffer<8>:
//! ┌───┬───┬───┬───┬───┬───┬───┬───┐
//! │ $ │ G │ P │ R │ M │ C │ , │   │  ← slot 7 never written
//! └───┴───┴───┴───┴───┴───┴───┴───┘
//!                               ↑
//!                               └── push() here sets `truncated`
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use fixrelay_core::buffer::FrameBuffer;
//!
//! let mut line: FrameBuffer<8> = FrameBuffer::new();
//! for &b in b"$GPRMC,xyz" {
//!     line.push(b);
//! }
//!
//! assert_eq!(line.as_bytes(), b"$GPRMC,");
//! assert!(line.is_truncated());
//! ```

use heapless::Vec;

use crate::constants::FRAME_CAPACITY;

/// Raw GPS line as received from the serial link
pub type RawFrame = FrameBuffer<FRAME_CAPACITY>;

/// Fixed-capacity byte accumulator holding at most `N - 1` bytes
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FrameBuffer<const N: usize> {
    data: Vec<u8, N>,
    truncated: bool,
}

impl<const N: usize> FrameBuffer<N> {
    /// Usable capacity (one slot reserved)
    pub const USABLE: usize = if N == 0 { 0 } else { N - 1 };

    /// Creates an empty buffer
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            truncated: false,
        }
    }

    /// Appends a byte
    ///
    /// Returns `false` and marks the buffer truncated when the usable
    /// capacity is already reached. The byte is dropped; existing content is
    /// never overwritten.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.data.len() >= Self::USABLE {
            self.truncated = true;
            return false;
        }
        // Cannot fail: len < N - 1 < N
        self.data.push(byte).is_ok()
    }

    /// Appends as many bytes as fit; returns the number stored
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().take_while(|&&b| self.push(b)).count()
    }

    /// Stored bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of stored bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if no further byte can be stored
    pub fn is_full(&self) -> bool {
        self.data.len() >= Self::USABLE
    }

    /// Whether any byte was dropped since the last clear
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Last stored byte
    pub fn last(&self) -> Option<u8> {
        self.data.last().copied()
    }

    /// True if the stored bytes contain `needle`
    pub fn contains(&self, needle: &[u8]) -> bool {
        contains_subslice(&self.data, needle)
    }

    /// Discard all content and the truncation flag
    pub fn clear(&mut self) {
        self.data.clear();
        self.truncated = false;
    }
}

impl<const N: usize> core::fmt::Debug for FrameBuffer<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("len", &self.data.len())
            .field("capacity", &Self::USABLE)
            .field("truncated", &self.truncated)
            .finish()
    }
}

impl<const N: usize> AsRef<[u8]> for FrameBuffer<N> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Naive substring search over bytes
///
/// Haystacks here are at most a few hundred bytes, so the quadratic worst
/// case is irrelevant.
pub fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
