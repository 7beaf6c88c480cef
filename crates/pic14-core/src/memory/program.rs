//! Flash program memory.

use crate::catalog::WORD_MASK;
use crate::fault::Fault;

/// Program memory size of the PIC16F1826, in words.
pub const PROGRAM_WORDS: usize = 2048;
/// Value of an unprogrammed flash word.
pub const ERASED_WORD: u16 = WORD_MASK;

/// Word-addressed program memory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProgramMemory {
    words: Box<[u16]>,
}

impl ProgramMemory {
    /// Erased program memory of `words` words.
    #[must_use]
    pub fn new(words: usize) -> Self {
        Self {
            words: vec![ERASED_WORD; words.max(1)].into_boxed_slice(),
        }
    }

    /// Size in words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false; program memory holds at least one word.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Reduces `address` modulo the memory size.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn wrap(&self, address: u16) -> u16 {
        // the remainder never exceeds `address`
        (usize::from(address) % self.words.len()) as u16
    }

    /// Word at `address`; addresses past the end wrap.
    #[must_use]
    pub fn fetch(&self, address: u16) -> u16 {
        self.words[usize::from(self.wrap(address))]
    }

    /// Low byte of the word at `address`, as seen through an FSR.
    #[must_use]
    pub fn low_byte(&self, address: u16) -> u8 {
        self.fetch(address).to_le_bytes()[0]
    }

    /// Writes `words` contiguously from `base`, masking each to 14 bits.
    ///
    /// # Errors
    ///
    /// [`Fault::ProgramOutOfRange`] when the image runs past the end; nothing
    /// is written in that case.
    pub fn load(&mut self, base: u16, words: &[u16]) -> Result<(), Fault> {
        let start = usize::from(base);
        let end = start + words.len();
        let target = self
            .words
            .get_mut(start..end)
            .ok_or(Fault::ProgramOutOfRange {
                base,
                len: words.len(),
            })?;
        for (slot, word) in target.iter_mut().zip(words) {
            *slot = word & WORD_MASK;
        }
        Ok(())
    }

    /// Returns every word to the erased state.
    pub fn erase(&mut self) {
        self.words.fill(ERASED_WORD);
    }

    /// All words, for dumps and disassembly.
    #[must_use]
    pub fn words(&self) -> &[u16] {
        &self.words
    }
}

impl Default for ProgramMemory {
    fn default() -> Self {
        Self::new(PROGRAM_WORDS)
    }
}
