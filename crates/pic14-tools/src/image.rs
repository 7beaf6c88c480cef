//! Sparse program images shared by the assembler, HEX codec and CLI.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use pic14_core::{Core, Fault, WORD_MASK};

/// Program words keyed by word address.
///
/// Addresses beyond program memory (configuration fuses at `0x8007`, user
/// IDs) are kept so an image can round-trip through a HEX file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramImage {
    words: BTreeMap<u32, u16>,
}

impl ProgramImage {
    /// Empty image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a word, masked to 14 bits. Returns the word it replaced.
    pub fn insert(&mut self, address: u32, word: u16) -> Option<u16> {
        self.words.insert(address, word & WORD_MASK)
    }

    /// Stores a word unless the address is taken. Returns whether it was stored.
    pub fn insert_new(&mut self, address: u32, word: u16) -> bool {
        match self.words.entry(address) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(word & WORD_MASK);
                true
            }
        }
    }

    /// Word at `address`.
    #[must_use]
    pub fn get(&self, address: u32) -> Option<u16> {
        self.words.get(&address).copied()
    }

    /// Number of words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the image is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.words.iter().map(|(address, word)| (*address, *word))
    }

    /// Contiguous runs as `(base, words)`.
    #[must_use]
    pub fn runs(&self) -> Vec<(u32, Vec<u16>)> {
        let mut runs: Vec<(u32, Vec<u16>)> = Vec::new();
        for (address, word) in self.iter() {
            match runs.last_mut() {
                Some((base, words))
                    if u32::try_from(words.len()).is_ok_and(|len| *base + len == address) =>
                {
                    words.push(word);
                }
                _ => runs.push((address, vec![word])),
            }
        }
        runs
    }

    /// Splits into words below `limit` and words at or above it.
    #[must_use]
    pub fn partition(&self, limit: u32) -> (Self, Self) {
        let (below, above): (BTreeMap<_, _>, BTreeMap<_, _>) =
            self.iter().partition(|(address, _)| *address < limit);
        (Self { words: below }, Self { words: above })
    }

    /// Writes every run into `core` program memory.
    ///
    /// # Errors
    ///
    /// [`Fault::ProgramOutOfRange`] when a run does not fit; runs before it
    /// have already been written.
    pub fn load_into(&self, core: &mut Core) -> Result<(), Fault> {
        for (base, words) in self.runs() {
            let base16 = u16::try_from(base).map_err(|_| Fault::ProgramOutOfRange {
                base: u16::MAX,
                len: words.len(),
            })?;
            core.load_program(base16, &words)?;
        }
        Ok(())
    }
}

impl FromIterator<(u32, u16)> for ProgramImage {
    fn from_iter<I: IntoIterator<Item = (u32, u16)>>(iter: I) -> Self {
        let mut image = Self::new();
        for (address, word) in iter {
            image.insert(address, word);
        }
        image
    }
}
