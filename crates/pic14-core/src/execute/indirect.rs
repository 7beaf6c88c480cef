//! FSR pointer arithmetic and the unified indirect address space.
//!
//! | FSR value | target |
//! |---|---|
//! | `0x0000..=0x0FFF` | traditional data memory |
//! | `0x2000..=0x29AF` | linear data memory |
//! | `0x8000..=0xFFFF` | program memory, low byte, read only |
//! | anything else | reads zero, writes discarded |

use crate::memory::{locate, LINEAR_END};

/// First FSR value that addresses program memory.
pub const PROGRAM_WINDOW_START: u16 = 0x8000;

/// Where an FSR value points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndirectTarget {
    /// Data memory address.
    Data(u16),
    /// Program memory word address.
    Program(u16),
    /// Unimplemented: reads zero, writes discarded.
    Unmapped,
}

/// Classifies an FSR value.
#[must_use]
pub const fn target(pointer: u16) -> IndirectTarget {
    if pointer >= PROGRAM_WINDOW_START {
        IndirectTarget::Program(pointer - PROGRAM_WINDOW_START)
    } else if pointer <= LINEAR_END && locate(pointer).is_some() {
        IndirectTarget::Data(pointer)
    } else {
        IndirectTarget::Unmapped
    }
}

/// Pre/post increment/decrement mode of `MOVIW`/`MOVWI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerMode {
    /// `++FSRn`
    PreIncrement,
    /// `--FSRn`
    PreDecrement,
    /// `FSRn++`
    PostIncrement,
    /// `FSRn--`
    PostDecrement,
}

impl PointerMode {
    /// Decodes the two-bit `m` field.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        match bits & 0b11 {
            0 => Self::PreIncrement,
            1 => Self::PreDecrement,
            2 => Self::PostIncrement,
            _ => Self::PostDecrement,
        }
    }

    /// Encodes the mode as the two-bit `m` field.
    #[must_use]
    pub const fn bits(self) -> u16 {
        match self {
            Self::PreIncrement => 0,
            Self::PreDecrement => 1,
            Self::PostIncrement => 2,
            Self::PostDecrement => 3,
        }
    }

    /// Returns `(access, updated)`: the pointer to use and the new FSR value.
    #[must_use]
    pub const fn apply(self, fsr: u16) -> (u16, u16) {
        match self {
            Self::PreIncrement => {
                let next = fsr.wrapping_add(1);
                (next, next)
            }
            Self::PreDecrement => {
                let next = fsr.wrapping_sub(1);
                (next, next)
            }
            Self::PostIncrement => (fsr, fsr.wrapping_add(1)),
            Self::PostDecrement => (fsr, fsr.wrapping_sub(1)),
        }
    }
}

/// Sign-extends the low `bits` bits of `value`.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn sign_extend(value: u16, bits: u8) -> i16 {
    let shift = 16 - bits as u32;
    ((value << shift) as i16) >> shift
}

#[cfg(test)]
mod tests {
    use super::{sign_extend, target, IndirectTarget, PointerMode};

    #[test]
    fn pointer_space_is_partitioned() {
        assert_eq!(target(0x0020), IndirectTarget::Data(0x0020));
        assert_eq!(target(0x29AF), IndirectTarget::Data(0x29AF));
        assert_eq!(target(0x1000), IndirectTarget::Unmapped);
        assert_eq!(target(0x29B0), IndirectTarget::Unmapped);
        assert_eq!(target(0x8000), IndirectTarget::Program(0));
        assert_eq!(target(0x87FF), IndirectTarget::Program(0x07FF));
    }

    #[test]
    fn modes_follow_the_two_bit_field() {
        assert_eq!(PointerMode::from_bits(0).apply(0x20), (0x21, 0x21));
        assert_eq!(PointerMode::from_bits(1).apply(0x20), (0x1F, 0x1F));
        assert_eq!(PointerMode::from_bits(2).apply(0x20), (0x20, 0x21));
        assert_eq!(PointerMode::from_bits(3).apply(0x20), (0x20, 0x1F));
        assert_eq!(PointerMode::PreDecrement.apply(0), (0xFFFF, 0xFFFF));
        for bits in 0..4 {
            assert_eq!(PointerMode::from_bits(bits).bits(), bits);
        }
    }

    #[test]
    fn sign_extension_of_short_literals() {
        assert_eq!(sign_extend(0x3F, 6), -1);
        assert_eq!(sign_extend(0x20, 6), -32);
        assert_eq!(sign_extend(0x1F, 6), 31);
        assert_eq!(sign_extend(0x1FE, 9), -2);
        assert_eq!(sign_extend(0x0FF, 9), 255);
    }
}
