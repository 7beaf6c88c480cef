//! ALU arithmetic and STATUS flag updates.

use crate::memory::DataMemory;
use crate::state::registers::{STATUS_C, STATUS_DC, STATUS_Z};

/// Result of an 8-bit add or subtract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    /// Low eight bits of the result.
    pub value: u8,
    /// Carry out of bit 7; for subtraction, set when no borrow occurred.
    pub carry: bool,
    /// Carry out of bit 3; for subtraction, set when no digit borrow occurred.
    pub digit_carry: bool,
}

impl AluResult {
    /// Flag update for the add/subtract class.
    #[must_use]
    pub const fn flags(self) -> FlagsUpdate {
        FlagsUpdate::Arithmetic {
            carry: self.carry,
            digit_carry: self.digit_carry,
            zero: self.value == 0,
        }
    }
}

/// `a + b + carry_in`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_lossless)]
pub const fn add(a: u8, b: u8, carry_in: bool) -> AluResult {
    let carry_in = carry_in as u16;
    let sum = a as u16 + b as u16 + carry_in;
    AluResult {
        value: sum as u8,
        carry: sum > 0xFF,
        digit_carry: (a & 0x0F) as u16 + (b & 0x0F) as u16 + carry_in > 0x0F,
    }
}

/// `minuend - subtrahend - borrow_in`, carry meaning "no borrow".
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_lossless)]
pub const fn sub(minuend: u8, subtrahend: u8, borrow_in: bool) -> AluResult {
    let borrow_in = borrow_in as i16;
    let difference = minuend as i16 - subtrahend as i16 - borrow_in;
    AluResult {
        value: difference as u8,
        carry: difference >= 0,
        digit_carry: (minuend & 0x0F) as i16 - (subtrahend & 0x0F) as i16 - borrow_in >= 0,
    }
}

/// STATUS bits an instruction writes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagsUpdate {
    /// STATUS unchanged.
    #[default]
    None,
    /// Zero only.
    Zero(bool),
    /// Carry only, for rotates.
    Carry(bool),
    /// Carry and zero, for shifts.
    CarryZero {
        /// Bit shifted out.
        carry: bool,
        /// Result was zero.
        zero: bool,
    },
    /// Carry, digit carry and zero, for add and subtract.
    Arithmetic {
        /// Carry / not borrow.
        carry: bool,
        /// Digit carry / not digit borrow.
        digit_carry: bool,
        /// Result was zero.
        zero: bool,
    },
}

impl FlagsUpdate {
    /// Zero flag update for `value`.
    #[must_use]
    pub const fn zero(value: u8) -> Self {
        Self::Zero(value == 0)
    }

    /// Writes the selected bits into STATUS, leaving the others alone.
    pub fn apply(self, memory: &mut DataMemory) {
        match self {
            Self::None => {}
            Self::Zero(zero) => memory.set_status_flag(STATUS_Z, zero),
            Self::Carry(carry) => memory.set_status_flag(STATUS_C, carry),
            Self::CarryZero { carry, zero } => {
                memory.set_status_flag(STATUS_C, carry);
                memory.set_status_flag(STATUS_Z, zero);
            }
            Self::Arithmetic {
                carry,
                digit_carry,
                zero,
            } => {
                memory.set_status_flag(STATUS_C, carry);
                memory.set_status_flag(STATUS_DC, digit_carry);
                memory.set_status_flag(STATUS_Z, zero);
            }
        }
    }
}
