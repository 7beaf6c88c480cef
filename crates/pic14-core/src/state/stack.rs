//! Sixteen-level hardware return stack.
//!
//! The pointer lives in `STKPTR` and the top entry is mirrored into
//! `TOSH:TOSL`. Overflow and underflow never stop execution: the pointer
//! wraps and a sticky bit in `PCON` records what happened.

use tracing::warn;

use crate::memory::DataMemory;
use crate::state::registers::{PCON_STKOVF, PCON_STKUNF};

/// Number of return-address slots.
pub const STACK_DEPTH: usize = 16;
/// Highest slot index.
pub const STKPTR_MAX: u8 = 15;
/// Pointer value of an empty stack.
pub const STKPTR_IDLE: u8 = 0x1F;

/// Result of a pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Popped {
    /// Return address read from the stack.
    pub address: u16,
    /// The stack was empty before the pop.
    pub underflow: bool,
}

/// Return-address slots. The pointer is kept in data memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ReturnStack {
    slots: [u16; STACK_DEPTH],
}

impl ReturnStack {
    /// Stack with every slot zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [0; STACK_DEPTH],
        }
    }

    /// Pushes `address` into slot `(STKPTR + 1) mod 16`.
    ///
    /// Returns `true` when the push overflowed, i.e. the pointer was already
    /// at slot 15. `PCON.STKOVF` is then set and stays set until reset.
    pub fn push(&mut self, memory: &mut DataMemory, address: u16) -> bool {
        let pointer = memory.stkptr();
        let overflow = pointer == STKPTR_MAX;
        let next = pointer.wrapping_add(1) % STACK_DEPTH as u8;
        self.slots[usize::from(next)] = address;
        memory.set_stkptr(next);
        memory.set_top_of_stack(address);
        if overflow {
            warn!(address, "return stack overflow");
            memory.set_pcon(memory.pcon() | (1 << PCON_STKOVF));
        }
        overflow
    }

    /// Pops the entry at `STKPTR` and steps the pointer back.
    ///
    /// Popping the last entry returns the pointer to the idle value. Popping
    /// an empty stack sets `PCON.STKUNF`, reads slot 15 and wraps the
    /// pointer to 14.
    pub fn pop(&mut self, memory: &mut DataMemory) -> Popped {
        let pointer = memory.stkptr();
        let underflow = pointer == STKPTR_IDLE;
        let address = self.slots[usize::from(pointer) % STACK_DEPTH];
        let next = match pointer {
            0 => STKPTR_IDLE,
            _ => (pointer - 1) % STACK_DEPTH as u8,
        };
        memory.set_stkptr(next);
        memory.set_top_of_stack(if next == STKPTR_IDLE {
            0
        } else {
            self.slots[usize::from(next)]
        });
        if underflow {
            warn!(address, "return stack underflow");
            memory.set_pcon(memory.pcon() | (1 << PCON_STKUNF));
        }
        Popped { address, underflow }
    }

    /// Raw slots, indexed by pointer value.
    #[must_use]
    pub const fn slots(&self) -> &[u16; STACK_DEPTH] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::{ReturnStack, STKPTR_IDLE};
    use crate::memory::DataMemory;
    use crate::state::registers::{PCON_STKOVF, PCON_STKUNF};

    fn empty() -> (ReturnStack, DataMemory) {
        let mut memory = DataMemory::new();
        memory.set_stkptr(STKPTR_IDLE);
        (ReturnStack::new(), memory)
    }

    #[test]
    fn push_pop_is_last_in_first_out() {
        let (mut stack, mut memory) = empty();
        assert!(!stack.push(&mut memory, 0x0010));
        assert!(!stack.push(&mut memory, 0x0020));
        assert_eq!(memory.top_of_stack(), 0x0020);
        assert_eq!(stack.pop(&mut memory).address, 0x0020);
        assert_eq!(memory.top_of_stack(), 0x0010);
        let last = stack.pop(&mut memory);
        assert_eq!(last.address, 0x0010);
        assert!(!last.underflow);
        assert_eq!(memory.stkptr(), STKPTR_IDLE);
        assert_eq!(memory.pcon(), 0);
    }

    #[test]
    fn seventeenth_push_overflows_into_first_slot() {
        let (mut stack, mut memory) = empty();
        for depth in 0..16u16 {
            assert!(!stack.push(&mut memory, 0x100 + depth), "push {depth}");
        }
        assert_eq!(memory.stkptr(), 15);
        assert!(stack.push(&mut memory, 0x0777));
        assert_eq!(memory.stkptr(), 0);
        assert_eq!(stack.slots()[0], 0x0777);
        assert_ne!(memory.pcon() & (1 << PCON_STKOVF), 0);

        assert!(!stack.push(&mut memory, 0x0778));
        assert_ne!(memory.pcon() & (1 << PCON_STKOVF), 0, "overflow is sticky");
    }

    #[test]
    fn pop_of_empty_stack_underflows_and_wraps() {
        let (mut stack, mut memory) = empty();
        let popped = stack.pop(&mut memory);
        assert!(popped.underflow);
        assert_eq!(memory.stkptr(), 14);
        assert_ne!(memory.pcon() & (1 << PCON_STKUNF), 0);
    }
}
