//! Register file, return stack and run state.

/// Core special-function registers over data memory.
pub mod registers;
/// Execution state machine.
pub mod run_state;
/// Hardware return stack.
pub mod stack;

pub use run_state::RunState;
pub use stack::{Popped, ReturnStack, STACK_DEPTH, STKPTR_IDLE, STKPTR_MAX};
