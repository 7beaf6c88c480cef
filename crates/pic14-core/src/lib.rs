//! Instruction-set simulator core for the 14-bit enhanced midrange PIC.
//!
//! Three engines make up the core: the [`catalog`] and [`decoder`] that map
//! 14-bit program words to instructions and back, the banked [`memory`]
//! translator, and the [`execute`] stage that drives a [`Core`] one
//! instruction at a time.

/// Instruction templates and the closed mnemonic set.
pub mod catalog;
pub use catalog::{
    Catalog, Field, FieldSpan, InstructionTemplate, Mnemonic, StatusFlags, ENHANCED_MIDRANGE,
    FIELD_COUNT, WORD_BITS, WORD_MASK,
};

/// Template-driven decoder and encoder.
pub mod decoder;
pub use decoder::{Decoder, FieldValues, Instruction};

/// Banked data memory, address translation and program memory.
pub mod memory;
pub use memory::{
    locate, translate, Address, BankLocation, Cell, DataMemory, ProgramMemory, RegisterMap,
    BANK_COUNT, BANK_SIZE, ERASED_WORD, LINEAR_END, LINEAR_START, PROGRAM_WORDS, TRADITIONAL_END,
};

/// Register file views, return stack and run state.
pub mod state;
pub use state::{Popped, ReturnStack, RunState, STACK_DEPTH, STKPTR_IDLE, STKPTR_MAX};

/// Fault taxonomy.
pub mod fault;
pub use fault::{Fault, FaultClass};

/// Instruction cycle costs.
pub mod timing;
pub use timing::CycleCost;

/// Host-facing core, configuration and trace hook.
pub mod api;
pub use api::{
    Core, CoreConfig, NullSink, ProgramCell, RegisterSnapshot, ResetCause, RunOutcome,
    StepOutcome, StopReason, TraceEvent, TraceSink, DEFAULT_HALT_ADDRESS, MAX_PROGRAM_WORDS,
    PC_MASK,
};

/// Fetch, decode and dispatch.
pub mod execute;
pub use execute::{AluResult, FlagsUpdate, IndirectTarget, PointerMode};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
