//! Host-facing core: configuration, state ownership, reset and trace hooks.

use tracing::debug;

use crate::catalog::Mnemonic;
use crate::decoder::{Decoder, Instruction};
use crate::fault::{Fault, FaultClass};
use crate::memory::{DataMemory, ProgramMemory, RegisterMap, PROGRAM_WORDS};
use crate::state::registers::{
    PCON_NOT_BOR, PCON_NOT_POR, STATUS_NOT_PD, STATUS_NOT_TO, TRISA, TRISB,
};
use crate::state::{ReturnStack, RunState, STKPTR_IDLE};

/// Conventional halt address: the last word of a 2K device, reached with `GOTO $`-style
/// parking code.
pub const DEFAULT_HALT_ADDRESS: u16 = 0x07FF;
/// Implemented program-counter bits.
pub const PC_MASK: u16 = 0x7FFF;
/// Largest program memory the 15-bit program counter can address.
pub const MAX_PROGRAM_WORDS: usize = 0x8000;

/// Configuration fixed for the lifetime of a core.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Program memory size in words.
    pub program_words: usize,
    /// Program address at which [`Core::run`] stops before fetching.
    pub halt_address: Option<u16>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            program_words: PROGRAM_WORDS,
            halt_address: Some(DEFAULT_HALT_ADDRESS),
        }
    }
}

impl CoreConfig {
    /// Checks the configuration before a core is built from it.
    ///
    /// # Errors
    ///
    /// [`Fault::InvalidProgramSize`] unless `program_words` is in
    /// `1..=MAX_PROGRAM_WORDS`.
    pub const fn validate(&self) -> Result<(), Fault> {
        if self.program_words == 0 || self.program_words > MAX_PROGRAM_WORDS {
            return Err(Fault::InvalidProgramSize {
                program_words: self.program_words,
            });
        }
        Ok(())
    }
}

/// What triggered a reset. Both causes currently load the same register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ResetCause {
    /// Power applied.
    PowerOn,
    /// `RESET` instruction.
    Software,
}

/// Result of one [`Core::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// One instruction retired.
    Retired {
        /// Cycles charged.
        cycles: u8,
        /// The following instruction was skipped.
        skipped: bool,
    },
    /// Nothing executed; the core is asleep.
    Sleeping,
}

/// Why [`Core::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The step budget was used up.
    StepLimit,
    /// PC reached the configured halt address.
    HaltAddress,
    /// `SLEEP` executed.
    Sleeping,
}

/// Aggregate result of [`Core::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Instructions retired during this call.
    pub steps: u32,
    /// Cycles charged during this call.
    pub cycles: u64,
    /// Stop condition.
    pub stop: StopReason,
}

/// Register view used by dump formatters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterSnapshot {
    /// Program counter.
    pub pc: u16,
    /// Working register.
    pub wreg: u8,
    /// STATUS.
    pub status: u8,
    /// Bank select.
    pub bsr: u8,
    /// Program counter latch.
    pub pclath: u8,
    /// FSR0 pointer.
    pub fsr0: u16,
    /// FSR1 pointer.
    pub fsr1: u16,
    /// Stack pointer.
    pub stkptr: u8,
    /// Cycles since power-on.
    pub cycles: u64,
    /// Instructions retired since power-on.
    pub retired: u64,
}

/// One program cell as returned by [`Core::dump_program`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramCell {
    /// Word address.
    pub address: u16,
    /// Raw word.
    pub word: u16,
    /// Decoded form, or the decode fault for reserved words.
    pub decoded: Result<Instruction, Fault>,
}

/// Deterministic trace events emitted by [`Core::step_traced`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Word fetched, before decode.
    InstructionStart {
        /// Fetch address.
        pc: u16,
        /// Raw program word.
        word: u16,
    },
    /// Instruction retired.
    InstructionRetired {
        /// Address the instruction was fetched from.
        pc: u16,
        /// Executed instruction.
        mnemonic: Mnemonic,
        /// Cycles charged.
        cycles: u8,
        /// The following instruction was skipped.
        skipped: bool,
    },
    /// A push or pop wrapped the return stack.
    StackWrapped {
        /// `true` for overflow, `false` for underflow.
        overflow: bool,
    },
    /// Decode failed; no state changed.
    FaultRaised {
        /// Fetch address.
        pc: u16,
        /// Fault class.
        class: FaultClass,
    },
}

/// Receiver for [`TraceEvent`]s.
pub trait TraceSink {
    /// Handles one event.
    fn on_event(&mut self, event: TraceEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// One simulated processor: register file, data and program memory, return stack.
#[derive(Debug, Clone)]
pub struct Core {
    pub(crate) decoder: Decoder,
    pub(crate) config: CoreConfig,
    pub(crate) data: DataMemory,
    pub(crate) program: ProgramMemory,
    pub(crate) stack: ReturnStack,
    pub(crate) pch: u8,
    pub(crate) run_state: RunState,
    pub(crate) cycles: u64,
    pub(crate) retired: u64,
}

impl Core {
    /// Builds a core in the power-on reset state with erased program memory.
    ///
    /// # Errors
    ///
    /// [`Fault::InvalidProgramSize`] from [`CoreConfig::validate`].
    pub fn new(decoder: Decoder, config: CoreConfig) -> Result<Self, Fault> {
        config.validate()?;
        Ok(Self::build(decoder, config))
    }

    fn build(decoder: Decoder, config: CoreConfig) -> Self {
        let mut core = Self {
            decoder,
            data: DataMemory::new(),
            program: ProgramMemory::new(config.program_words),
            config,
            stack: ReturnStack::new(),
            pch: 0,
            run_state: RunState::Running,
            cycles: 0,
            retired: 0,
        };
        core.reset(ResetCause::PowerOn);
        core
    }

    /// Replaces the register-name map used by named data accessors.
    #[must_use]
    pub fn with_names(mut self, names: RegisterMap) -> Self {
        self.data.set_names(names);
        self
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Decoder the core executes with.
    #[must_use]
    pub const fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Data memory, including every register.
    #[must_use]
    pub const fn data(&self) -> &DataMemory {
        &self.data
    }

    /// Mutable data memory. Plain stores: writing `PCL` here does not jump.
    pub fn data_mut(&mut self) -> &mut DataMemory {
        &mut self.data
    }

    /// Program memory.
    #[must_use]
    pub const fn program(&self) -> &ProgramMemory {
        &self.program
    }

    /// Return stack slots.
    #[must_use]
    pub const fn stack(&self) -> &ReturnStack {
        &self.stack
    }

    /// Run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Cycles charged since power-on.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Instructions retired since power-on.
    #[must_use]
    pub const fn retired(&self) -> u64 {
        self.retired
    }

    /// Program counter: the high latch over `PCL`.
    #[must_use]
    pub fn pc(&self) -> u16 {
        u16::from_le_bytes([self.data.pcl(), self.pch])
    }

    /// Sets the program counter, splitting it into `PCL` and the high latch.
    /// Addresses past the end of program memory wrap the way fetch does.
    pub fn set_pc(&mut self, pc: u16) {
        let [low, high] = self.program.wrap(pc & PC_MASK).to_le_bytes();
        self.data.set_pcl(low);
        self.pch = high;
    }

    /// Writes `words` into program memory starting at `base`.
    ///
    /// # Errors
    ///
    /// [`Fault::ProgramOutOfRange`] when the words do not fit; nothing is written.
    pub fn load_program(&mut self, base: u16, words: &[u16]) -> Result<(), Fault> {
        self.program.load(base, words)?;
        debug!(base, len = words.len(), "program loaded");
        Ok(())
    }

    /// Decoded form of the program word at `address`.
    ///
    /// # Errors
    ///
    /// Decode faults for reserved words.
    pub fn decode_at(&self, address: u16) -> Result<Instruction, Fault> {
        self.decoder.decode(self.program.fetch(address))
    }

    /// Decodes `len` program cells starting at `start`.
    pub fn dump_program(&self, start: u16, len: u16) -> impl Iterator<Item = ProgramCell> + '_ {
        (0..len).map(move |offset| {
            let address = start.wrapping_add(offset);
            let word = self.program.fetch(address);
            ProgramCell {
                address,
                word,
                decoded: self.decoder.decode(word),
            }
        })
    }

    /// Current register values.
    #[must_use]
    pub fn registers(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            pc: self.pc(),
            wreg: self.data.wreg(),
            status: self.data.status(),
            bsr: self.data.bsr(),
            pclath: self.data.pclath(),
            fsr0: self.data.fsr(0),
            fsr1: self.data.fsr(1),
            stkptr: self.data.stkptr(),
            cycles: self.cycles,
            retired: self.retired,
        }
    }

    /// Reinitializes registers and data memory. Program memory is kept.
    pub fn reset(&mut self, cause: ResetCause) {
        debug!(?cause, "reset");
        self.data.clear();
        self.data
            .set_status((1 << STATUS_NOT_TO) | (1 << STATUS_NOT_PD));
        self.data.set_pcon((1 << PCON_NOT_POR) | (1 << PCON_NOT_BOR));
        self.data.set_stkptr(STKPTR_IDLE);
        self.data.set_option_reg(0xFF);
        self.data.poke(TRISA, 0xFF);
        self.data.poke(TRISB, 0xFF);
        self.pch = 0;
        self.run_state = RunState::Running;
    }
}

impl Default for Core {
    fn default() -> Self {
        Self::build(Decoder::enhanced_midrange(), CoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Core, CoreConfig, ResetCause, DEFAULT_HALT_ADDRESS, MAX_PROGRAM_WORDS};
    use crate::decoder::Decoder;
    use crate::catalog::Mnemonic;
    use crate::fault::Fault;
    use crate::memory::PROGRAM_WORDS;
    use crate::state::registers::{OPTION_REG, PCL, STATUS, TRISA};
    use crate::state::{RunState, STKPTR_IDLE};

    #[test]
    fn default_config_models_a_2k_device() {
        let config = CoreConfig::default();
        assert_eq!(config.program_words, PROGRAM_WORDS);
        assert_eq!(config.halt_address, Some(DEFAULT_HALT_ADDRESS));
    }

    #[test]
    fn power_on_state() {
        let core = Core::default();
        assert_eq!(core.pc(), 0);
        assert_eq!(core.data().get(STATUS), Ok(0x18));
        assert_eq!(core.data().pcon(), 0x03);
        assert_eq!(core.data().stkptr(), STKPTR_IDLE);
        assert_eq!(core.data().get(OPTION_REG), Ok(0xFF));
        assert_eq!(core.data().get(TRISA), Ok(0xFF));
        assert_eq!(core.data().wreg(), 0);
        assert_eq!(core.run_state(), RunState::Running);
    }

    #[test]
    fn pc_is_split_between_pcl_and_latch() {
        let mut core = Core::default();
        core.set_pc(0x0345);
        assert_eq!(core.data().get(PCL), Ok(0x45));
        assert_eq!(core.pc(), 0x0345);
        core.set_pc(0xFFFF);
        assert_eq!(core.pc(), 0x07FF);
    }

    #[test]
    fn pc_wraps_with_program_memory() {
        let mut small = Core::default();
        small.set_pc(0x0923);
        assert_eq!(small.pc(), 0x0123);

        let config = CoreConfig {
            program_words: MAX_PROGRAM_WORDS,
            ..CoreConfig::default()
        };
        let mut full = Core::new(Decoder::enhanced_midrange(), config).expect("valid config");
        full.set_pc(0xFFFF);
        assert_eq!(full.pc(), 0x7FFF);
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(0x8000, true)]
    #[case(0x8001, false)]
    fn program_size_is_checked(#[case] program_words: usize, #[case] accepted: bool) {
        let config = CoreConfig {
            program_words,
            ..CoreConfig::default()
        };
        let result = Core::new(Decoder::enhanced_midrange(), config);
        if accepted {
            assert_eq!(result.map(|core| core.program().len()).ok(), Some(program_words));
        } else {
            assert_eq!(
                result.map(|_| ()),
                Err(Fault::InvalidProgramSize { program_words })
            );
        }
    }

    #[test]
    fn software_and_power_on_reset_load_the_same_registers() {
        let mut core = Core::default();
        core.data_mut().set_wreg(0x55);
        core.set_pc(0x10);
        core.reset(ResetCause::Software);
        let after_software = core.data().clone();
        core.reset(ResetCause::PowerOn);
        assert_eq!(core.data(), &after_software);
        assert_eq!(core.data().wreg(), 0);
        assert_eq!(core.pc(), 0);
    }

    #[test]
    fn reset_keeps_program_memory() {
        let mut core = Core::default();
        core.load_program(0, &[0x3050]).expect("fits");
        core.reset(ResetCause::Software);
        assert_eq!(core.program().fetch(0), 0x3050);
    }

    #[test]
    fn dump_decodes_each_cell() {
        let mut core = Core::default();
        core.load_program(0x10, &[0x3050, 0x0005]).expect("fits");
        let cells: Vec<_> = core.dump_program(0x10, 3).collect();
        assert_eq!(cells.len(), 3);
        assert_eq!(
            cells[0].decoded.as_ref().map(|instruction| instruction.mnemonic()),
            Ok(Mnemonic::Movlw)
        );
        assert_eq!(
            cells[1].decoded,
            Err(Fault::IllegalInstruction { word: 0x0005 })
        );
        assert_eq!(cells[2].word, 0x3FFF);
        assert_eq!(cells[2].address, 0x12);
    }

    #[test]
    fn snapshot_reads_the_register_file() {
        let mut core = Core::default();
        core.data_mut().set_wreg(0x12);
        core.data_mut().set_fsr(1, 0x2001);
        let registers = core.registers();
        assert_eq!(registers.wreg, 0x12);
        assert_eq!(registers.fsr1, 0x2001);
        assert_eq!(registers.status, 0x18);
        assert_eq!(registers.stkptr, 0x1F);
    }

    #[test]
    fn oversized_program_is_rejected() {
        let mut core = Core::default();
        assert_eq!(
            core.load_program(0x07FF, &[0, 0]),
            Err(Fault::ProgramOutOfRange {
                base: 0x07FF,
                len: 2
            })
        );
    }
}
