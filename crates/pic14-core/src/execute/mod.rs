//! Fetch, decode and dispatch of one instruction at a time.
//!
//! A step fetches the word at PC, decodes it, advances PC, runs the
//! mnemonic's routine and charges cycles. A decode fault aborts the step
//! before PC moves, so a faulting word leaves the core untouched.

pub mod flags;
pub mod indirect;

pub use flags::{add, sub, AluResult, FlagsUpdate};
pub use indirect::{sign_extend, target, IndirectTarget, PointerMode, PROGRAM_WINDOW_START};

use tracing::{trace, warn};

use crate::api::{
    Core, NullSink, ResetCause, RunOutcome, StepOutcome, StopReason, TraceEvent, TraceSink,
};
use crate::catalog::{Field, Mnemonic};
use crate::decoder::Instruction;
use crate::fault::Fault;
use crate::memory::TRADITIONAL_END;
use crate::state::registers::{
    INDF0, INDF1, INTCON_GIE, PCL, STATUS_C, STATUS_NOT_PD, STATUS_NOT_TO, TRISA, TRISB,
};
use crate::state::RunState;

/// Side effects of one routine that the step loop accounts for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Effect {
    skipped: bool,
    pcl_written: bool,
    stack_wrapped: Option<bool>,
}

impl Effect {
    const fn redirected(self) -> bool {
        self.skipped || self.pcl_written
    }
}

const fn low_byte(value: u16) -> u8 {
    value.to_le_bytes()[0]
}

const fn fsr_index(value: u16) -> u8 {
    low_byte(value) & 1
}

impl Core {
    /// Executes one instruction.
    ///
    /// # Errors
    ///
    /// Decode faults for reserved words; PC and all other state are left as
    /// they were.
    pub fn step(&mut self) -> Result<StepOutcome, Fault> {
        self.step_traced(&mut NullSink)
    }

    /// [`Self::step`] reporting [`TraceEvent`]s to `sink`.
    ///
    /// # Errors
    ///
    /// As [`Self::step`].
    pub fn step_traced(&mut self, sink: &mut dyn TraceSink) -> Result<StepOutcome, Fault> {
        if !self.run_state.is_running() {
            return Ok(StepOutcome::Sleeping);
        }

        let pc = self.pc();
        let word = self.program.fetch(pc);
        sink.on_event(TraceEvent::InstructionStart { pc, word });

        let instruction = match self.decoder.decode(word) {
            Ok(instruction) => instruction,
            Err(fault) => {
                warn!(pc, word, %fault, "decode fault");
                sink.on_event(TraceEvent::FaultRaised {
                    pc,
                    class: fault.class(),
                });
                return Err(fault);
            }
        };

        self.set_pc(pc.wrapping_add(1));
        let effect = self.execute(&instruction);
        if effect.skipped {
            self.set_pc(self.pc().wrapping_add(1));
        }

        let cycles = instruction.template().cycles().charge(effect.redirected());
        self.cycles += u64::from(cycles);
        self.retired += 1;
        trace!(
            pc,
            word,
            mnemonic = %instruction.mnemonic(),
            cycles,
            skipped = effect.skipped,
            "retired"
        );

        if let Some(overflow) = effect.stack_wrapped {
            sink.on_event(TraceEvent::StackWrapped { overflow });
        }
        sink.on_event(TraceEvent::InstructionRetired {
            pc,
            mnemonic: instruction.mnemonic(),
            cycles,
            skipped: effect.skipped,
        });

        Ok(StepOutcome::Retired {
            cycles,
            skipped: effect.skipped,
        })
    }

    /// Steps until `max_steps` instructions retire, PC reaches the configured
    /// halt address, or the core sleeps.
    ///
    /// # Errors
    ///
    /// The first decode fault; the instructions before it stay retired.
    pub fn run(&mut self, max_steps: u32) -> Result<RunOutcome, Fault> {
        self.run_traced(max_steps, &mut NullSink)
    }

    /// [`Self::run`] reporting [`TraceEvent`]s to `sink`.
    ///
    /// # Errors
    ///
    /// As [`Self::run`].
    pub fn run_traced(
        &mut self,
        max_steps: u32,
        sink: &mut dyn TraceSink,
    ) -> Result<RunOutcome, Fault> {
        let mut steps = 0;
        let mut cycles = 0;
        let stop = loop {
            if !self.run_state.is_running() {
                break StopReason::Sleeping;
            }
            if self.config.halt_address == Some(self.pc()) {
                break StopReason::HaltAddress;
            }
            if steps >= max_steps {
                break StopReason::StepLimit;
            }
            match self.step_traced(sink)? {
                StepOutcome::Retired { cycles: spent, .. } => {
                    steps += 1;
                    cycles += u64::from(spent);
                }
                StepOutcome::Sleeping => break StopReason::Sleeping,
            }
        };
        Ok(RunOutcome {
            steps,
            cycles,
            stop,
        })
    }

    #[allow(clippy::too_many_lines)]
    fn execute(&mut self, instruction: &Instruction) -> Effect {
        let mut effect = Effect::default();
        let f = instruction.value(Field::F);
        let d = instruction.value(Field::D);
        let k = instruction.value(Field::K);

        match instruction.mnemonic() {
            Mnemonic::Nop => {}
            Mnemonic::Reset => self.reset(ResetCause::Software),
            Mnemonic::Sleep => {
                self.data.set_status_flag(STATUS_NOT_PD, false);
                self.data.set_status_flag(STATUS_NOT_TO, true);
                self.run_state = RunState::Sleeping;
            }
            Mnemonic::Clrwdt => {
                self.data.set_status_flag(STATUS_NOT_PD, true);
                self.data.set_status_flag(STATUS_NOT_TO, true);
            }
            Mnemonic::Option => self.data.set_option_reg(self.data.wreg()),
            Mnemonic::Tris => self.execute_tris(f),
            Mnemonic::Movlb => self.data.set_bsr(low_byte(k)),
            Mnemonic::Movlp => self.data.set_pclath(low_byte(k)),
            Mnemonic::Movlw => self.data.set_wreg(low_byte(k)),

            Mnemonic::Goto => self.set_pc(self.paged(k)),
            Mnemonic::Call => {
                effect.stack_wrapped = self.push_return();
                self.set_pc(self.paged(k));
            }
            Mnemonic::Callw => {
                effect.stack_wrapped = self.push_return();
                self.set_pc(u16::from_le_bytes([self.data.wreg(), self.data.pclath()]));
            }
            Mnemonic::Bra => self.set_pc(self.pc().wrapping_add_signed(sign_extend(k, 9))),
            Mnemonic::Brw => self.set_pc(self.pc().wrapping_add(u16::from(self.data.wreg()))),
            Mnemonic::Return => effect.stack_wrapped = self.pop_return(),
            Mnemonic::Retlw => {
                self.data.set_wreg(low_byte(k));
                effect.stack_wrapped = self.pop_return();
            }
            Mnemonic::Retfie => {
                effect.stack_wrapped = self.pop_return();
                self.data
                    .set_intcon(self.data.intcon() | (1 << INTCON_GIE));
            }

            Mnemonic::Movwf => self.write_file(f, self.data.wreg(), &mut effect),
            Mnemonic::Clrw => {
                self.data.set_wreg(0);
                FlagsUpdate::Zero(true).apply(&mut self.data);
            }
            Mnemonic::Clrf => {
                self.write_file(f, 0, &mut effect);
                FlagsUpdate::Zero(true).apply(&mut self.data);
            }

            Mnemonic::Addwf | Mnemonic::Addwfc => {
                let carry_in =
                    instruction.mnemonic() == Mnemonic::Addwfc && self.data.status_flag(STATUS_C);
                let result = add(self.read_file(f), self.data.wreg(), carry_in);
                self.store(d, f, result.value, result.flags(), &mut effect);
            }
            Mnemonic::Subwf | Mnemonic::Subwfb => {
                let borrow_in =
                    instruction.mnemonic() == Mnemonic::Subwfb && !self.data.status_flag(STATUS_C);
                let result = sub(self.read_file(f), self.data.wreg(), borrow_in);
                self.store(d, f, result.value, result.flags(), &mut effect);
            }
            Mnemonic::Addlw => {
                let result = add(self.data.wreg(), low_byte(k), false);
                self.set_wreg_with(result.value, result.flags());
            }
            Mnemonic::Sublw => {
                let result = sub(low_byte(k), self.data.wreg(), false);
                self.set_wreg_with(result.value, result.flags());
            }

            Mnemonic::Andwf => self.logic_file(Logic::And, d, f, &mut effect),
            Mnemonic::Iorwf => self.logic_file(Logic::Ior, d, f, &mut effect),
            Mnemonic::Xorwf => self.logic_file(Logic::Xor, d, f, &mut effect),
            Mnemonic::Andlw => self.logic_literal(Logic::And, low_byte(k)),
            Mnemonic::Iorlw => self.logic_literal(Logic::Ior, low_byte(k)),
            Mnemonic::Xorlw => self.logic_literal(Logic::Xor, low_byte(k)),

            Mnemonic::Movf => {
                let value = self.read_file(f);
                self.store(d, f, value, FlagsUpdate::zero(value), &mut effect);
            }
            Mnemonic::Comf => {
                let value = !self.read_file(f);
                self.store(d, f, value, FlagsUpdate::zero(value), &mut effect);
            }
            Mnemonic::Swapf => {
                let value = self.read_file(f).rotate_left(4);
                self.store(d, f, value, FlagsUpdate::None, &mut effect);
            }
            Mnemonic::Incf => {
                let value = self.read_file(f).wrapping_add(1);
                self.store(d, f, value, FlagsUpdate::zero(value), &mut effect);
            }
            Mnemonic::Decf => {
                let value = self.read_file(f).wrapping_sub(1);
                self.store(d, f, value, FlagsUpdate::zero(value), &mut effect);
            }
            Mnemonic::Incfsz => {
                let value = self.read_file(f).wrapping_add(1);
                self.store(d, f, value, FlagsUpdate::None, &mut effect);
                effect.skipped = value == 0;
            }
            Mnemonic::Decfsz => {
                let value = self.read_file(f).wrapping_sub(1);
                self.store(d, f, value, FlagsUpdate::None, &mut effect);
                effect.skipped = value == 0;
            }

            Mnemonic::Rlf => {
                let value = self.read_file(f);
                let carry_in = u8::from(self.data.status_flag(STATUS_C));
                let update = FlagsUpdate::Carry(value & 0x80 != 0);
                self.store(d, f, (value << 1) | carry_in, update, &mut effect);
            }
            Mnemonic::Rrf => {
                let value = self.read_file(f);
                let carry_in = u8::from(self.data.status_flag(STATUS_C)) << 7;
                let update = FlagsUpdate::Carry(value & 1 != 0);
                self.store(d, f, (value >> 1) | carry_in, update, &mut effect);
            }
            Mnemonic::Lslf => self.shift_file(Shift::Left, d, f, &mut effect),
            Mnemonic::Lsrf => self.shift_file(Shift::Right, d, f, &mut effect),
            Mnemonic::Asrf => self.shift_file(Shift::Arithmetic, d, f, &mut effect),

            Mnemonic::Bcf | Mnemonic::Bsf => {
                let mask = 1u8 << instruction.value(Field::B);
                let value = self.read_file(f);
                let value = if instruction.mnemonic() == Mnemonic::Bsf {
                    value | mask
                } else {
                    value & !mask
                };
                self.write_file(f, value, &mut effect);
            }
            Mnemonic::Btfsc | Mnemonic::Btfss => {
                let set = self.read_file(f) & (1u8 << instruction.value(Field::B)) != 0;
                effect.skipped = set == (instruction.mnemonic() == Mnemonic::Btfss);
            }

            Mnemonic::Addfsr => {
                let n = fsr_index(instruction.value(Field::N));
                let pointer = self.data.fsr(n).wrapping_add_signed(sign_extend(k, 6));
                self.data.set_fsr(n, pointer);
            }
            Mnemonic::Moviw | Mnemonic::Movwi => {
                let n = fsr_index(instruction.value(Field::N));
                let mode = PointerMode::from_bits(instruction.value(Field::M));
                let (access, updated) = mode.apply(self.data.fsr(n));
                self.data.set_fsr(n, updated);
                self.transfer_indirect(instruction.mnemonic() == Mnemonic::Moviw, access);
            }
            Mnemonic::Moviwk | Mnemonic::Movwik => {
                let n = fsr_index(instruction.value(Field::N));
                let access = self.data.fsr(n).wrapping_add_signed(sign_extend(k, 6));
                self.transfer_indirect(instruction.mnemonic() == Mnemonic::Moviwk, access);
            }
        }

        effect
    }

    /// `GOTO`/`CALL` target: page bits from `PCLATH<6:3>` over the 11-bit literal.
    fn paged(&self, k: u16) -> u16 {
        (u16::from(self.data.pclath() & 0x78) << 8) | (k & 0x07FF)
    }

    fn push_return(&mut self) -> Option<bool> {
        let pc = self.pc();
        let overflow = self.stack.push(&mut self.data, pc);
        overflow.then_some(true)
    }

    fn pop_return(&mut self) -> Option<bool> {
        let popped = self.stack.pop(&mut self.data);
        self.set_pc(popped.address);
        popped.underflow.then_some(false)
    }

    fn execute_tris(&mut self, f: u16) {
        let wreg = self.data.wreg();
        match f {
            5 => self.data.poke(TRISA, wreg),
            6 => self.data.poke(TRISB, wreg),
            _ => warn!(port = f, "TRIS for a port this device lacks"),
        }
    }

    fn file_address(&self, f: u16) -> u16 {
        (u16::from(self.data.bsr()) << 7) | (f & 0x7F)
    }

    fn read_file(&self, f: u16) -> u8 {
        let address = self.file_address(f);
        match address & 0x7F {
            INDF0 => self.read_indirect(self.data.fsr(0)),
            INDF1 => self.read_indirect(self.data.fsr(1)),
            _ => self.data.peek(address),
        }
    }

    fn write_file(&mut self, f: u16, value: u8, effect: &mut Effect) {
        let address = self.file_address(f);
        match address & 0x7F {
            INDF0 => self.write_indirect(self.data.fsr(0), value),
            INDF1 => self.write_indirect(self.data.fsr(1), value),
            PCL => {
                self.set_pc(u16::from_le_bytes([value, self.data.pclath()]));
                effect.pcl_written = true;
            }
            _ => self.data.poke(address, value),
        }
    }

    /// Writes a dual-destination result: `d == 0` selects W, otherwise the file.
    fn store(&mut self, d: u16, f: u16, value: u8, update: FlagsUpdate, effect: &mut Effect) {
        if d == 0 {
            self.data.set_wreg(value);
        } else {
            self.write_file(f, value, effect);
        }
        update.apply(&mut self.data);
    }

    fn set_wreg_with(&mut self, value: u8, update: FlagsUpdate) {
        self.data.set_wreg(value);
        update.apply(&mut self.data);
    }

    fn logic_file(&mut self, op: Logic, d: u16, f: u16, effect: &mut Effect) {
        let value = op.apply(self.read_file(f), self.data.wreg());
        self.store(d, f, value, FlagsUpdate::zero(value), effect);
    }

    fn logic_literal(&mut self, op: Logic, literal: u8) {
        let value = op.apply(self.data.wreg(), literal);
        self.set_wreg_with(value, FlagsUpdate::zero(value));
    }

    fn shift_file(&mut self, op: Shift, d: u16, f: u16, effect: &mut Effect) {
        let (result, carry) = op.apply(self.read_file(f));
        let update = FlagsUpdate::CarryZero {
            carry,
            zero: result == 0,
        };
        self.store(d, f, result, update, effect);
    }

    fn read_indirect(&self, pointer: u16) -> u8 {
        match target(pointer) {
            IndirectTarget::Data(address) if is_indf(address) => 0,
            IndirectTarget::Data(address) => self.data.peek(address),
            IndirectTarget::Program(address) => self.program_byte(address),
            IndirectTarget::Unmapped => 0,
        }
    }

    /// Low byte of the re-encoded instruction at `address`. Reserved words
    /// have no canonical form and read back raw.
    fn program_byte(&self, address: u16) -> u8 {
        self.decoder
            .decode(self.program.fetch(address))
            .map_or_else(
                |_| self.program.low_byte(address),
                |instruction| low_byte(instruction.encode()),
            )
    }

    fn write_indirect(&mut self, pointer: u16, value: u8) {
        if let IndirectTarget::Data(address) = target(pointer) {
            if !is_indf(address) {
                self.data.poke(address, value);
            }
        }
    }

    fn transfer_indirect(&mut self, load: bool, pointer: u16) {
        if load {
            let value = self.read_indirect(pointer);
            self.set_wreg_with(value, FlagsUpdate::zero(value));
        } else {
            self.write_indirect(pointer, self.data.wreg());
        }
    }
}

const fn is_indf(address: u16) -> bool {
    address <= TRADITIONAL_END && address & 0x7F <= INDF1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Logic {
    And,
    Ior,
    Xor,
}

impl Logic {
    const fn apply(self, a: u8, b: u8) -> u8 {
        match self {
            Self::And => a & b,
            Self::Ior => a | b,
            Self::Xor => a ^ b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shift {
    Left,
    Right,
    Arithmetic,
}

impl Shift {
    /// Returns `(result, carry)`.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    const fn apply(self, value: u8) -> (u8, bool) {
        match self {
            Self::Left => (value << 1, value & 0x80 != 0),
            Self::Right => (value >> 1, value & 1 != 0),
            Self::Arithmetic => (((value as i8) >> 1) as u8, value & 1 != 0),
        }
    }
}
