//! Disassembly listings, register dumps and trace lines.
//!
//! These formatters only consume decoded values the core already produced;
//! nothing here touches simulator state.

use std::fmt;

use pic14_core::execute::sign_extend;
use pic14_core::state::registers::{STATUS_C, STATUS_DC, STATUS_NOT_PD, STATUS_NOT_TO, STATUS_Z};
use pic14_core::{
    Core, Field, Instruction, Mnemonic, PointerMode, ProgramCell, RegisterSnapshot, TraceEvent,
    PC_MASK,
};

/// One disassembled program word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassemblyRow {
    /// Word address.
    pub address: u16,
    /// Raw 14-bit word.
    pub word: u16,
    /// Mnemonic, or `.dw` for a reserved word.
    pub mnemonic: String,
    /// Formatted operands, possibly empty.
    pub operands: String,
    /// Whether the word decodes to no instruction.
    pub is_illegal: bool,
}

impl DisassemblyRow {
    /// Builds the row for a dumped program cell.
    #[must_use]
    pub fn from_cell(cell: &ProgramCell) -> Self {
        match &cell.decoded {
            Ok(instruction) => Self {
                address: cell.address,
                word: cell.word,
                mnemonic: display_mnemonic(instruction.mnemonic()).to_owned(),
                operands: format_operands(instruction, cell.address),
                is_illegal: false,
            },
            Err(_) => Self {
                address: cell.address,
                word: cell.word,
                mnemonic: ".dw".to_owned(),
                operands: format!("0x{:04X}", cell.word),
                is_illegal: true,
            },
        }
    }
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}: {:04X}  {}", self.address, self.word, self.mnemonic)?;
        if !self.operands.is_empty() {
            write!(f, " {}", self.operands)?;
        }
        Ok(())
    }
}

/// Disassembles `len` words of `core` program memory starting at `start`.
#[must_use]
pub fn disassemble(core: &Core, start: u16, len: u16) -> Vec<DisassemblyRow> {
    core.dump_program(start, len)
        .map(|cell| DisassemblyRow::from_cell(&cell))
        .collect()
}

/// Formats one instruction as assembler source, e.g. `ADDWF 0x25, F`.
#[must_use]
pub fn format_instruction(instruction: &Instruction, address: u16) -> String {
    let operands = format_operands(instruction, address);
    let mnemonic = display_mnemonic(instruction.mnemonic());
    if operands.is_empty() {
        mnemonic.to_owned()
    } else {
        format!("{mnemonic} {operands}")
    }
}

// The indexed indirect forms share the MOVIW/MOVWI spelling in source.
const fn display_mnemonic(mnemonic: Mnemonic) -> &'static str {
    match mnemonic {
        Mnemonic::Moviwk => "MOVIW",
        Mnemonic::Movwik => "MOVWI",
        other => other.as_str(),
    }
}

fn format_operands(instruction: &Instruction, address: u16) -> String {
    let value = |field| instruction.value(field);
    match instruction.mnemonic() {
        Mnemonic::Moviw | Mnemonic::Movwi => {
            let fsr = value(Field::N);
            match PointerMode::from_bits(value(Field::M)) {
                PointerMode::PreIncrement => format!("++FSR{fsr}"),
                PointerMode::PreDecrement => format!("--FSR{fsr}"),
                PointerMode::PostIncrement => format!("FSR{fsr}++"),
                PointerMode::PostDecrement => format!("FSR{fsr}--"),
            }
        }
        Mnemonic::Moviwk | Mnemonic::Movwik => {
            format!("{}[FSR{}]", sign_extend(value(Field::K), 6), value(Field::N))
        }
        Mnemonic::Addfsr => {
            format!("FSR{}, {}", value(Field::N), sign_extend(value(Field::K), 6))
        }
        Mnemonic::Bra => {
            let offset = sign_extend(value(Field::K), 9);
            let target = address.wrapping_add(1).wrapping_add_signed(offset) & PC_MASK;
            format!("0x{target:03X}")
        }
        Mnemonic::Goto | Mnemonic::Call => format!("0x{:03X}", value(Field::K)),
        _ => {
            let mut parts = Vec::new();
            if let Some(f) = instruction.field(Field::F) {
                parts.push(format!("0x{f:02X}"));
            }
            if let Some(d) = instruction.field(Field::D) {
                parts.push(if d == 0 { "W" } else { "F" }.to_owned());
            }
            if let Some(b) = instruction.field(Field::B) {
                parts.push(b.to_string());
            }
            if let Some(k) = instruction.field(Field::K) {
                parts.push(format!("0x{k:02X}"));
            }
            parts.join(", ")
        }
    }
}

/// One-line register dump.
#[must_use]
pub fn format_registers(registers: &RegisterSnapshot) -> String {
    let flag = |bit: u8, name: &str| {
        if registers.status & (1 << bit) == 0 {
            name.to_ascii_lowercase()
        } else {
            name.to_owned()
        }
    };
    format!(
        "PC={:04X} W={:02X} STATUS={:02X} [{} {} {} {} {}] BSR={:02X} PCLATH={:02X} \
         FSR0={:04X} FSR1={:04X} STKPTR={:02X} cycles={}",
        registers.pc,
        registers.wreg,
        registers.status,
        flag(STATUS_NOT_TO, "TO"),
        flag(STATUS_NOT_PD, "PD"),
        flag(STATUS_Z, "Z"),
        flag(STATUS_DC, "DC"),
        flag(STATUS_C, "C"),
        registers.bsr,
        registers.pclath,
        registers.fsr0,
        registers.fsr1,
        registers.stkptr,
        registers.cycles,
    )
}

/// Formats a trace event, or `None` for events the CLI does not print.
#[must_use]
pub fn format_event(event: &TraceEvent) -> Option<String> {
    match event {
        TraceEvent::InstructionStart { .. } => None,
        TraceEvent::InstructionRetired {
            pc,
            mnemonic,
            cycles,
            skipped,
        } => Some(format!(
            "{pc:04X}  {:<7} {cycles}cy{}",
            mnemonic.as_str(),
            if *skipped { " skip" } else { "" }
        )),
        TraceEvent::StackWrapped { overflow } => Some(
            if *overflow {
                "      stack overflow, pointer wrapped"
            } else {
                "      stack underflow, pointer wrapped"
            }
            .to_owned(),
        ),
        TraceEvent::FaultRaised { pc, class } => Some(format!("{pc:04X}  fault: {class:?}")),
    }
}

#[cfg(test)]
mod tests {
    use pic14_core::{Core, Decoder, FieldValues, Mnemonic, TraceEvent};

    use super::{disassemble, format_event, format_instruction, format_registers};

    fn word(mnemonic: &str, fields: FieldValues) -> u16 {
        Decoder::enhanced_midrange()
            .encode(mnemonic, &fields)
            .expect("encodable")
    }

    fn text(mnemonic: &str, fields: FieldValues, address: u16) -> String {
        let decoder = Decoder::enhanced_midrange();
        let instruction = decoder.decode(word(mnemonic, fields)).expect("decodes");
        format_instruction(&instruction, address)
    }

    #[test]
    fn operand_shapes() {
        assert_eq!(text("ADDWF", FieldValues::new().f(0x25).d(1), 0), "ADDWF 0x25, F");
        assert_eq!(text("MOVF", FieldValues::new().f(0x20).d(0), 0), "MOVF 0x20, W");
        assert_eq!(text("BSF", FieldValues::new().f(0x03).b(5), 0), "BSF 0x03, 5");
        assert_eq!(text("MOVWF", FieldValues::new().f(0x7F), 0), "MOVWF 0x7F");
        assert_eq!(text("MOVLW", FieldValues::new().k(0x10), 0), "MOVLW 0x10");
        assert_eq!(text("GOTO", FieldValues::new().k(0x123), 0), "GOTO 0x123");
        assert_eq!(text("NOP", FieldValues::new(), 0), "NOP");
        assert_eq!(text("CLRW", FieldValues::new(), 0), "CLRW");
    }

    #[test]
    fn relative_branch_shows_its_target() {
        assert_eq!(text("BRA", FieldValues::new().k_signed(-2), 3), "BRA 0x002");
        assert_eq!(text("BRA", FieldValues::new().k_signed(5), 0x10), "BRA 0x016");
    }

    #[test]
    fn indirect_forms() {
        assert_eq!(text("MOVIW", FieldValues::new().n(1).m(0), 0), "MOVIW ++FSR1");
        assert_eq!(text("MOVWI", FieldValues::new().n(0).m(3), 0), "MOVWI FSR0--");
        assert_eq!(
            text("MOVIWK", FieldValues::new().n(1).k_signed(-3), 0),
            "MOVIW -3[FSR1]"
        );
        assert_eq!(
            text("ADDFSR", FieldValues::new().n(0).k_signed(31), 0),
            "ADDFSR FSR0, 31"
        );
    }

    #[test]
    fn listing_marks_reserved_words() {
        let mut core = Core::default();
        core.load_program(0, &[word("MOVLW", FieldValues::new().k(0x10)), 0x0005])
            .expect("fits");
        let rows = disassemble(&core, 0, 3);
        assert_eq!(rows[0].to_string(), "0000: 3010  MOVLW 0x10");
        assert!(rows[1].is_illegal);
        assert_eq!(rows[1].to_string(), "0001: 0005  .dw 0x0005");
        assert_eq!(rows[2].to_string(), "0002: 3FFF  MOVWI -1[FSR1]");
    }

    #[test]
    fn register_dump_after_reset() {
        let core = Core::default();
        assert_eq!(
            format_registers(&core.registers()),
            "PC=0000 W=00 STATUS=18 [TO PD z dc c] BSR=00 PCLATH=00 \
             FSR0=0000 FSR1=0000 STKPTR=1F cycles=0"
        );
    }

    #[test]
    fn trace_lines() {
        let retired = TraceEvent::InstructionRetired {
            pc: 2,
            mnemonic: Mnemonic::Decfsz,
            cycles: 2,
            skipped: true,
        };
        assert_eq!(
            format_event(&retired).as_deref(),
            Some("0002  DECFSZ  2cy skip")
        );
        assert_eq!(
            format_event(&TraceEvent::InstructionStart { pc: 0, word: 0 }),
            None
        );
    }
}
