//! Two-pass assembler pipeline.
//!
//! 1. **Pass 1**: parse every line, assign word addresses, collect labels
//!    and `EQU` constants on top of the register-name map.
//! 2. **Pass 2**: evaluate operands and encode each instruction through the
//!    core's [`Decoder`], so the assembler and the simulator share one
//!    catalog.

use pic14_core::{Decoder, Field, FieldValues, InstructionTemplate, Mnemonic, RegisterMap};
use tracing::debug;

use crate::errors::{AsmError, AsmErrorKind};
use crate::image::ProgramImage;
use crate::parser::{parse_line, Expr, Operand, Statement};
use crate::symbols::{assign_addresses, AddressedLine, SymbolTable};

/// Assembled program and the symbols it defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// Encoded words by address.
    pub image: ProgramImage,
    /// Labels, constants and the predefined register names.
    pub symbols: SymbolTable,
}

/// Assembles `source` with `names` visible as predefined symbols.
///
/// # Errors
///
/// The first [`AsmError`] encountered, tagged with its source line.
pub fn assemble(source: &str, names: &RegisterMap) -> Result<Assembly, AsmError> {
    let decoder = Decoder::enhanced_midrange();
    let lines = source
        .lines()
        .enumerate()
        .map(|(index, text)| {
            parse_line(index + 1, text, decoder.catalog())
                .map_err(|kind| AsmError::new(index + 1, kind))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let assignment = assign_addresses(lines, SymbolTable::with_names(names))?;

    let mut image = ProgramImage::new();
    for AddressedLine { address, line } in &assignment.lines {
        let at = |kind| AsmError::new(line.number, kind);
        let words = match &line.statement {
            Some(Statement::Instruction { mnemonic, operands }) => {
                vec![
                    encode_instruction(&decoder, &assignment.symbols, *address, mnemonic, operands)
                        .map_err(at)?,
                ]
            }
            Some(Statement::Dw(values)) => values
                .iter()
                .map(|value| data_word(value, &assignment.symbols, *address))
                .collect::<Result<_, _>>()
                .map_err(at)?,
            _ => Vec::new(),
        };
        for (target, word) in (*address..).zip(words) {
            if !image.insert_new(target, word) {
                return Err(at(AsmErrorKind::Overlap(target)));
            }
        }
    }

    debug!(
        words = image.len(),
        symbols = assignment.symbols.defined().count(),
        "assembled"
    );
    Ok(Assembly {
        image,
        symbols: assignment.symbols,
    })
}

fn data_word(value: &Expr, symbols: &SymbolTable, here: u32) -> Result<u16, AsmErrorKind> {
    let value = value.evaluate(symbols, here)?;
    if !(-0x2000..=0x3FFF).contains(&value) {
        return Err(AsmErrorKind::ValueOutOfRange(value));
    }
    Ok(low_bits(value))
}

fn low_bits(value: i64) -> u16 {
    u16::try_from(value & 0xFFFF).unwrap_or_default()
}

/// Encodes one instruction line at word address `here`.
///
/// # Errors
///
/// Unknown mnemonics, operand count or shape mismatches, values out of
/// range and undefined symbols.
pub fn encode_instruction(
    decoder: &Decoder,
    symbols: &SymbolTable,
    here: u32,
    mnemonic: &str,
    operands: &[Operand],
) -> Result<u16, AsmErrorKind> {
    let template = decoder
        .catalog()
        .lookup(mnemonic)
        .ok_or_else(|| AsmErrorKind::UnknownMnemonic(mnemonic.to_owned()))?;
    let shape = |position: usize| AsmErrorKind::OperandShape {
        mnemonic: mnemonic.to_owned(),
        position,
    };
    let count = |expected: usize| AsmErrorKind::OperandCount {
        mnemonic: mnemonic.to_owned(),
        expected,
        found: operands.len(),
    };
    let evaluate = |expr: &Expr| expr.evaluate(symbols, here);

    let (kind, fields) = match template.mnemonic() {
        Mnemonic::Moviw | Mnemonic::Movwi | Mnemonic::Moviwk | Mnemonic::Movwik => {
            let load = matches!(template.mnemonic(), Mnemonic::Moviw | Mnemonic::Moviwk);
            match operands {
                [Operand::Indirect { fsr, mode }] if !template.span(Field::K).is_present() => (
                    template.mnemonic(),
                    FieldValues::new().n(u16::from(*fsr)).m(mode.bits()),
                ),
                [Operand::Indexed { offset, fsr }] => (
                    if load { Mnemonic::Moviwk } else { Mnemonic::Movwik },
                    FieldValues::new()
                        .n(u16::from(*fsr))
                        .k(signed_field(evaluate(offset)?, 6)?),
                ),
                [_] => return Err(shape(1)),
                _ => return Err(count(1)),
            }
        }
        Mnemonic::Addfsr => match operands {
            [Operand::Fsr(fsr), Operand::Expr(k)] => (
                Mnemonic::Addfsr,
                FieldValues::new()
                    .n(u16::from(*fsr))
                    .k(signed_field(evaluate(k)?, 6)?),
            ),
            [Operand::Fsr(_), _] => return Err(shape(2)),
            [_, _] => return Err(shape(1)),
            _ => return Err(count(2)),
        },
        Mnemonic::Bra => match operands {
            [Operand::Expr(target)] => {
                let target = evaluate(target)?;
                let offset = target - (i64::from(here) + 1);
                if !(-256..=255).contains(&offset) {
                    return Err(AsmErrorKind::BranchOutOfRange { target, offset });
                }
                (Mnemonic::Bra, FieldValues::new().k(low_bits(offset)))
            }
            [_] => return Err(shape(1)),
            _ => return Err(count(1)),
        },
        other => (other, positional_fields(template, operands, evaluate, mnemonic)?),
    };
    Ok(decoder.encode(kind.as_str(), &fields)?)
}

// Remaining forms take their operands in template order: f, then d or b,
// or a lone k. A missing destination defaults to F.
fn positional_fields(
    template: &InstructionTemplate,
    operands: &[Operand],
    evaluate: impl Fn(&Expr) -> Result<i64, AsmErrorKind>,
    mnemonic: &str,
) -> Result<FieldValues, AsmErrorKind> {
    let order: Vec<Field> = [Field::F, Field::D, Field::B, Field::K]
        .into_iter()
        .filter(|field| template.span(*field).is_present())
        .collect();
    let defaulted_d = order.contains(&Field::D) && operands.len() + 1 == order.len();
    if operands.len() != order.len() && !defaulted_d {
        return Err(AsmErrorKind::OperandCount {
            mnemonic: mnemonic.to_owned(),
            expected: order.len(),
            found: operands.len(),
        });
    }

    let mut fields = FieldValues::new();
    if defaulted_d {
        fields = fields.d(1);
    }
    for (position, (field, operand)) in order
        .iter()
        .filter(|field| !(defaulted_d && **field == Field::D))
        .zip(operands)
        .enumerate()
    {
        let Operand::Expr(expr) = operand else {
            return Err(AsmErrorKind::OperandShape {
                mnemonic: mnemonic.to_owned(),
                position: position + 1,
            });
        };
        let width = template.span(*field).width();
        fields = fields.with(*field, unsigned_field(*field, width, evaluate(expr)?)?);
    }
    Ok(fields)
}

fn unsigned_field(field: Field, width: u8, value: i64) -> Result<u16, AsmErrorKind> {
    let (low, high) = match (field, width) {
        // Banked register addresses keep only their low seven bits.
        (Field::F, 7) => (0, 0xFFFF),
        (Field::K, 8) => (-128, 0xFF),
        // Page bits above the 11-bit literal come from PCLATH.
        (Field::K, 11) => (0, 0x7FFF),
        _ => (0, (1_i64 << width) - 1),
    };
    if (low..=high).contains(&value) {
        Ok(low_bits(value))
    } else {
        Err(AsmErrorKind::ValueOutOfRange(value))
    }
}

fn signed_field(value: i64, width: u8) -> Result<u16, AsmErrorKind> {
    let half = 1_i64 << (width - 1);
    if (-half..half).contains(&value) {
        Ok(low_bits(value))
    } else {
        Err(AsmErrorKind::ValueOutOfRange(value))
    }
}
