//! Symbol table and pass-1 address assignment.
//!
//! The first pass walks parsed lines, assigns a word address to every
//! instruction and data word, evaluates `EQU` constants and `ORG` moves, and
//! records labels. Register and bit names from the name map are visible as
//! predefined symbols that source definitions may shadow.

use std::collections::BTreeMap;

use pic14_core::RegisterMap;

use crate::errors::{AsmError, AsmErrorKind};
use crate::parser::{Line, Statement};

/// One past the highest word address an image may use.
pub const ADDRESS_LIMIT: u32 = 0x1_0000;

/// Names visible to operand expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    predefined: BTreeMap<String, i64>,
    defined: BTreeMap<String, i64>,
}

impl SymbolTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with every name in `names`.
    #[must_use]
    pub fn with_names(names: &RegisterMap) -> Self {
        Self {
            predefined: names
                .iter()
                .map(|(name, value)| (name.to_owned(), i64::from(value)))
                .collect(),
            defined: BTreeMap::new(),
        }
    }

    /// Looks up a name, case-insensitively. Source definitions win.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<i64> {
        let name = name.to_ascii_uppercase();
        self.defined
            .get(&name)
            .or_else(|| self.predefined.get(&name))
            .copied()
    }

    /// Defines a label or constant.
    ///
    /// # Errors
    ///
    /// [`AsmErrorKind::DuplicateSymbol`] when the source already defined it.
    pub fn define(&mut self, name: &str, value: i64) -> Result<(), AsmErrorKind> {
        let name = name.to_ascii_uppercase();
        if self.defined.contains_key(&name) {
            return Err(AsmErrorKind::DuplicateSymbol(name));
        }
        self.defined.insert(name, value);
        Ok(())
    }

    /// Labels and constants defined by the source, in name order.
    pub fn defined(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.defined
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }
}

/// A line with its assigned word address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressedLine {
    /// Word address of the first word the line emits.
    pub address: u32,
    /// The parsed line.
    pub line: Line,
}

/// Result of pass 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Lines up to `END`, with addresses.
    pub lines: Vec<AddressedLine>,
    /// Completed symbol table.
    pub symbols: SymbolTable,
}

/// Number of program words a statement emits.
#[must_use]
pub fn statement_size(statement: Option<&Statement>) -> u32 {
    match statement {
        Some(Statement::Instruction { .. }) => 1,
        Some(Statement::Dw(values)) => u32::try_from(values.len()).unwrap_or(u32::MAX),
        _ => 0,
    }
}

/// Assigns addresses starting at zero and fills `symbols`.
///
/// # Errors
///
/// Duplicate symbols, forward references in `EQU`/`ORG`, and addresses past
/// [`ADDRESS_LIMIT`].
pub fn assign_addresses(lines: Vec<Line>, mut symbols: SymbolTable) -> Result<Assignment, AsmError> {
    let mut addressed = Vec::with_capacity(lines.len());
    let mut here: u32 = 0;

    for line in lines {
        let at = |kind| AsmError::new(line.number, kind);
        match (&line.statement, &line.label) {
            (Some(Statement::Equ(expr)), Some(name)) => {
                let value = expr.evaluate(&symbols, here).map_err(at)?;
                symbols.define(name, value).map_err(at)?;
            }
            (Some(Statement::Equ(_)), None) => return Err(at(AsmErrorKind::MissingName)),
            (Some(Statement::Org(expr)), label) => {
                let target = expr.evaluate(&symbols, here).map_err(at)?;
                here = u32::try_from(target)
                    .ok()
                    .filter(|address| *address < ADDRESS_LIMIT)
                    .ok_or_else(|| at(AsmErrorKind::ValueOutOfRange(target)))?;
                if let Some(name) = label {
                    symbols.define(name, i64::from(here)).map_err(at)?;
                }
            }
            (_, Some(name)) => symbols.define(name, i64::from(here)).map_err(at)?,
            (_, None) => {}
        }

        let size = statement_size(line.statement.as_ref());
        let end = here.saturating_add(size);
        if end > ADDRESS_LIMIT {
            return Err(at(AsmErrorKind::ValueOutOfRange(i64::from(end))));
        }
        let stop = matches!(line.statement, Some(Statement::End));
        addressed.push(AddressedLine {
            address: here,
            line,
        });
        here = end;
        if stop {
            break;
        }
    }

    Ok(Assignment {
        lines: addressed,
        symbols,
    })
}

#[cfg(test)]
mod tests {
    use pic14_core::{Catalog, RegisterMap};

    use super::{assign_addresses, SymbolTable};
    use crate::errors::AsmErrorKind;
    use crate::parser::{parse_line, Line};

    fn parse(source: &[&str]) -> Vec<Line> {
        let catalog = Catalog::enhanced_midrange();
        source
            .iter()
            .enumerate()
            .map(|(index, text)| parse_line(index + 1, text, &catalog).expect("parses"))
            .collect()
    }

    #[test]
    fn labels_take_the_next_word_address() {
        let lines = parse(&["start:", "  nop", "loop nop", "  bra loop", "done:"]);
        let assignment = assign_addresses(lines, SymbolTable::new()).expect("assigns");
        assert_eq!(assignment.symbols.get("start"), Some(0));
        assert_eq!(assignment.symbols.get("LOOP"), Some(1));
        assert_eq!(assignment.symbols.get("done"), Some(3));
        assert_eq!(assignment.lines[3].address, 2);
    }

    #[test]
    fn org_and_equ() {
        let lines = parse(&["COUNT EQU 0x20", "  ORG 0x10", "entry: nop", "NEXT EQU $ + 1"]);
        let assignment = assign_addresses(lines, SymbolTable::new()).expect("assigns");
        assert_eq!(assignment.symbols.get("COUNT"), Some(0x20));
        assert_eq!(assignment.symbols.get("ENTRY"), Some(0x10));
        assert_eq!(assignment.symbols.get("NEXT"), Some(0x12));
    }

    #[test]
    fn end_stops_the_pass() {
        let lines = parse(&["  nop", "  end", "after: nop"]);
        let assignment = assign_addresses(lines, SymbolTable::new()).expect("assigns");
        assert_eq!(assignment.lines.len(), 2);
        assert_eq!(assignment.symbols.get("AFTER"), None);
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let lines = parse(&["here: nop", "here: nop"]);
        let error = assign_addresses(lines, SymbolTable::new()).expect_err("duplicate");
        assert_eq!(error.line, 2);
        assert_eq!(error.kind, AsmErrorKind::DuplicateSymbol("HERE".to_owned()));
    }

    #[test]
    fn source_may_shadow_register_names() {
        let mut symbols = SymbolTable::with_names(&RegisterMap::core_registers());
        assert_eq!(symbols.get("status"), Some(3));
        symbols.define("STATUS", 0x70).expect("shadowing a register name");
        assert_eq!(symbols.get("STATUS"), Some(0x70));
        assert_eq!(symbols.defined().count(), 1);
    }

    #[test]
    fn org_past_the_address_space_is_rejected() {
        let lines = parse(&["  org 0x10000"]);
        let error = assign_addresses(lines, SymbolTable::new()).expect_err("too far");
        assert_eq!(error.kind, AsmErrorKind::ValueOutOfRange(0x10000));
    }
}
