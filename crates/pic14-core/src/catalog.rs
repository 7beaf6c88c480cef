//! Declarative instruction templates for the enhanced midrange core.
//!
//! Every instruction is described once by a 14-character bit template: a
//! leading run of `0`/`1` opcode bits, optional `x` don't-care bits, then one
//! contiguous run per operand field in `b d f n m k` order. Field offsets are
//! computed when the template is built, which for the shipped table happens
//! at compile time.

use crate::fault::Fault;
use crate::timing::CycleCost;

/// Width of a program word in bits.
pub const WORD_BITS: u8 = 14;
/// Mask selecting the implemented bits of a program word.
pub const WORD_MASK: u16 = 0x3FFF;
/// Number of distinct operand fields a template can carry.
pub const FIELD_COUNT: usize = 6;

/// Operand fields in canonical template order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Bit index for bit-oriented instructions.
    B,
    /// Destination select: 0 = WREG, 1 = file register.
    D,
    /// File register address within the selected bank.
    F,
    /// Indirect pointer index (FSR0 or FSR1).
    N,
    /// Pre/post increment/decrement mode for `MOVIW`/`MOVWI`.
    M,
    /// Literal.
    K,
}

impl Field {
    /// All fields in canonical order.
    pub const ALL: [Self; FIELD_COUNT] = [Self::B, Self::D, Self::F, Self::N, Self::M, Self::K];

    /// Template letter for this field.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::B => 'b',
            Self::D => 'd',
            Self::F => 'f',
            Self::N => 'n',
            Self::M => 'm',
            Self::K => 'k',
        }
    }

    /// Parses a template letter.
    #[must_use]
    pub const fn from_letter(letter: u8) -> Option<Self> {
        match letter {
            b'b' => Some(Self::B),
            b'd' => Some(Self::D),
            b'f' => Some(Self::F),
            b'n' => Some(Self::N),
            b'm' => Some(Self::M),
            b'k' => Some(Self::K),
            _ => None,
        }
    }

    /// Position of this field in [`Field::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Bit offsets of one field inside the 14-character template, `start..end`
/// counted from the most significant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldSpan {
    /// First template column of the field.
    pub start: u8,
    /// One past the last template column of the field.
    pub end: u8,
}

impl FieldSpan {
    /// Span of a field the template does not carry.
    pub const ABSENT: Self = Self { start: 0, end: 0 };

    /// Field width in bits.
    #[must_use]
    pub const fn width(self) -> u8 {
        self.end - self.start
    }

    /// Whether the template carries this field.
    #[must_use]
    pub const fn is_present(self) -> bool {
        self.end > self.start
    }

    const fn mask(self) -> u16 {
        (1u16 << self.width()) - 1
    }

    /// Extracts the field value from a program word.
    #[must_use]
    pub const fn extract(self, word: u16) -> u16 {
        (word >> (WORD_BITS - self.end)) & self.mask()
    }

    /// Truncates `value` to the field width and moves it into position.
    #[must_use]
    pub const fn place(self, value: u16) -> u16 {
        if !self.is_present() {
            return 0;
        }
        (value & self.mask()) << (WORD_BITS - self.end)
    }
}

/// Status flags an instruction may modify, using the STATUS bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StatusFlags(u8);

impl StatusFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Carry / not-borrow.
    pub const C: Self = Self(1 << 0);
    /// Digit carry / not-digit-borrow.
    pub const DC: Self = Self(1 << 1);
    /// Zero.
    pub const Z: Self = Self(1 << 2);
    /// Not power-down.
    pub const PD: Self = Self(1 << 3);
    /// Not time-out.
    pub const TO: Self = Self(1 << 4);

    /// Combines two flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every flag in `other` is also in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw STATUS bit mask.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Closed set of instructions the execute stage dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Mnemonic {
    Nop,
    Reset,
    Return,
    Retfie,
    Callw,
    Brw,
    Moviw,
    Movwi,
    Movlb,
    Option,
    Sleep,
    Clrwdt,
    Tris,
    Movwf,
    Clrw,
    Clrf,
    Subwf,
    Decf,
    Iorwf,
    Andwf,
    Xorwf,
    Addwf,
    Movf,
    Comf,
    Incf,
    Decfsz,
    Rrf,
    Rlf,
    Swapf,
    Incfsz,
    Bcf,
    Bsf,
    Btfsc,
    Btfss,
    Call,
    Goto,
    Movlw,
    Addfsr,
    Movlp,
    Bra,
    Retlw,
    Lslf,
    Lsrf,
    Asrf,
    Iorlw,
    Andlw,
    Xorlw,
    Subwfb,
    Sublw,
    Addwfc,
    Addlw,
    Moviwk,
    Movwik,
}

impl Mnemonic {
    /// Assembly spelling of the mnemonic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Reset => "RESET",
            Self::Return => "RETURN",
            Self::Retfie => "RETFIE",
            Self::Callw => "CALLW",
            Self::Brw => "BRW",
            Self::Moviw => "MOVIW",
            Self::Movwi => "MOVWI",
            Self::Movlb => "MOVLB",
            Self::Option => "OPTION",
            Self::Sleep => "SLEEP",
            Self::Clrwdt => "CLRWDT",
            Self::Tris => "TRIS",
            Self::Movwf => "MOVWF",
            Self::Clrw => "CLRW",
            Self::Clrf => "CLRF",
            Self::Subwf => "SUBWF",
            Self::Decf => "DECF",
            Self::Iorwf => "IORWF",
            Self::Andwf => "ANDWF",
            Self::Xorwf => "XORWF",
            Self::Addwf => "ADDWF",
            Self::Movf => "MOVF",
            Self::Comf => "COMF",
            Self::Incf => "INCF",
            Self::Decfsz => "DECFSZ",
            Self::Rrf => "RRF",
            Self::Rlf => "RLF",
            Self::Swapf => "SWAPF",
            Self::Incfsz => "INCFSZ",
            Self::Bcf => "BCF",
            Self::Bsf => "BSF",
            Self::Btfsc => "BTFSC",
            Self::Btfss => "BTFSS",
            Self::Call => "CALL",
            Self::Goto => "GOTO",
            Self::Movlw => "MOVLW",
            Self::Addfsr => "ADDFSR",
            Self::Movlp => "MOVLP",
            Self::Bra => "BRA",
            Self::Retlw => "RETLW",
            Self::Lslf => "LSLF",
            Self::Lsrf => "LSRF",
            Self::Asrf => "ASRF",
            Self::Iorlw => "IORLW",
            Self::Andlw => "ANDLW",
            Self::Xorlw => "XORLW",
            Self::Subwfb => "SUBWFB",
            Self::Sublw => "SUBLW",
            Self::Addwfc => "ADDWFC",
            Self::Addlw => "ADDLW",
            Self::Moviwk => "MOVIWK",
            Self::Movwik => "MOVWIK",
        }
    }
}

impl core::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable descriptor of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionTemplate {
    mnemonic: Mnemonic,
    pattern: &'static str,
    opcode: u16,
    opcode_bits: u8,
    spans: [FieldSpan; FIELD_COUNT],
    cycles: CycleCost,
    flags: StatusFlags,
}

impl InstructionTemplate {
    /// Builds a template from its bit pattern. Spaces in `pattern` are ignored.
    ///
    /// # Panics
    ///
    /// Panics when the pattern is not 14 bits long, does not start with
    /// opcode bits, or has fields that are split or out of `b d f n m k`
    /// order. In a const context this is a compile error.
    #[must_use]
    pub const fn new(
        mnemonic: Mnemonic,
        pattern: &'static str,
        cycles: CycleCost,
        flags: StatusFlags,
    ) -> Self {
        let bytes = pattern.as_bytes();
        let mut opcode = 0u16;
        let mut opcode_bits = 0u8;
        let mut spans = [FieldSpan::ABSENT; FIELD_COUNT];
        let mut last_field = 0usize;
        let mut seen_field = false;
        let mut position = 0u8;
        let mut i = 0;
        while i < bytes.len() {
            let ch = bytes[i];
            i += 1;
            if ch == b' ' {
                continue;
            }
            assert!(position < WORD_BITS, "template is longer than 14 bits");
            if ch == b'0' || ch == b'1' {
                assert!(position == opcode_bits, "opcode bits must lead the template");
                opcode = (opcode << 1) | if ch == b'1' { 1 } else { 0 };
                opcode_bits += 1;
            } else if ch == b'x' {
                assert!(!seen_field, "don't-care bits must precede the fields");
            } else {
                let index = match Field::from_letter(ch) {
                    Some(field) => field.index(),
                    None => panic!("unknown template character"),
                };
                if spans[index].is_present() {
                    assert!(spans[index].end == position, "field bits must be contiguous");
                    spans[index].end += 1;
                } else {
                    assert!(!seen_field || index > last_field, "fields out of order");
                    spans[index] = FieldSpan {
                        start: position,
                        end: position + 1,
                    };
                    last_field = index;
                    seen_field = true;
                }
            }
            position += 1;
        }
        assert!(position == WORD_BITS, "template is shorter than 14 bits");
        assert!(opcode_bits > 0, "template has no opcode bits");

        Self {
            mnemonic,
            pattern,
            opcode,
            opcode_bits,
            spans,
            cycles,
            flags,
        }
    }

    /// Instruction this template describes.
    #[must_use]
    pub const fn mnemonic(&self) -> Mnemonic {
        self.mnemonic
    }

    /// Template text as declared.
    #[must_use]
    pub const fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Fixed opcode bits, right aligned.
    #[must_use]
    pub const fn opcode(&self) -> u16 {
        self.opcode
    }

    /// Number of fixed opcode bits.
    #[must_use]
    pub const fn opcode_bits(&self) -> u8 {
        self.opcode_bits
    }

    /// Opcode rendered as the literal match string, e.g. `"000111"`.
    #[must_use]
    pub fn match_string(&self) -> String {
        format!("{:0width$b}", self.opcode, width = usize::from(self.opcode_bits))
    }

    /// Offsets of `field`, [`FieldSpan::ABSENT`] when the template lacks it.
    #[must_use]
    pub const fn span(&self, field: Field) -> FieldSpan {
        self.spans[field.index()]
    }

    /// Declared cycle cost.
    #[must_use]
    pub const fn cycles(&self) -> CycleCost {
        self.cycles
    }

    /// Status flags the instruction may modify.
    #[must_use]
    pub const fn flags(&self) -> StatusFlags {
        self.flags
    }

    /// Whether the leading bits of `word` equal this template's opcode.
    #[must_use]
    pub const fn matches(&self, word: u16) -> bool {
        (word & WORD_MASK) >> (WORD_BITS - self.opcode_bits) == self.opcode
    }

    /// Opcode bits moved into their word position, every field zero.
    #[must_use]
    pub const fn base_word(&self) -> u16 {
        self.opcode << (WORD_BITS - self.opcode_bits)
    }
}

const ONE: CycleCost = CycleCost::Fixed(1);
const TWO: CycleCost = CycleCost::Fixed(2);
const SKIP: CycleCost = CycleCost::Conditional { base: 1, taken: 2 };

const NONE: StatusFlags = StatusFlags::NONE;
const Z: StatusFlags = StatusFlags::Z;
const C: StatusFlags = StatusFlags::C;
const CZ: StatusFlags = StatusFlags::C.union(StatusFlags::Z);
const ARITH: StatusFlags = StatusFlags::C.union(StatusFlags::DC).union(StatusFlags::Z);
const POWER: StatusFlags = StatusFlags::TO.union(StatusFlags::PD);

/// Instruction table of the PIC16F1826 / PIC12F1822 family.
pub const ENHANCED_MIDRANGE: [InstructionTemplate; 53] = [
    InstructionTemplate::new(Mnemonic::Nop, "00 0000 0000 0000", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Reset, "00 0000 0000 0001", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Return, "00 0000 0000 1000", TWO, NONE),
    InstructionTemplate::new(Mnemonic::Retfie, "00 0000 0000 1001", TWO, NONE),
    InstructionTemplate::new(Mnemonic::Callw, "00 0000 0000 1010", TWO, NONE),
    InstructionTemplate::new(Mnemonic::Brw, "00 0000 0000 1011", TWO, NONE),
    InstructionTemplate::new(Mnemonic::Moviw, "00 0000 0001 0nmm", ONE, Z),
    InstructionTemplate::new(Mnemonic::Movwi, "00 0000 0001 1nmm", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Movlb, "00 0000 001k kkkk", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Option, "00 0000 0110 0010", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Sleep, "00 0000 0110 0011", ONE, POWER),
    InstructionTemplate::new(Mnemonic::Clrwdt, "00 0000 0110 0100", ONE, POWER),
    InstructionTemplate::new(Mnemonic::Tris, "00 0000 0110 0fff", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Movwf, "00 0000 1fff ffff", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Clrw, "00 0001 0000 00xx", ONE, Z),
    InstructionTemplate::new(Mnemonic::Clrf, "00 0001 1fff ffff", ONE, Z),
    InstructionTemplate::new(Mnemonic::Subwf, "00 0010 dfff ffff", ONE, ARITH),
    InstructionTemplate::new(Mnemonic::Decf, "00 0011 dfff ffff", ONE, Z),
    InstructionTemplate::new(Mnemonic::Iorwf, "00 0100 dfff ffff", ONE, Z),
    InstructionTemplate::new(Mnemonic::Andwf, "00 0101 dfff ffff", ONE, Z),
    InstructionTemplate::new(Mnemonic::Xorwf, "00 0110 dfff ffff", ONE, Z),
    InstructionTemplate::new(Mnemonic::Addwf, "00 0111 dfff ffff", ONE, ARITH),
    InstructionTemplate::new(Mnemonic::Movf, "00 1000 dfff ffff", ONE, Z),
    InstructionTemplate::new(Mnemonic::Comf, "00 1001 dfff ffff", ONE, Z),
    InstructionTemplate::new(Mnemonic::Incf, "00 1010 dfff ffff", ONE, Z),
    InstructionTemplate::new(Mnemonic::Decfsz, "00 1011 dfff ffff", SKIP, NONE),
    InstructionTemplate::new(Mnemonic::Rrf, "00 1100 dfff ffff", ONE, C),
    InstructionTemplate::new(Mnemonic::Rlf, "00 1101 dfff ffff", ONE, C),
    InstructionTemplate::new(Mnemonic::Swapf, "00 1110 dfff ffff", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Incfsz, "00 1111 dfff ffff", SKIP, NONE),
    InstructionTemplate::new(Mnemonic::Bcf, "01 00bb bfff ffff", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Bsf, "01 01bb bfff ffff", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Btfsc, "01 10bb bfff ffff", SKIP, NONE),
    InstructionTemplate::new(Mnemonic::Btfss, "01 11bb bfff ffff", SKIP, NONE),
    InstructionTemplate::new(Mnemonic::Call, "10 0kkk kkkk kkkk", TWO, NONE),
    InstructionTemplate::new(Mnemonic::Goto, "10 1kkk kkkk kkkk", TWO, NONE),
    InstructionTemplate::new(Mnemonic::Movlw, "11 0000 kkkk kkkk", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Addfsr, "11 0001 0nkk kkkk", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Movlp, "11 0001 1kkk kkkk", ONE, NONE),
    InstructionTemplate::new(Mnemonic::Bra, "11 001k kkkk kkkk", TWO, NONE),
    InstructionTemplate::new(Mnemonic::Retlw, "11 0100 kkkk kkkk", TWO, NONE),
    InstructionTemplate::new(Mnemonic::Lslf, "11 0101 dfff ffff", ONE, CZ),
    InstructionTemplate::new(Mnemonic::Lsrf, "11 0110 dfff ffff", ONE, CZ),
    InstructionTemplate::new(Mnemonic::Asrf, "11 0111 dfff ffff", ONE, CZ),
    InstructionTemplate::new(Mnemonic::Iorlw, "11 1000 kkkk kkkk", ONE, Z),
    InstructionTemplate::new(Mnemonic::Andlw, "11 1001 kkkk kkkk", ONE, Z),
    InstructionTemplate::new(Mnemonic::Xorlw, "11 1010 kkkk kkkk", ONE, Z),
    InstructionTemplate::new(Mnemonic::Subwfb, "11 1011 dfff ffff", ONE, ARITH),
    InstructionTemplate::new(Mnemonic::Sublw, "11 1100 kkkk kkkk", ONE, ARITH),
    InstructionTemplate::new(Mnemonic::Addwfc, "11 1101 dfff ffff", ONE, ARITH),
    InstructionTemplate::new(Mnemonic::Addlw, "11 1110 kkkk kkkk", ONE, ARITH),
    InstructionTemplate::new(Mnemonic::Moviwk, "11 1111 0nkk kkkk", ONE, Z),
    InstructionTemplate::new(Mnemonic::Movwik, "11 1111 1nkk kkkk", ONE, NONE),
];

/// An ordered set of instruction templates with unique mnemonics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    templates: Vec<InstructionTemplate>,
}

impl Catalog {
    /// Catalog of the enhanced midrange instruction set.
    #[must_use]
    pub fn enhanced_midrange() -> Self {
        Self {
            templates: ENHANCED_MIDRANGE.to_vec(),
        }
    }

    /// Builds a catalog from caller-supplied templates.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::DuplicateMnemonic`] when two templates share a
    /// mnemonic, compared case-insensitively.
    pub fn from_templates(templates: Vec<InstructionTemplate>) -> Result<Self, Fault> {
        for (index, template) in templates.iter().enumerate() {
            let name = template.mnemonic().as_str();
            if templates[..index]
                .iter()
                .any(|earlier| earlier.mnemonic().as_str().eq_ignore_ascii_case(name))
            {
                return Err(Fault::DuplicateMnemonic(name));
            }
        }
        Ok(Self { templates })
    }

    /// Templates in declaration order.
    #[must_use]
    pub fn templates(&self) -> &[InstructionTemplate] {
        &self.templates
    }

    /// Template at `index` in declaration order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&InstructionTemplate> {
        self.templates.get(index)
    }

    /// Looks a template up by mnemonic text, ignoring case.
    #[must_use]
    pub fn lookup(&self, mnemonic: &str) -> Option<&InstructionTemplate> {
        self.templates
            .iter()
            .find(|template| template.mnemonic().as_str().eq_ignore_ascii_case(mnemonic))
    }

    /// Looks a template up by mnemonic.
    #[must_use]
    pub fn template(&self, mnemonic: Mnemonic) -> Option<&InstructionTemplate> {
        self.templates
            .iter()
            .find(|template| template.mnemonic() == mnemonic)
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalog has no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::enhanced_midrange()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{
        Catalog, Field, FieldSpan, InstructionTemplate, Mnemonic, StatusFlags, ENHANCED_MIDRANGE,
    };
    use crate::fault::Fault;
    use crate::timing::CycleCost;

    #[test]
    fn mnemonics_are_unique_ignoring_case() {
        let names: HashSet<_> = ENHANCED_MIDRANGE
            .iter()
            .map(|template| template.mnemonic().as_str().to_ascii_lowercase())
            .collect();
        assert_eq!(names.len(), ENHANCED_MIDRANGE.len());
    }

    #[test]
    fn byte_oriented_template_offsets() {
        let addwf = Catalog::enhanced_midrange()
            .template(Mnemonic::Addwf)
            .copied()
            .expect("ADDWF is catalogued");
        assert_eq!(addwf.match_string(), "000111");
        assert_eq!(addwf.span(Field::D), FieldSpan { start: 6, end: 7 });
        assert_eq!(addwf.span(Field::F), FieldSpan { start: 7, end: 14 });
        assert_eq!(addwf.span(Field::K), FieldSpan::ABSENT);
        assert_eq!(addwf.base_word(), 0x0700);
    }

    #[test]
    fn indexed_indirect_template_puts_n_before_k() {
        let moviwk = Catalog::enhanced_midrange()
            .lookup("moviwk")
            .copied()
            .expect("MOVIWK is catalogued");
        assert_eq!(moviwk.match_string(), "1111110");
        assert_eq!(moviwk.span(Field::N).width(), 1);
        assert_eq!(moviwk.span(Field::K), FieldSpan { start: 8, end: 14 });
    }

    #[test]
    fn dont_care_bits_are_not_fields() {
        let clrw = InstructionTemplate::new(
            Mnemonic::Clrw,
            "00 0001 0000 00xx",
            CycleCost::Fixed(1),
            StatusFlags::Z,
        );
        assert_eq!(clrw.opcode_bits(), 12);
        assert!(Field::ALL.iter().all(|field| !clrw.span(*field).is_present()));
        assert!(clrw.matches(0x0103));
        assert!(!clrw.matches(0x0180));
    }

    #[test]
    fn field_widths_match_the_architecture() {
        let catalog = Catalog::enhanced_midrange();
        let width = |mnemonic, field| {
            catalog
                .template(mnemonic)
                .map(|template| template.span(field).width())
        };
        assert_eq!(width(Mnemonic::Goto, Field::K), Some(11));
        assert_eq!(width(Mnemonic::Bra, Field::K), Some(9));
        assert_eq!(width(Mnemonic::Movlb, Field::K), Some(5));
        assert_eq!(width(Mnemonic::Movlp, Field::K), Some(7));
        assert_eq!(width(Mnemonic::Bsf, Field::B), Some(3));
        assert_eq!(width(Mnemonic::Moviw, Field::M), Some(2));
        assert_eq!(width(Mnemonic::Tris, Field::F), Some(3));
    }

    #[test]
    fn skip_instructions_declare_one_extra_cycle() {
        for template in &ENHANCED_MIDRANGE {
            if let CycleCost::Conditional { base, taken } = template.cycles() {
                assert_eq!(taken, base + 1, "{}", template.mnemonic());
            }
        }
    }

    #[test]
    fn arithmetic_flags_cover_carry_digit_and_zero() {
        let catalog = Catalog::enhanced_midrange();
        let flags = catalog
            .template(Mnemonic::Subwfb)
            .map(InstructionTemplate::flags)
            .expect("SUBWFB is catalogued");
        assert!(flags.contains(StatusFlags::C));
        assert!(flags.contains(StatusFlags::DC));
        assert!(flags.contains(StatusFlags::Z));
        assert!(!flags.contains(StatusFlags::TO));
    }

    #[test]
    fn duplicate_mnemonics_are_rejected() {
        let nop = ENHANCED_MIDRANGE[0];
        assert_eq!(
            Catalog::from_templates(vec![nop, nop]),
            Err(Fault::DuplicateMnemonic("NOP"))
        );
    }
}
