//! Template-driven decoder and encoder for 14-bit program words.
//!
//! The decoder classifies every possible word once, when it is built, so
//! `decode` on the fetch path is a table lookup followed by field
//! extraction.

use crate::catalog::{Catalog, Field, InstructionTemplate, Mnemonic, FIELD_COUNT, WORD_MASK};
use crate::fault::Fault;

/// Operand values keyed by field. Absent fields are `None`, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldValues {
    values: [Option<u16>; FIELD_COUNT],
}

impl FieldValues {
    /// No fields set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: [None; FIELD_COUNT],
        }
    }

    /// Value of `field`, if set.
    #[must_use]
    pub const fn get(&self, field: Field) -> Option<u16> {
        self.values[field.index()]
    }

    /// Returns a copy with `field` set to `value`.
    #[must_use]
    pub const fn with(mut self, field: Field, value: u16) -> Self {
        self.values[field.index()] = Some(value);
        self
    }

    /// Sets the bit index.
    #[must_use]
    pub const fn b(self, value: u16) -> Self {
        self.with(Field::B, value)
    }

    /// Sets the destination select.
    #[must_use]
    pub const fn d(self, value: u16) -> Self {
        self.with(Field::D, value)
    }

    /// Sets the file register.
    #[must_use]
    pub const fn f(self, value: u16) -> Self {
        self.with(Field::F, value)
    }

    /// Sets the indirect pointer index.
    #[must_use]
    pub const fn n(self, value: u16) -> Self {
        self.with(Field::N, value)
    }

    /// Sets the pre/post mode.
    #[must_use]
    pub const fn m(self, value: u16) -> Self {
        self.with(Field::M, value)
    }

    /// Sets the literal.
    #[must_use]
    pub const fn k(self, value: u16) -> Self {
        self.with(Field::K, value)
    }

    /// Sets a signed literal; encoding truncates it to the field width.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn k_signed(self, value: i16) -> Self {
        self.with(Field::K, value as u16)
    }

    /// Set fields in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, u16)> + '_ {
        Field::ALL
            .iter()
            .filter_map(|field| self.get(*field).map(|value| (*field, value)))
    }
}

/// A template bound to concrete operand values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    template: InstructionTemplate,
    fields: FieldValues,
}

impl Instruction {
    fn from_word(template: InstructionTemplate, word: u16) -> Self {
        let mut fields = FieldValues::new();
        for field in Field::ALL {
            let span = template.span(field);
            if span.is_present() {
                fields = fields.with(field, span.extract(word));
            }
        }
        Self { template, fields }
    }

    /// Template this instruction instantiates.
    #[must_use]
    pub const fn template(&self) -> &InstructionTemplate {
        &self.template
    }

    /// Mnemonic used for dispatch.
    #[must_use]
    pub const fn mnemonic(&self) -> Mnemonic {
        self.template.mnemonic()
    }

    /// Operand values.
    #[must_use]
    pub const fn fields(&self) -> &FieldValues {
        &self.fields
    }

    /// Value of `field`, `None` when the template lacks it.
    #[must_use]
    pub const fn field(&self, field: Field) -> Option<u16> {
        self.fields.get(field)
    }

    /// Value of `field`, zero when the template lacks it.
    #[must_use]
    pub const fn value(&self, field: Field) -> u16 {
        match self.fields.get(field) {
            Some(value) => value,
            None => 0,
        }
    }

    /// Re-encodes the instruction into its program word.
    #[must_use]
    pub fn encode(&self) -> u16 {
        self.fields
            .iter()
            .fold(self.template.base_word(), |word, (field, value)| {
                word | self.template.span(field).place(value)
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Template(u16),
    Illegal,
    Ambiguous,
}

/// Decoder and encoder over one [`Catalog`].
///
/// Build it once and hand it to the core; it carries no global state.
#[derive(Debug, Clone)]
pub struct Decoder {
    catalog: Catalog,
    slots: Box<[Slot]>,
}

impl Decoder {
    /// Builds a decoder, classifying all 16384 words against `catalog`.
    ///
    /// A word matched by several templates belongs to the one with the
    /// strictly longest opcode; a tie marks the word ambiguous.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        let slots = (0..=WORD_MASK)
            .map(|word| {
                let mut best: Option<(usize, u8)> = None;
                let mut tied = false;
                for (index, template) in catalog.templates().iter().enumerate() {
                    if !template.matches(word) {
                        continue;
                    }
                    match best {
                        Some((_, bits)) if bits > template.opcode_bits() => {}
                        Some((_, bits)) if bits == template.opcode_bits() => tied = true,
                        _ => {
                            best = Some((index, template.opcode_bits()));
                            tied = false;
                        }
                    }
                }
                match best {
                    None => Slot::Illegal,
                    Some(_) if tied => Slot::Ambiguous,
                    Some((index, _)) => {
                        u16::try_from(index).map_or(Slot::Illegal, Slot::Template)
                    }
                }
            })
            .collect();
        Self { catalog, slots }
    }

    /// Decoder for the enhanced midrange instruction set.
    #[must_use]
    pub fn enhanced_midrange() -> Self {
        Self::new(Catalog::enhanced_midrange())
    }

    /// Catalog the decoder was built from.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Decodes a program word. Bits above bit 13 are ignored.
    ///
    /// # Errors
    ///
    /// [`Fault::IllegalInstruction`] when no template matches and
    /// [`Fault::AmbiguousInstruction`] when the match is not unique.
    pub fn decode(&self, word: u16) -> Result<Instruction, Fault> {
        let word = word & WORD_MASK;
        match self.slots[usize::from(word)] {
            Slot::Template(index) => self
                .catalog
                .get(usize::from(index))
                .map(|template| Instruction::from_word(*template, word))
                .ok_or(Fault::IllegalInstruction { word }),
            Slot::Illegal => Err(Fault::IllegalInstruction { word }),
            Slot::Ambiguous => Err(Fault::AmbiguousInstruction { word }),
        }
    }

    /// Builds the decoded form of `mnemonic` with `fields`, as an assembler would.
    ///
    /// Supplied values are truncated to their field width; fields the
    /// template does not carry are dropped.
    ///
    /// # Errors
    ///
    /// [`Fault::UnknownMnemonic`] for a mnemonic outside the catalog and
    /// [`Fault::MissingField`] when a template field was not supplied.
    pub fn instruction(&self, mnemonic: &str, fields: &FieldValues) -> Result<Instruction, Fault> {
        let template = *self
            .catalog
            .lookup(mnemonic)
            .ok_or_else(|| Fault::UnknownMnemonic(mnemonic.to_owned()))?;
        let mut bound = FieldValues::new();
        for field in Field::ALL {
            let span = template.span(field);
            match fields.get(field) {
                Some(value) if span.is_present() => {
                    bound = bound.with(field, span.extract(span.place(value)));
                }
                Some(_) => {}
                None if span.is_present() => {
                    return Err(Fault::MissingField {
                        mnemonic: template.mnemonic().as_str(),
                        field: field.letter(),
                    });
                }
                None => {}
            }
        }
        Ok(Instruction {
            template,
            fields: bound,
        })
    }

    /// Encodes `mnemonic` (case-insensitive) with `fields` into a program word.
    ///
    /// # Errors
    ///
    /// See [`Decoder::instruction`].
    pub fn encode(&self, mnemonic: &str, fields: &FieldValues) -> Result<u16, Fault> {
        self.instruction(mnemonic, fields)
            .map(|instruction| instruction.encode())
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::enhanced_midrange()
    }
}
