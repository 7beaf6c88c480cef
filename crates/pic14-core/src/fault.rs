use thiserror::Error;

/// Fault classes used by drivers to decide whether to halt, reset or continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// A program word did not resolve to exactly one instruction template.
    Decode,
    /// An instruction could not be assembled into a word.
    Encode,
    /// A data-memory address or register name could not be resolved.
    Address,
    /// A program image did not fit into program memory.
    Load,
    /// A catalog was built from inconsistent templates.
    Catalog,
    /// A core configuration is outside its supported range.
    Config,
}

/// Every error the simulator core can report.
///
/// Faults are local to the operation that raised them: a failed decode,
/// load or memory access leaves all other core state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum Fault {
    /// No instruction template matches the word.
    #[error("word {word:#06x} is a reserved or illegal instruction")]
    IllegalInstruction {
        /// Offending program word.
        word: u16,
    },
    /// More than one template matches the word with the same prefix length.
    #[error("word {word:#06x} matches more than one instruction template")]
    AmbiguousInstruction {
        /// Offending program word.
        word: u16,
    },
    /// Encode was asked for a mnemonic the catalog does not carry.
    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),
    /// Encode was called without a field the template requires.
    #[error("{mnemonic} requires field `{field}`")]
    MissingField {
        /// Mnemonic being encoded.
        mnemonic: &'static str,
        /// Template letter of the missing field.
        field: char,
    },
    /// Address lies outside the traditional and linear data windows.
    #[error("data address {0:#06x} is outside the traditional and linear windows")]
    AddressOutOfRange(u32),
    /// Register name is not present in the supplied name map.
    #[error("register name `{0}` is not defined")]
    UnknownRegister(String),
    /// Program load would run past the end of program memory.
    #[error("{len} words at {base:#06x} do not fit in program memory")]
    ProgramOutOfRange {
        /// First word address of the load.
        base: u16,
        /// Number of words requested.
        len: usize,
    },
    /// A catalog repeats a mnemonic.
    #[error("mnemonic `{0}` appears more than once in the catalog")]
    DuplicateMnemonic(&'static str),
    /// Program memory size outside `1..=0x8000` words.
    #[error("program memory of {program_words} words is outside 1..=0x8000")]
    InvalidProgramSize {
        /// Requested size in words.
        program_words: usize,
    },
}

impl Fault {
    /// Returns the coarse class for this fault.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::IllegalInstruction { .. } | Self::AmbiguousInstruction { .. } => {
                FaultClass::Decode
            }
            Self::UnknownMnemonic(_) | Self::MissingField { .. } => FaultClass::Encode,
            Self::AddressOutOfRange(_) | Self::UnknownRegister(_) => FaultClass::Address,
            Self::ProgramOutOfRange { .. } => FaultClass::Load,
            Self::DuplicateMnemonic(_) => FaultClass::Catalog,
            Self::InvalidProgramSize { .. } => FaultClass::Config,
        }
    }
}
