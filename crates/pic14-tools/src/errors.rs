use std::io;
use std::path::PathBuf;

use pic14_core::Fault;
use thiserror::Error;

/// Failure while reading a register-name definition file.
#[derive(Debug, Error)]
pub enum IncludeError {
    /// An `EQU` line whose value could not be parsed.
    #[error("line {line}: {message}")]
    Syntax {
        /// 1-based source line.
        line: usize,
        /// What was wrong with it.
        message: String,
    },
    /// The file could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure while reading or writing an Intel HEX image.
#[derive(Debug, Error)]
pub enum HexError {
    /// A record failed to parse or its checksum did not match.
    #[error("invalid HEX record: {0}")]
    Read(#[from] ihex::ReaderError),
    /// The record stream could not be serialized.
    #[error("cannot write HEX records: {0}")]
    Write(#[from] ihex::WriterError),
    /// A data record started on an odd byte or carried half a word.
    #[error("data record at byte {address:#07x} is not word aligned")]
    Misaligned {
        /// Absolute byte address of the record.
        address: u32,
    },
    /// The image does not fit into program memory.
    #[error(transparent)]
    Core(#[from] Fault),
    /// The file could not be read or written.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What went wrong on one assembler source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmErrorKind {
    /// Neither an instruction nor a directive.
    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),
    /// A symbol used in an operand was never defined.
    #[error("undefined symbol `{0}`")]
    UnknownSymbol(String),
    /// A label or constant was defined twice.
    #[error("symbol `{0}` is already defined")]
    DuplicateSymbol(String),
    /// A numeric literal could not be parsed.
    #[error("malformed number `{0}`")]
    BadNumber(String),
    /// Operand text that does not parse.
    #[error("malformed operand `{0}`")]
    BadOperand(String),
    /// An operand has the wrong form for its position.
    #[error("operand {position} of {mnemonic} has the wrong form")]
    OperandShape {
        /// Instruction name.
        mnemonic: String,
        /// 1-based operand position.
        position: usize,
    },
    /// Too many or too few operands.
    #[error("{mnemonic} takes {expected} operand(s), found {found}")]
    OperandCount {
        /// Instruction or directive name.
        mnemonic: String,
        /// Operands the form accepts.
        expected: usize,
        /// Operands on the line.
        found: usize,
    },
    /// A relative branch target lies outside the signed 9-bit range.
    #[error("branch target {target:#06x} is {offset} words away")]
    BranchOutOfRange {
        /// Absolute target address.
        target: i64,
        /// Offset from the following instruction.
        offset: i64,
    },
    /// An expression value does not fit where it is used.
    #[error("value {0} is out of range")]
    ValueOutOfRange(i64),
    /// `EQU` without a name to define.
    #[error("EQU needs a name")]
    MissingName,
    /// Two statements emit a word at the same address.
    #[error("address {0:#06x} is already occupied")]
    Overlap(u32),
    /// The encoder rejected the instruction.
    #[error(transparent)]
    Encode(#[from] Fault),
}

/// Assembler failure tied to a source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct AsmError {
    /// 1-based source line.
    pub line: usize,
    /// Failure detail.
    pub kind: AsmErrorKind,
}

impl AsmError {
    pub(crate) const fn new(line: usize, kind: AsmErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Everything the `pic14` driver can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad command line.
    #[error("{0}")]
    Usage(String),
    /// A named file could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Register-name file failure.
    #[error(transparent)]
    Include(#[from] IncludeError),
    /// HEX image failure.
    #[error(transparent)]
    Hex(#[from] HexError),
    /// Assembly failure.
    #[error(transparent)]
    Asm(#[from] AsmError),
    /// Core fault while loading or running.
    #[error(transparent)]
    Fault(#[from] Fault),
}

impl CliError {
    /// Process exit code for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Io { .. } => 3,
            Self::Include(_) | Self::Hex(_) | Self::Asm(_) => 4,
            Self::Fault(_) => 5,
        }
    }
}
