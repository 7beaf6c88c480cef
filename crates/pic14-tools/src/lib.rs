//! Host-side tools around the pic14 simulator core: register-name files,
//! Intel HEX images, a two-pass assembler, disassembly and dump formatting.

/// Two-pass assembler pipeline.
pub mod assembler;
/// Disassembly listings, register dumps and trace lines.
pub mod disasm;
/// Error types for every tool.
pub mod errors;
/// Intel HEX reader and writer.
pub mod hexfile;
/// Sparse program images.
pub mod image;
/// Register-name definition files.
pub mod include;
/// Line syntax shared by the assembler and include parser.
pub mod parser;
/// Symbol table and pass-1 address assignment.
pub mod symbols;

pub use assembler::{assemble, Assembly};
pub use disasm::{disassemble, format_event, format_instruction, format_registers, DisassemblyRow};
pub use errors::{AsmError, AsmErrorKind, CliError, HexError, IncludeError};
pub use hexfile::{load_hex, read_hex, save_hex, write_hex};
pub use image::ProgramImage;
pub use include::{load_include, parse_include, register_names};
pub use symbols::SymbolTable;
