//! Program loading and disassembly.
//!
//! This module provides:
//! - A loader for the textual `<address> <word>` program format
//! - A disassembler (instruction words → readable text)

pub mod disasm;
pub mod program;

pub use disasm::{disassemble, disassemble_instruction};
pub use program::{load_program, parse_program, parse_program_bytes, Program, ProgramError};
