//! # ARM Emulator
//!
//! An emulator for a subset of the 32-bit ARM instruction set.
//!
//! Memory is a sparse byte store covering the full 32-bit address space,
//! so programs may be scattered anywhere. The CPU has sixteen registers,
//! four condition flags, and executes data processing, multiply, branch,
//! single data transfer and software interrupt instructions.

pub mod asm;
pub mod bits;
pub mod console;
pub mod cpu;

// Re-export commonly used types
pub use asm::{disassemble, load_program, parse_program, Program, ProgramError};
pub use console::{ConsoleHost, Snapshot, SnapshotError};
pub use cpu::{
    ByteStore, Cpu, CpuError, CpuState, EmulatorConfig, FillPolicy, Flags, Host, Instruction,
    NullHost, RunState,
};
