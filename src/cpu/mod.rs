//! CPU emulation.
//!
//! This module implements the complete machine:
//! - 16 general registers and the N, Z, C, V flags
//! - A sparse byte-addressable memory covering the full 32-bit space
//! - Five instruction families: data processing, multiply, branch,
//!   single data transfer and software interrupt

pub mod alu;
pub mod condition;
pub mod decode;
pub mod execute;
pub mod host;
pub mod memory;
pub mod registers;

pub use condition::{condition_passed, Condition};
pub use decode::{classify, decode, Family, Instruction};
pub use execute::{Cpu, CpuError, EmulatorConfig, RunState};
pub use host::{Host, NullHost};
pub use memory::{ByteStore, FillPolicy, MemoryError};
pub use registers::{CpuState, Flags};
