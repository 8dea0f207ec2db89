//! Register file and status flags.
//!
//! The CPU has 16 general 32-bit registers. R13, R14 and R15 are known as
//! the stack pointer, link register and program counter; apart from the
//! fetch step advancing R15, they behave like any other register.

use serde::{Deserialize, Serialize};

/// Number of general registers.
pub const REGISTER_COUNT: usize = 16;

/// Stack pointer index.
pub const REG_SP: usize = 13;
/// Link register index.
pub const REG_LR: usize = 14;
/// Program counter index.
pub const REG_PC: usize = 15;

/// The four condition flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    /// N: result had bit 31 set.
    pub negative: bool,
    /// Z: result was zero.
    pub zero: bool,
    /// C: unsigned carry out, or "no borrow" for subtraction.
    pub carry: bool,
    /// V: signed overflow.
    pub overflow: bool,
}

impl Flags {
    /// Update N and Z from a result.
    #[inline]
    pub fn set_nz(&mut self, result: u32) {
        self.negative = result >> 31 != 0;
        self.zero = result == 0;
    }
}

/// Architectural state: registers plus flags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CpuState {
    /// R0-R15.
    pub regs: [u32; REGISTER_COUNT],
    /// N, Z, C, V.
    pub flags: Flags,
}

impl CpuState {
    /// Create a zeroed state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zeroed state with the program counter set to `entry`.
    pub fn with_entry(entry: u32) -> Self {
        let mut state = Self::new();
        state.regs[REG_PC] = entry;
        state
    }

    /// Read a register. Only the low four bits of `index` are used.
    #[inline]
    pub fn reg(&self, index: u32) -> u32 {
        self.regs[(index & 0xF) as usize]
    }

    /// Write a register. Only the low four bits of `index` are used.
    #[inline]
    pub fn set_reg(&mut self, index: u32, value: u32) {
        self.regs[(index & 0xF) as usize] = value;
    }

    /// Current program counter.
    #[inline]
    pub fn pc(&self) -> u32 {
        self.regs[REG_PC]
    }

    /// Set the program counter.
    #[inline]
    pub fn set_pc(&mut self, value: u32) {
        self.regs[REG_PC] = value;
    }

    /// Move the program counter past the instruction just fetched.
    /// Returns the address of that instruction.
    pub fn advance_pc(&mut self) -> u32 {
        let old = self.regs[REG_PC];
        self.regs[REG_PC] = old.wrapping_add(4);
        old
    }

    /// Reset everything to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
