//! Arithmetic and logic primitives.
//!
//! Each primitive returns the 32-bit result and, when `set_flags` is on,
//! updates the flags. Logical operations and multiplies only touch N and Z;
//! C and V keep whatever value they had.

use crate::cpu::registers::Flags;
use serde::{Deserialize, Serialize};

/// Data-processing opcodes implemented by the ALU (bits 21-24).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    And = 0x0,
    Eor = 0x1,
    Sub = 0x2,
    Add = 0x4,
    Cmp = 0xA,
    Orr = 0xC,
    Mov = 0xD,
    Bic = 0xE,
}

impl AluOp {
    /// Decode a 4-bit opcode. Opcodes without a handler return `None`.
    pub fn from_bits(opcode: u32) -> Option<Self> {
        use AluOp::*;
        match opcode {
            0x0 => Some(And),
            0x1 => Some(Eor),
            0x2 => Some(Sub),
            0x4 => Some(Add),
            0xA => Some(Cmp),
            0xC => Some(Orr),
            0xD => Some(Mov),
            0xE => Some(Bic),
            _ => None,
        }
    }

    /// Upper-case mnemonic.
    pub fn mnemonic(self) -> &'static str {
        use AluOp::*;
        match self {
            And => "AND",
            Eor => "EOR",
            Sub => "SUB",
            Add => "ADD",
            Cmp => "CMP",
            Orr => "ORR",
            Mov => "MOV",
            Bic => "BIC",
        }
    }

    /// Apply the operation. Returns `None` for CMP, which writes no register.
    pub fn apply(self, flags: &mut Flags, set_flags: bool, rn: u32, operand: u32) -> Option<u32> {
        let result = match self {
            AluOp::And => and(flags, set_flags, rn, operand),
            AluOp::Eor => eor(flags, set_flags, rn, operand),
            AluOp::Sub => sub(flags, set_flags, rn, operand),
            AluOp::Add => add(flags, set_flags, rn, operand),
            AluOp::Orr => orr(flags, set_flags, rn, operand),
            AluOp::Mov => mov(flags, set_flags, operand),
            AluOp::Bic => bic(flags, set_flags, rn, operand),
            AluOp::Cmp => {
                cmp(flags, rn, operand);
                return None;
            }
        };
        Some(result)
    }
}

#[inline]
fn logical(flags: &mut Flags, set_flags: bool, result: u32) -> u32 {
    if set_flags {
        flags.set_nz(result);
    }
    result
}

pub fn and(flags: &mut Flags, set_flags: bool, rn: u32, operand: u32) -> u32 {
    logical(flags, set_flags, rn & operand)
}

pub fn eor(flags: &mut Flags, set_flags: bool, rn: u32, operand: u32) -> u32 {
    logical(flags, set_flags, rn ^ operand)
}

pub fn orr(flags: &mut Flags, set_flags: bool, rn: u32, operand: u32) -> u32 {
    logical(flags, set_flags, rn | operand)
}

/// Bit clear: `rn AND NOT operand`.
pub fn bic(flags: &mut Flags, set_flags: bool, rn: u32, operand: u32) -> u32 {
    logical(flags, set_flags, rn & !operand)
}

pub fn mov(flags: &mut Flags, set_flags: bool, operand: u32) -> u32 {
    logical(flags, set_flags, operand)
}

pub fn add(flags: &mut Flags, set_flags: bool, rn: u32, operand: u32) -> u32 {
    let (result, carry) = rn.overflowing_add(operand);
    if set_flags {
        flags.set_nz(result);
        flags.carry = carry;
        flags.overflow = (rn as i32).overflowing_add(operand as i32).1;
    }
    result
}

pub fn sub(flags: &mut Flags, set_flags: bool, rn: u32, operand: u32) -> u32 {
    let (result, borrow) = rn.overflowing_sub(operand);
    if set_flags {
        flags.set_nz(result);
        flags.carry = !borrow;
        flags.overflow = (rn as i32).overflowing_sub(operand as i32).1;
    }
    result
}

/// Compare: SUB's flags without a result.
pub fn cmp(flags: &mut Flags, rn: u32, operand: u32) {
    sub(flags, true, rn, operand);
}

pub fn mul(flags: &mut Flags, set_flags: bool, rm: u32, rs: u32) -> u32 {
    logical(flags, set_flags, rm.wrapping_mul(rs))
}

/// Multiply-accumulate: `rm * rs + rn`.
pub fn mla(flags: &mut Flags, set_flags: bool, rm: u32, rs: u32, rn: u32) -> u32 {
    logical(flags, set_flags, rm.wrapping_mul(rs).wrapping_add(rn))
}
