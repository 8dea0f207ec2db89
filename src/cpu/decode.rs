//! Instruction decoder.
//!
//! Bits 26-27 pick the instruction family:
//!
//! ```text
//! 00  data processing (multiply when bits 4-7 are 1001)
//! 01  single data transfer (LDR/STR)
//! 10  branch, only with bit 25 set
//! 11  software interrupt, only with bits 24-25 set
//! ```
//!
//! Anything else is [`Family::Unknown`] and is skipped by the CPU.

use crate::bits::{get_bit, get_bits, get_cond, rotate_right, sign_extend};
use crate::cpu::condition::Condition;
use serde::{Deserialize, Serialize};

/// Coarse instruction category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Family {
    DataProcessing,
    Multiply,
    Branch,
    LoadStore,
    SoftwareInterrupt,
    Unknown,
}

/// Classify a word into its family.
pub fn classify(word: u32) -> Family {
    match get_bits(word, 26, 2) {
        0b00 if get_bits(word, 4, 4) == 0b1001 => Family::Multiply,
        0b00 => Family::DataProcessing,
        0b01 => Family::LoadStore,
        0b10 if get_bit(word, 25) => Family::Branch,
        0b11 if get_bits(word, 24, 2) == 0b11 => Family::SoftwareInterrupt,
        _ => Family::Unknown,
    }
}

/// Barrel shifter operation applied to a register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftKind {
    Lsl,
    Lsr,
}

impl std::fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShiftKind::Lsl => f.write_str("LSL"),
            ShiftKind::Lsr => f.write_str("LSR"),
        }
    }
}

/// Where the shift amount comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftBy {
    /// 5-bit amount in bits 7-11.
    Immediate(u32),
    /// Low byte of the register in bits 8-11.
    Register(u32),
}

/// A shift applied to `rm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub kind: ShiftKind,
    pub by: ShiftBy,
}

/// A register operand, optionally shifted.
///
/// Arithmetic-right and rotate shift encodings decode with `shift: None`:
/// the register value passes through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterOperand {
    pub rm: u32,
    pub shift: Option<Shift>,
}

impl RegisterOperand {
    /// Decode bits 0-11 of a word.
    fn decode(word: u32) -> Self {
        let rm = get_bits(word, 0, 4);
        let shift = match get_bits(word, 4, 3) {
            0b000 => Some((ShiftKind::Lsl, ShiftBy::Immediate(get_bits(word, 7, 5)))),
            0b001 => Some((ShiftKind::Lsl, ShiftBy::Register(get_bits(word, 8, 4)))),
            0b010 => Some((ShiftKind::Lsr, ShiftBy::Immediate(get_bits(word, 7, 5)))),
            0b011 => Some((ShiftKind::Lsr, ShiftBy::Register(get_bits(word, 8, 4)))),
            _ => None,
        }
        .map(|(kind, by)| Shift { kind, by });

        Self { rm, shift }
    }
}

/// Second operand of a data-processing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand2 {
    /// 8-bit immediate rotated right by twice `rotate`.
    Immediate { imm: u32, rotate: u32 },
    Register(RegisterOperand),
}

impl Operand2 {
    /// Decode bits 0-11, with bit 25 selecting the immediate form.
    fn decode(word: u32) -> Self {
        if get_bit(word, 25) {
            Operand2::Immediate {
                imm: get_bits(word, 0, 8),
                rotate: get_bits(word, 8, 4),
            }
        } else {
            Operand2::Register(RegisterOperand::decode(word))
        }
    }

    /// Value of an immediate operand, or `None` for a register operand.
    pub fn immediate_value(&self) -> Option<u32> {
        match *self {
            Operand2::Immediate { imm, rotate } => Some(rotate_right(2 * rotate, imm)),
            Operand2::Register(_) => None,
        }
    }
}

/// Offset of a single data transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Offset {
    /// 12-bit unsigned immediate.
    Immediate(u32),
    /// Register, optionally shifted.
    Register(RegisterOperand),
}

/// Addressing mode of a single data transfer, from the P and W bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Addressing {
    /// `[Rn, offset]`: base register unchanged.
    Offset,
    /// `[Rn, offset]!`: computed address written back to the base.
    PreIndexed,
    /// `[Rn], offset`: access at the base, then base += offset.
    PostIndexed,
}

impl Addressing {
    fn from_bits(pre_index: bool, write_back: bool) -> Self {
        match (pre_index, write_back) {
            (true, false) => Addressing::Offset,
            (true, true) => Addressing::PreIndexed,
            (false, _) => Addressing::PostIndexed,
        }
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    DataProcessing {
        cond: Condition,
        /// Raw 4-bit opcode; not every value has a handler.
        opcode: u32,
        set_flags: bool,
        rn: u32,
        rd: u32,
        operand: Operand2,
    },
    Multiply {
        cond: Condition,
        accumulate: bool,
        set_flags: bool,
        rd: u32,
        rn: u32,
        rs: u32,
        rm: u32,
    },
    Branch {
        cond: Condition,
        link: bool,
        /// Sign-extended, word-scaled displacement in bytes.
        offset: i32,
    },
    LoadStore {
        cond: Condition,
        load: bool,
        byte: bool,
        up: bool,
        addressing: Addressing,
        rn: u32,
        rd: u32,
        offset: Offset,
    },
    SoftwareInterrupt {
        cond: Condition,
        service: u32,
    },
    Unknown(u32),
}

impl Instruction {
    /// The condition field, or `None` for unknown words.
    pub fn cond(&self) -> Option<Condition> {
        match *self {
            Instruction::DataProcessing { cond, .. }
            | Instruction::Multiply { cond, .. }
            | Instruction::Branch { cond, .. }
            | Instruction::LoadStore { cond, .. }
            | Instruction::SoftwareInterrupt { cond, .. } => Some(cond),
            Instruction::Unknown(_) => None,
        }
    }

    /// The family this instruction belongs to.
    pub fn family(&self) -> Family {
        match self {
            Instruction::DataProcessing { .. } => Family::DataProcessing,
            Instruction::Multiply { .. } => Family::Multiply,
            Instruction::Branch { .. } => Family::Branch,
            Instruction::LoadStore { .. } => Family::LoadStore,
            Instruction::SoftwareInterrupt { .. } => Family::SoftwareInterrupt,
            Instruction::Unknown(_) => Family::Unknown,
        }
    }
}

/// Decode a 32-bit word.
pub fn decode(word: u32) -> Instruction {
    let cond = Condition::from(get_cond(word));

    match classify(word) {
        Family::DataProcessing => Instruction::DataProcessing {
            cond,
            opcode: get_bits(word, 21, 4),
            set_flags: get_bit(word, 20),
            rn: get_bits(word, 16, 4),
            rd: get_bits(word, 12, 4),
            operand: Operand2::decode(word),
        },
        Family::Multiply => Instruction::Multiply {
            cond,
            accumulate: get_bit(word, 21),
            set_flags: get_bit(word, 20),
            rd: get_bits(word, 16, 4),
            rn: get_bits(word, 12, 4),
            rs: get_bits(word, 8, 4),
            rm: get_bits(word, 0, 4),
        },
        Family::Branch => Instruction::Branch {
            cond,
            link: get_bit(word, 24),
            offset: sign_extend(get_bits(word, 0, 24), 24) << 2,
        },
        Family::LoadStore => Instruction::LoadStore {
            cond,
            load: get_bit(word, 20),
            byte: get_bit(word, 22),
            up: get_bit(word, 23),
            addressing: Addressing::from_bits(get_bit(word, 24), get_bit(word, 21)),
            rn: get_bits(word, 16, 4),
            rd: get_bits(word, 12, 4),
            offset: if get_bit(word, 25) {
                Offset::Register(RegisterOperand::decode(word))
            } else {
                Offset::Immediate(get_bits(word, 0, 12))
            },
        },
        Family::SoftwareInterrupt => Instruction::SoftwareInterrupt {
            cond,
            service: get_bits(word, 0, 24),
        },
        Family::Unknown => Instruction::Unknown(word),
    }
}
