//! Disassembler.
//!
//! Converts instruction words back to readable assembly, in the usual ARM
//! syntax: mnemonic, condition suffix, `S` when flags update, then operands.

use crate::asm::program::Program;
use crate::cpu::alu::AluOp;
use crate::cpu::decode::{
    decode, Addressing, Instruction, Offset, Operand2, RegisterOperand, Shift, ShiftBy,
};

/// Disassemble a single instruction located at `addr`.
///
/// The address is needed to resolve branch targets.
pub fn disassemble_instruction(word: u32, addr: u32) -> String {
    format_instruction(&decode(word), addr)
}

/// Disassemble every word of a program.
pub fn disassemble(program: &Program) -> String {
    let mut output = String::new();

    for &(addr, word) in program.words() {
        let line = disassemble_instruction(word, addr);
        output.push_str(&format!("{addr:08X}: {word:08X}  {line}\n"));
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction, addr: u32) -> String {
    match *instr {
        Instruction::DataProcessing { cond, opcode, set_flags, rn, rd, operand } => {
            let s = if set_flags { "S" } else { "" };
            let operand = format_operand2(&operand);
            match AluOp::from_bits(opcode) {
                Some(AluOp::Mov) => format!("MOV{cond}{s} R{rd}, {operand}"),
                Some(AluOp::Cmp) => format!("CMP{cond} R{rn}, {operand}"),
                Some(op) => format!("{}{cond}{s} R{rd}, R{rn}, {operand}", op.mnemonic()),
                None => format!("UNDEFINED{cond} #{opcode:X}"),
            }
        }

        Instruction::Multiply { cond, accumulate, set_flags, rd, rn, rs, rm } => {
            let s = if set_flags { "S" } else { "" };
            if accumulate {
                format!("MLA{cond}{s} R{rd}, R{rm}, R{rs}, R{rn}")
            } else {
                format!("MUL{cond}{s} R{rd}, R{rm}, R{rs}")
            }
        }

        Instruction::Branch { cond, link, offset } => {
            let l = if link { "L" } else { "" };
            let target = addr.wrapping_add(8).wrapping_add_signed(offset);
            format!("B{l}{cond} 0x{target:08X}")
        }

        Instruction::LoadStore { cond, load, byte, up, addressing, rn, rd, offset } => {
            let mnemonic = if load { "LDR" } else { "STR" };
            let b = if byte { "B" } else { "" };
            let sign = if up { "" } else { "-" };
            let offset = match offset {
                Offset::Immediate(0) => None,
                Offset::Immediate(n) => Some(format!("#{sign}{n}")),
                Offset::Register(reg) => Some(format!("{sign}{}", format_register(&reg))),
            };
            let address = match (addressing, offset) {
                (Addressing::PostIndexed, Some(offset)) => format!("[R{rn}], {offset}"),
                (Addressing::PreIndexed, Some(offset)) => format!("[R{rn}, {offset}]!"),
                (Addressing::Offset, Some(offset)) => format!("[R{rn}, {offset}]"),
                (_, None) => format!("[R{rn}]"),
            };
            format!("{mnemonic}{cond}{b} R{rd}, {address}")
        }

        Instruction::SoftwareInterrupt { cond, service } => format!("SVC{cond} {service}"),

        Instruction::Unknown(word) => format!("UNKNOWN 0x{word:08X}"),
    }
}

fn format_operand2(operand: &Operand2) -> String {
    match operand {
        Operand2::Immediate { .. } => {
            format!("#{}", operand.immediate_value().unwrap_or_default())
        }
        Operand2::Register(reg) => format_register(reg),
    }
}

fn format_register(reg: &RegisterOperand) -> String {
    match reg.shift {
        None | Some(Shift { by: ShiftBy::Immediate(0), .. }) => {
            format!("R{}", reg.rm)
        }
        Some(shift) => match shift.by {
            ShiftBy::Immediate(amount) => format!("R{}, {} #{amount}", reg.rm, shift.kind),
            ShiftBy::Register(rs) => format!("R{}, {} R{rs}", reg.rm, shift.kind),
        },
    }
}
