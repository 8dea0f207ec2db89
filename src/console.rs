//! Text output for the command-line front end.
//!
//! Register and memory dumps, the stdout [`Host`], and the JSON snapshot
//! written after a run.

use crate::asm::disasm::disassemble_instruction;
use crate::cpu::execute::Cpu;
use crate::cpu::host::Host;
use crate::cpu::memory::ByteStore;
use crate::cpu::registers::{CpuState, Flags, REGISTER_COUNT, REG_LR, REG_PC, REG_SP};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Format every register as two lines, R0-R7 then R8-R12, SP, LR, PC.
pub fn format_register_dump(state: &CpuState) -> String {
    let mut out = String::new();

    for (i, value) in state.regs.iter().enumerate() {
        let name = match i {
            REG_SP => "SP".to_string(),
            REG_LR => "LR".to_string(),
            REG_PC => "PC".to_string(),
            _ => format!("R{i}"),
        };
        let sep = match i {
            7 | REG_PC => "\n",
            _ => " ",
        };
        let _ = write!(out, "{name}={value:08X}{sep}");
    }

    out
}

/// Format every stored byte, one `0xADDRESS 0xBYTE` line each, by address.
pub fn format_memory_dump(mem: &ByteStore) -> String {
    let mut out = String::new();
    for (addr, byte) in mem.enumerate() {
        let _ = writeln!(out, "0x{addr:08X} 0x{byte:08X}");
    }
    out
}

/// A [`Host`] that prints to a writer.
///
/// Write failures are logged and otherwise ignored so a closed pipe cannot
/// stop the machine.
pub struct ConsoleHost<W: Write> {
    out: W,
    trace: bool,
}

impl<W: Write> ConsoleHost<W> {
    /// Create a host. With `trace` set, every fetch prints the registers
    /// and the instruction about to run.
    pub fn new(out: W, trace: bool) -> Self {
        Self { out, trace }
    }

    /// Access the underlying writer.
    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    /// Consume the host and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()) {
            tracing::warn!("console write failed: {e}");
        }
    }
}

impl<W: Write> Host for ConsoleHost<W> {
    fn trace(&mut self, state: &CpuState, word: u32) {
        if !self.trace {
            return;
        }
        let text = format!(
            "{}Next Instruction={}\n\n",
            format_register_dump(state),
            disassemble_instruction(word, state.pc())
        );
        self.emit(&text);
    }

    fn dump_registers(&mut self, state: &CpuState) {
        let text = format!("{}\n", format_register_dump(state));
        self.emit(&text);
    }

    fn print_register(&mut self, value: u32) {
        self.emit(&format!("{value:08X}\n\n"));
    }
}

/// Machine state after a run, in a form serde can write out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub registers: [u32; REGISTER_COUNT],
    pub flags: Flags,
    pub cycles: u64,
    /// `(address, byte)` pairs, ascending by address.
    pub memory: Vec<(u32, u8)>,
}

impl Snapshot {
    /// Capture the current state of `cpu`.
    pub fn capture(cpu: &Cpu) -> Self {
        Self {
            registers: cpu.state.regs,
            flags: cpu.state.flags,
            cycles: cpu.cycles,
            memory: cpu.mem.enumerate(),
        }
    }
}

/// Write a pretty-printed JSON snapshot of `cpu` to `path`.
pub fn write_snapshot<P: AsRef<Path>>(path: P, cpu: &Cpu) -> Result<(), SnapshotError> {
    let json = serde_json::to_string_pretty(&Snapshot::capture(cpu))?;
    std::fs::write(path.as_ref(), json).map_err(|e| SnapshotError::Io {
        path: path.as_ref().display().to_string(),
        message: e.to_string(),
    })
}

/// Errors that can occur while writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot write {path}: {message}")]
    Io { path: String, message: String },

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
