//! Execution engine.
//!
//! Implements the fetch-decode-execute cycle and the five instruction
//! family handlers. Every handler checks the condition field first and
//! leaves the machine untouched when it fails.

use crate::asm::program::Program;
use crate::cpu::alu::{self, AluOp};
use crate::cpu::condition::{condition_passed, Condition};
use crate::cpu::decode::{
    self, Addressing, Instruction, Offset, Operand2, RegisterOperand, ShiftBy, ShiftKind,
};
use crate::cpu::host::Host;
use crate::cpu::memory::{ByteStore, FillPolicy, MemoryError};
use crate::cpu::registers::{CpuState, REG_LR, REG_PC};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline lookahead added to a PC-relative branch target.
pub const BRANCH_PIPELINE_OFFSET: u32 = 4;

/// Pipeline lookahead added when the PC is used as a transfer offset.
pub const PC_OPERAND_OFFSET: u32 = 8;

/// Supervisor call number that halts the CPU.
pub const SVC_HALT: u32 = 0;
/// Supervisor call number that dumps every register.
pub const SVC_DUMP_REGISTERS: u32 = 1;
/// Supervisor call number that prints R0.
pub const SVC_PRINT_R0: u32 = 2;

/// Emulator settings chosen before a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// What reads from never-written memory return.
    pub fill: FillPolicy,
}

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed `SVC 0`).
    Halted,
    /// CPU hit a fatal memory error.
    Error,
}

/// The emulated CPU together with the memory it owns.
#[derive(Clone)]
pub struct Cpu {
    /// Registers and flags.
    pub state: CpuState,
    /// Main memory.
    pub mem: ByteStore,
    /// Current execution state.
    pub run_state: RunState,
    /// Instructions fetched so far.
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a CPU with zeroed registers, empty zero-filled memory.
    pub fn new() -> Self {
        Self::with_config(EmulatorConfig::default())
    }

    /// Create a CPU with the given configuration.
    pub fn with_config(config: EmulatorConfig) -> Self {
        Self {
            state: CpuState::new(),
            mem: ByteStore::with_fill(config.fill),
            run_state: RunState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Store a program's words and point the PC at its first address.
    pub fn load_program(&mut self, program: &Program) -> Result<(), CpuError> {
        for &(addr, word) in program.words() {
            self.mem.store_word(addr, word)?;
        }
        if let Some(entry) = program.entry() {
            self.state.set_pc(entry);
        }
        tracing::debug!("loaded {} words, entry {:#010X}", program.len(), self.state.pc());
        Ok(())
    }

    /// Execute a single instruction.
    ///
    /// Returns the decoded instruction, whether or not its condition held.
    pub fn step<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<Instruction, CpuError> {
        if self.run_state != RunState::Running {
            return Err(CpuError::NotRunning(self.run_state));
        }

        // Fetch
        let word = self.mem.load_word(self.state.pc());
        host.trace(&self.state, word);
        let addr = self.state.advance_pc();

        // Decode
        let instr = decode::decode(word);
        tracing::trace!("{addr:#010X}: {word:#010X} {instr:?}");

        // Execute
        let halted = match self.execute(instr, host) {
            Ok(halted) => halted,
            Err(e) => {
                self.run_state = RunState::Error;
                return Err(e);
            }
        };

        self.cycles += 1;
        self.last_instr = Some(instr);

        if halted {
            tracing::debug!(cycles = self.cycles, "halted");
            self.run_state = RunState::Halted;
        }

        Ok(instr)
    }

    /// Run until halt. There is no cycle limit.
    ///
    /// Returns the number of instructions executed.
    pub fn run<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.run_state == RunState::Running {
            self.step(host)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        max_cycles: u64,
    ) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.run_state == RunState::Running && self.cycles < limit {
            self.step(host)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Dispatch a decoded instruction. Returns `true` when the CPU should halt.
    fn execute<H: Host + ?Sized>(&mut self, instr: Instruction, host: &mut H) -> Result<bool, CpuError> {
        match instr {
            Instruction::DataProcessing { cond, opcode, set_flags, rn, rd, operand } => {
                self.data_processing(cond, opcode, set_flags, rn, rd, operand);
            }

            Instruction::Multiply { cond, accumulate, set_flags, rd, rn, rs, rm } => {
                self.multiply(cond, accumulate, set_flags, rd, rn, rs, rm);
            }

            Instruction::Branch { cond, link, offset } => {
                self.branch(cond, link, offset);
            }

            Instruction::LoadStore { cond, load, byte, up, addressing, rn, rd, offset } => {
                self.load_store(cond, load, byte, up, addressing, rn, rd, offset)?;
            }

            Instruction::SoftwareInterrupt { cond, service } => {
                return Ok(self.software_interrupt(cond, service, host));
            }

            // Unrecognised encodings are skipped without a trace.
            Instruction::Unknown(_) => {}
        }

        Ok(false)
    }

    fn passed(&self, cond: Condition) -> bool {
        condition_passed(&self.state.flags, cond)
    }

    // ==================== Data processing ====================

    fn data_processing(
        &mut self,
        cond: Condition,
        opcode: u32,
        set_flags: bool,
        rn: u32,
        rd: u32,
        operand: Operand2,
    ) {
        let operand = match operand {
            Operand2::Immediate { imm, rotate } => crate::bits::rotate_right(2 * rotate, imm),
            Operand2::Register(reg) => self.shifted_register(reg, self.state.reg(reg.rm)),
        };

        if !self.passed(cond) {
            return;
        }

        let Some(op) = AluOp::from_bits(opcode) else {
            tracing::warn!("opcode {opcode:X} could not be decoded");
            return;
        };

        let rn_value = self.state.reg(rn);
        if let Some(result) = op.apply(&mut self.state.flags, set_flags, rn_value, operand) {
            self.state.set_reg(rd, result);
        }
    }

    /// Apply a register operand's shift to `value`, the value of `rm`.
    fn shifted_register(&self, reg: RegisterOperand, value: u32) -> u32 {
        let Some(shift) = reg.shift else {
            return value;
        };

        let amount = match shift.by {
            ShiftBy::Immediate(0) => return value,
            ShiftBy::Immediate(amount) => amount,
            ShiftBy::Register(rs) => self.state.reg(rs) & 0xFF,
        };

        if amount >= 32 {
            return 0;
        }

        match shift.kind {
            ShiftKind::Lsl => value << amount,
            ShiftKind::Lsr => value >> amount,
        }
    }

    // ==================== Multiply ====================

    #[allow(clippy::too_many_arguments)]
    fn multiply(
        &mut self,
        cond: Condition,
        accumulate: bool,
        set_flags: bool,
        rd: u32,
        rn: u32,
        rs: u32,
        rm: u32,
    ) {
        if !self.passed(cond) {
            return;
        }

        let (rm, rs, rn) = (self.state.reg(rm), self.state.reg(rs), self.state.reg(rn));
        let flags = &mut self.state.flags;
        let result = if accumulate {
            alu::mla(flags, set_flags, rm, rs, rn)
        } else {
            alu::mul(flags, set_flags, rm, rs)
        };
        self.state.set_reg(rd, result);
    }

    // ==================== Branch ====================

    fn branch(&mut self, cond: Condition, link: bool, offset: i32) {
        if !self.passed(cond) {
            return;
        }

        // PC already points past the branch.
        let pc = self.state.pc();
        if link {
            self.state.set_reg(REG_LR as u32, pc);
        }
        self.state
            .set_pc(pc.wrapping_add(BRANCH_PIPELINE_OFFSET).wrapping_add_signed(offset));
    }

    // ==================== Single data transfer ====================

    #[allow(clippy::too_many_arguments)]
    fn load_store(
        &mut self,
        cond: Condition,
        load: bool,
        byte: bool,
        up: bool,
        addressing: Addressing,
        rn: u32,
        rd: u32,
        offset: Offset,
    ) -> Result<(), CpuError> {
        let offset = match offset {
            Offset::Immediate(offset) => offset,
            Offset::Register(reg) => {
                let value = if reg.rm == REG_PC as u32 {
                    self.state.pc().wrapping_add(PC_OPERAND_OFFSET)
                } else {
                    self.state.reg(reg.rm)
                };
                self.shifted_register(reg, value)
            }
        };

        let base = self.state.reg(rn);
        let indexed = if up {
            base.wrapping_add(offset)
        } else {
            base.wrapping_sub(offset)
        };

        let (address, write_back) = match addressing {
            Addressing::Offset => (indexed, None),
            Addressing::PreIndexed => (indexed, Some(indexed)),
            Addressing::PostIndexed => (base, Some(indexed)),
        };

        if !self.passed(cond) {
            return Ok(());
        }

        if load {
            let value = if byte {
                u32::from(self.mem.load(address))
            } else {
                self.mem.load_word(address)
            };
            if let Some(new_base) = write_back {
                self.state.set_reg(rn, new_base);
            }
            let value = if rd == REG_PC as u32 { value & !0b11 } else { value };
            self.state.set_reg(rd, value);
        } else {
            let value = self.state.reg(rd);
            if byte {
                self.mem.store(address, &[value as u8])?;
            } else {
                self.mem.store_word(address, value)?;
            }
            if let Some(new_base) = write_back {
                self.state.set_reg(rn, new_base);
            }
        }

        Ok(())
    }

    // ==================== Software interrupt ====================

    fn software_interrupt<H: Host + ?Sized>(&mut self, cond: Condition, service: u32, host: &mut H) -> bool {
        if !self.passed(cond) {
            return false;
        }

        match service {
            SVC_HALT => return true,
            SVC_DUMP_REGISTERS => host.dump_registers(&self.state),
            SVC_PRINT_R0 => host.print_register(self.state.reg(0)),
            _ => {}
        }

        false
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.run_state == RunState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("run_state", &self.run_state)
            .field("cycles", &self.cycles)
            .field("state", &self.state)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(RunState),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}
