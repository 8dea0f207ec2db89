//! Callbacks from the CPU to whatever is driving it.
//!
//! The execution loop never prints anything itself. Trace output and the
//! diagnostic supervisor calls (services 1 and 2) go through a [`Host`].

use crate::cpu::registers::CpuState;

/// Receiver for trace events and diagnostic supervisor calls.
pub trait Host {
    /// Called after each fetch, before the program counter advances.
    fn trace(&mut self, _state: &CpuState, _word: u32) {}

    /// `SVC 1`: show every register.
    fn dump_registers(&mut self, state: &CpuState);

    /// `SVC 2`: show the value of R0.
    fn print_register(&mut self, value: u32);
}

/// A host that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {
    fn dump_registers(&mut self, _state: &CpuState) {}

    fn print_register(&mut self, _value: u32) {}
}
