//! Fetch-decode-execute driver.

use log::debug;

use crate::error::{AccessType, EmuError, EmuResult};
use crate::isa::{execute_rv32i, Decoder};
use crate::vm::{Memory, RegisterFile};

/// Observable execution state of the emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// The fetch-decode-execute loop can make progress.
    Running,
    /// Execution has stopped; the emulator will not step again.
    Halted,
}

/// An RV32I emulator: register file, memory, and a decoder with the base
/// instruction set registered.
///
/// The host seeds memory and the PC (directly or via
/// [`crate::loader::load_elf`]) and then drives [`Emulator::step`] or
/// [`Emulator::run`]. One step is atomic from the host's view; registers
/// and memory are exclusively owned for the duration of a run.
#[derive(Debug)]
pub struct Emulator {
    regs: RegisterFile,
    mem: Memory,
    decoder: Decoder,
    state: State,
}

impl Emulator {
    /// Create an emulator with zeroed registers and a fresh memory of
    /// `memory_size` bytes based at `memory_offset`.
    ///
    /// # Errors
    ///
    /// Returns [`EmuError::DuplicateRegistration`] if the base instruction
    /// set cannot be installed (not possible with a fresh decoder).
    pub fn new(memory_size: u32, memory_offset: u32) -> EmuResult<Self> {
        Self::from_parts(
            RegisterFile::new(),
            Memory::new(memory_size, memory_offset),
        )
    }

    /// Create an emulator around pre-seeded machine state.
    ///
    /// # Errors
    ///
    /// Returns [`EmuError::DuplicateRegistration`] if the base instruction
    /// set cannot be installed (not possible with a fresh decoder).
    pub fn from_parts(regs: RegisterFile, mem: Memory) -> EmuResult<Self> {
        let mut decoder = Decoder::new();
        decoder.register_base_iset()?;

        Ok(Emulator {
            regs,
            mem,
            decoder,
            state: State::Running,
        })
    }

    /// The register file.
    #[must_use]
    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    /// Mutable access to the register file, for host seeding.
    pub fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    /// The backing memory.
    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    /// Mutable access to the backing memory, for host seeding.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    /// Current execution state.
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Fetch, decode, and execute the instruction at the current PC, then
    /// write back the next PC.
    ///
    /// # Errors
    ///
    /// Propagates fetch, decode, and execute errors without retrying; the
    /// PC is left at the failing instruction.
    pub fn step(&mut self) -> EmuResult<()> {
        let pc = self.regs.pc();
        let word = self.mem.fetch(pc)?;
        let inst = self.decoder.decode(word)?;
        let next_pc = execute_rv32i(inst, &mut self.regs, &mut self.mem, pc)?;
        self.regs.set_pc(next_pc);
        Ok(())
    }

    /// Run until the code stream is exhausted or an instruction fails.
    ///
    /// The PC walking off the backing memory is the normal exit: the run
    /// halts successfully. Any decode or execute error also halts, and is
    /// propagated to the caller.
    ///
    /// # Errors
    ///
    /// Returns the first decode or execute error.
    pub fn run(&mut self) -> EmuResult<()> {
        loop {
            match self.step() {
                Ok(()) => {}
                Err(EmuError::OutOfRange {
                    addr,
                    access: AccessType::Execute,
                }) => {
                    debug!("code stream exhausted at pc={addr:#010x}");
                    self.state = State::Halted;
                    return Ok(());
                }
                Err(e) => {
                    debug!("halting at pc={:#010x}: {e}", self.regs.pc());
                    self.state = State::Halted;
                    return Err(e);
                }
            }
        }
    }
}
