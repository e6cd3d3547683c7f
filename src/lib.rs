// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! A functional emulator for the RV32I base integer instruction set.
//!
//! Given an ELF binary containing 32-bit little-endian RISC-V machine
//! code, the emulator loads the executable section into byte-addressable
//! memory, decodes fixed-width 32-bit instructions, and executes them
//! sequentially against an architectural register file and program counter
//! until the code stream is exhausted.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │      Host (CLI / ELF loader)        │
//! ├─────────────────────────────────────┤
//! │   Emulator (fetch-decode-execute)   │
//! ├──────────────────┬──────────────────┤
//! │  Decoder / ISA   │  Registers / Mem │
//! └──────────────────┴──────────────────┘
//! ```
//!
//! The decoder maps each opcode to one of the six RV32I encoding formats
//! through a registration table and produces a format-tagged
//! [`isa::Instruction`] record with immediates already reassembled and
//! sign-extended. The executor pattern-matches on the record, applies the
//! semantic effect to [`RegisterFile`] and [`Memory`], and yields the next
//! PC.

pub mod bits;
pub mod emulator;
pub mod error;
pub mod isa;
pub mod loader;
pub mod vm;

pub use emulator::{Emulator, State};
pub use error::{AccessType, EmuError, EmuResult};
pub use loader::{load_elf, LoadError};
pub use vm::{Memory, RegisterFile};
