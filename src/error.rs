//! Error types for the RV32I emulator.

use std::fmt;

/// Memory access type for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    /// Read access (load instructions).
    Read,
    /// Write access (store instructions).
    Write,
    /// Execute access (instruction fetch).
    Execute,
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessType::Read => write!(f, "read"),
            AccessType::Write => write!(f, "write"),
            AccessType::Execute => write!(f, "execute"),
        }
    }
}

/// Errors raised by the decode-execute core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmuError {
    /// Decoder saw an opcode with no registered format.
    UnknownOpcode(u8),
    /// Known opcode, but funct3/funct7/static immediate bits match no
    /// defined instruction.
    InvalidEncoding {
        /// The opcode group the word claimed to belong to.
        opcode: u8,
        /// The funct3 discriminator that failed to match.
        funct3: u8,
        /// funct7 for R-format words; the static `imm[11:5]` bits for
        /// I-format shifts; 0 where the format has neither.
        funct7: u8,
    },
    /// A load, store, or fetch touched an address outside backing memory.
    OutOfRange {
        /// The first faulting address.
        addr: u32,
        /// The type of access attempted.
        access: AccessType,
    },
    /// Multi-byte memory operation with a size outside {1, 2, 4}.
    InvalidSize(u32),
    /// An opcode was registered twice in the decoder.
    DuplicateRegistration(u8),
    /// Environment call (ecall); privileged semantics are not modeled, the
    /// run stops here.
    Ecall,
    /// Breakpoint (ebreak); the run stops here.
    Ebreak,
}

impl fmt::Display for EmuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmuError::UnknownOpcode(opcode) => {
                write!(f, "opcode {opcode:#04x} not registered in the decoder")
            }
            EmuError::InvalidEncoding {
                opcode,
                funct3,
                funct7,
            } => {
                write!(
                    f,
                    "invalid encoding under opcode {opcode:#04x}: funct3={funct3}, funct7={funct7}"
                )
            }
            EmuError::OutOfRange { addr, access } => {
                write!(f, "memory {access} fault at {addr:#010x}")
            }
            EmuError::InvalidSize(n) => {
                write!(f, "memory access size must be 1, 2 or 4 bytes, got {n}")
            }
            EmuError::DuplicateRegistration(opcode) => {
                write!(f, "opcode {opcode:#04x} already registered in the decoder")
            }
            EmuError::Ecall => write!(f, "environment call"),
            EmuError::Ebreak => write!(f, "breakpoint"),
        }
    }
}

impl std::error::Error for EmuError {}

/// Result type for emulator operations.
pub type EmuResult<T> = Result<T, EmuError>;
