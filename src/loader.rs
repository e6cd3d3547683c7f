//! ELF loading for RV32I programs.

use goblin::elf::section_header::{SHF_EXECINSTR, SHT_PROGBITS};
use goblin::elf::Elf;

use crate::vm::{Memory, RegisterFile};

/// Error type for ELF loading.
#[derive(Debug, Clone)]
pub struct LoadError {
    /// Description of the error.
    pub reason: String,
}

impl LoadError {
    fn new(reason: impl Into<String>) -> Self {
        LoadError {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ELF load error: {}", self.reason)
    }
}

impl std::error::Error for LoadError {}

/// Load an RV32I ELF into a fresh register file and memory.
///
/// Locates the first `PROGBITS` section carrying executable code, copies
/// its bytes into a memory of `memory_size` bytes based at
/// `memory_offset`, and returns the register file with the PC seeded to
/// the section's load address.
///
/// # Errors
///
/// Returns an error if the ELF is invalid, not RISC-V 32-bit
/// little-endian, has no executable `PROGBITS` section, or the section
/// does not fit the memory range.
pub fn load_elf(
    elf_bytes: &[u8],
    memory_size: u32,
    memory_offset: u32,
) -> Result<(RegisterFile, Memory), LoadError> {
    let elf =
        Elf::parse(elf_bytes).map_err(|e| LoadError::new(format!("failed to parse ELF: {e}")))?;

    validate_header(&elf)?;

    let section = elf
        .section_headers
        .iter()
        .find(|sh| sh.sh_type == SHT_PROGBITS && sh.sh_flags & u64::from(SHF_EXECINSTR) != 0)
        .ok_or_else(|| LoadError::new("no executable PROGBITS section found"))?;

    let load_addr = u32::try_from(section.sh_addr).map_err(|_| {
        LoadError::new(format!(
            "section address {:#x} doesn't fit in u32",
            section.sh_addr
        ))
    })?;

    let file_offset = usize::try_from(section.sh_offset)
        .map_err(|_| LoadError::new(format!("section offset {} too large", section.sh_offset)))?;

    let size = usize::try_from(section.sh_size)
        .map_err(|_| LoadError::new(format!("section size {} too large", section.sh_size)))?;

    let end = file_offset
        .checked_add(size)
        .filter(|&end| end <= elf_bytes.len())
        .ok_or_else(|| {
            LoadError::new(format!(
                "section data at offset {file_offset} size {size} exceeds ELF size {}",
                elf_bytes.len()
            ))
        })?;

    let mut mem = Memory::new(memory_size, memory_offset);
    mem.store_bytes(load_addr, &elf_bytes[file_offset..end])
        .map_err(|e| {
            LoadError::new(format!(
                "code section at {load_addr:#x} size {size} doesn't fit memory: {e}"
            ))
        })?;

    Ok((RegisterFile::with_pc(load_addr), mem))
}

/// Validate the ELF header for RISC-V 32-bit little-endian.
fn validate_header(elf: &Elf) -> Result<(), LoadError> {
    if elf.header.e_machine != goblin::elf::header::EM_RISCV {
        return Err(LoadError::new(format!(
            "expected RISC-V ELF (machine {}), got machine type {}",
            goblin::elf::header::EM_RISCV,
            elf.header.e_machine
        )));
    }

    if elf.is_64 {
        return Err(LoadError::new("expected 32-bit ELF, got 64-bit"));
    }

    if !elf.little_endian {
        return Err(LoadError::new("expected little-endian ELF"));
    }

    Ok(())
}
