//! RV32I instruction execution.
//!
//! The cast warnings below are intentionally allowed because RISC-V
//! semantics require deliberate signed/unsigned reinterpretation of 32-bit
//! values.

#![allow(clippy::cast_possible_truncation)]

use crate::bits::{as_signed, as_unsigned, sext};
use crate::error::{EmuError, EmuResult};
use crate::isa::instruction::{AUIPC, BRANCH, JAL, JALR, LOAD, LUI, OP, OP_IMM, STORE, SYSTEM};
use crate::isa::Instruction;
use crate::vm::memory::Memory;
use crate::vm::registers::RegisterFile;

/// Execute one decoded RV32I instruction.
///
/// Returns the next PC value on success; the caller writes it back.
/// Non-control-flow instructions return `pc + 4`; JAL, JALR, and taken
/// branches return their target. All register arithmetic wraps modulo 2^32.
///
/// # Errors
///
/// Returns [`EmuError`] for unmatched funct3/funct7 combinations, memory
/// faults, and ecall/ebreak stops.
#[inline]
pub(crate) fn execute_rv32i(
    inst: Instruction,
    regs: &mut RegisterFile,
    mem: &mut Memory,
    pc: u32,
) -> EmuResult<u32> {
    match inst {
        Instruction::I {
            imm,
            rs1,
            funct3,
            rd,
            opcode,
        } => match opcode {
            OP_IMM => exec_op_imm(regs, rd, funct3, rs1, imm, pc),
            LOAD => exec_load(regs, mem, rd, funct3, rs1, imm, pc),
            JALR => exec_jalr(regs, rd, funct3, rs1, imm, pc),
            SYSTEM => exec_system(funct3, imm),
            _ => Err(EmuError::UnknownOpcode(opcode)),
        },

        Instruction::R {
            funct7,
            rs2,
            rs1,
            funct3,
            rd,
            opcode,
        } => match opcode {
            OP => exec_op(regs, rd, funct3, funct7, rs1, rs2, pc),
            _ => Err(EmuError::UnknownOpcode(opcode)),
        },

        Instruction::S {
            imm,
            rs2,
            rs1,
            funct3,
            opcode,
        } => match opcode {
            STORE => exec_store(regs, mem, funct3, rs1, rs2, imm, pc),
            _ => Err(EmuError::UnknownOpcode(opcode)),
        },

        Instruction::B {
            imm,
            rs2,
            rs1,
            funct3,
            opcode,
        } => match opcode {
            BRANCH => exec_branch(regs, funct3, rs1, rs2, imm, pc),
            _ => Err(EmuError::UnknownOpcode(opcode)),
        },

        Instruction::U { imm, rd, opcode } => match opcode {
            LUI => {
                regs.write(rd, imm);
                Ok(pc.wrapping_add(4))
            }
            AUIPC => {
                regs.write(rd, pc.wrapping_add(imm));
                Ok(pc.wrapping_add(4))
            }
            _ => Err(EmuError::UnknownOpcode(opcode)),
        },

        Instruction::J { imm, rd, opcode } => match opcode {
            JAL => {
                regs.write(rd, pc.wrapping_add(4));
                Ok(pc.wrapping_add(as_unsigned(imm)))
            }
            _ => Err(EmuError::UnknownOpcode(opcode)),
        },
    }
}

/// OP-IMM group: register-immediate arithmetic, logic, comparisons, and
/// shifts.
///
/// The shift instructions dispatch on the combined (funct3, imm[11:5]) key;
/// nonzero static bits outside that key are an invalid encoding.
fn exec_op_imm(
    regs: &mut RegisterFile,
    rd: u8,
    funct3: u8,
    rs1: u8,
    imm: i32,
    pc: u32,
) -> EmuResult<u32> {
    let src = regs.read(rs1);
    let imm_u = as_unsigned(imm);
    let shamt = imm_u & 0x1F;
    let upper = ((imm_u >> 5) & 0x7F) as u8;

    let value = match funct3 {
        0b000 => src.wrapping_add(imm_u),
        0b010 => u32::from(as_signed(src) < imm),
        0b011 => u32::from(src < imm_u),
        0b100 => src ^ imm_u,
        0b110 => src | imm_u,
        0b111 => src & imm_u,
        0b001 if upper == 0b000_0000 => src << shamt,
        0b101 if upper == 0b000_0000 => src >> shamt,
        0b101 if upper == 0b010_0000 => as_unsigned(as_signed(src) >> shamt),
        _ => {
            return Err(EmuError::InvalidEncoding {
                opcode: OP_IMM,
                funct3,
                funct7: upper,
            })
        }
    };

    regs.write(rd, value);
    Ok(pc.wrapping_add(4))
}

/// OP group: register-register arithmetic and logic, keyed on
/// (funct7, funct3).
fn exec_op(
    regs: &mut RegisterFile,
    rd: u8,
    funct3: u8,
    funct7: u8,
    rs1: u8,
    rs2: u8,
    pc: u32,
) -> EmuResult<u32> {
    let a = regs.read(rs1);
    let b = regs.read(rs2);
    let shamt = b & 0x1F;

    let value = match (funct7, funct3) {
        (0b000_0000, 0b000) => a.wrapping_add(b),
        (0b010_0000, 0b000) => a.wrapping_sub(b),
        (0b000_0000, 0b001) => a << shamt,
        (0b000_0000, 0b010) => u32::from(as_signed(a) < as_signed(b)),
        (0b000_0000, 0b011) => u32::from(a < b),
        (0b000_0000, 0b100) => a ^ b,
        (0b000_0000, 0b101) => a >> shamt,
        (0b010_0000, 0b101) => as_unsigned(as_signed(a) >> shamt),
        (0b000_0000, 0b110) => a | b,
        (0b000_0000, 0b111) => a & b,
        _ => {
            return Err(EmuError::InvalidEncoding {
                opcode: OP,
                funct3,
                funct7,
            })
        }
    };

    regs.write(rd, value);
    Ok(pc.wrapping_add(4))
}

/// LOAD group: byte, halfword, and word loads with sign or zero extension.
fn exec_load(
    regs: &mut RegisterFile,
    mem: &Memory,
    rd: u8,
    funct3: u8,
    rs1: u8,
    imm: i32,
    pc: u32,
) -> EmuResult<u32> {
    let addr = regs.read(rs1).wrapping_add(as_unsigned(imm));

    let value = match funct3 {
        0b000 => sext(mem.load(addr, 1)?, 7),
        0b001 => sext(mem.load(addr, 2)?, 15),
        0b010 => mem.load(addr, 4)?,
        0b100 => mem.load(addr, 1)?,
        0b101 => mem.load(addr, 2)?,
        _ => {
            return Err(EmuError::InvalidEncoding {
                opcode: LOAD,
                funct3,
                funct7: 0,
            })
        }
    };

    regs.write(rd, value);
    Ok(pc.wrapping_add(4))
}

/// STORE group: write the low bytes of rs2 to memory.
fn exec_store(
    regs: &RegisterFile,
    mem: &mut Memory,
    funct3: u8,
    rs1: u8,
    rs2: u8,
    imm: i32,
    pc: u32,
) -> EmuResult<u32> {
    let addr = regs.read(rs1).wrapping_add(as_unsigned(imm));

    let n = match funct3 {
        0b000 => 1,
        0b001 => 2,
        0b010 => 4,
        _ => {
            return Err(EmuError::InvalidEncoding {
                opcode: STORE,
                funct3,
                funct7: 0,
            })
        }
    };

    mem.store(addr, regs.read(rs2), n)?;
    Ok(pc.wrapping_add(4))
}

/// BRANCH group: conditionally redirect the PC by the immediate offset.
fn exec_branch(
    regs: &RegisterFile,
    funct3: u8,
    rs1: u8,
    rs2: u8,
    imm: i32,
    pc: u32,
) -> EmuResult<u32> {
    let a = regs.read(rs1);
    let b = regs.read(rs2);

    let taken = match funct3 {
        0b000 => a == b,
        0b001 => a != b,
        0b100 => as_signed(a) < as_signed(b),
        0b101 => as_signed(a) >= as_signed(b),
        0b110 => a < b,
        0b111 => a >= b,
        _ => {
            return Err(EmuError::InvalidEncoding {
                opcode: BRANCH,
                funct3,
                funct7: 0,
            })
        }
    };

    if taken {
        Ok(pc.wrapping_add(as_unsigned(imm)))
    } else {
        Ok(pc.wrapping_add(4))
    }
}

/// JALR: indirect jump with link; the computed target's low bit is
/// cleared.
fn exec_jalr(
    regs: &mut RegisterFile,
    rd: u8,
    funct3: u8,
    rs1: u8,
    imm: i32,
    pc: u32,
) -> EmuResult<u32> {
    if funct3 != 0 {
        return Err(EmuError::InvalidEncoding {
            opcode: JALR,
            funct3,
            funct7: 0,
        });
    }

    let link = pc.wrapping_add(4);
    let target = regs.read(rs1).wrapping_add(as_unsigned(imm)) & !1;
    regs.write(rd, link);
    Ok(target)
}

/// SYSTEM group: ecall/ebreak stop the run; CSR encodings are not part of
/// the base set.
fn exec_system(funct3: u8, imm: i32) -> EmuResult<u32> {
    match (funct3, imm) {
        (0b000, 0) => Err(EmuError::Ecall),
        (0b000, 1) => Err(EmuError::Ebreak),
        _ => Err(EmuError::InvalidEncoding {
            opcode: SYSTEM,
            funct3,
            funct7: ((as_unsigned(imm) >> 5) & 0x7F) as u8,
        }),
    }
}
