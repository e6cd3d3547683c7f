//! Instruction formats and the opcode-driven decoder.
//!
//! The cast warnings below are intentionally allowed: every field extracted
//! from an instruction word fits its target width by construction.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

use std::collections::HashMap;

use crate::bits::{as_signed, extract, sext};
use crate::error::{EmuError, EmuResult};

/// LOAD opcode group (LB/LH/LW/LBU/LHU).
pub const LOAD: u8 = 0b000_0011;
/// MISC-MEM opcode group (FENCE); registered but reserved.
pub const MISC_MEM: u8 = 0b000_1111;
/// OP-IMM opcode group (ADDI, shifts, comparisons, logic).
pub const OP_IMM: u8 = 0b001_0011;
/// AUIPC.
pub const AUIPC: u8 = 0b001_0111;
/// STORE opcode group (SB/SH/SW).
pub const STORE: u8 = 0b010_0011;
/// OP opcode group (register-register arithmetic and logic).
pub const OP: u8 = 0b011_0011;
/// LUI.
pub const LUI: u8 = 0b011_0111;
/// BRANCH opcode group (BEQ/BNE/BLT/BGE/BLTU/BGEU).
pub const BRANCH: u8 = 0b110_0011;
/// JALR.
pub const JALR: u8 = 0b110_0111;
/// JAL.
pub const JAL: u8 = 0b110_1111;
/// SYSTEM opcode group (ECALL/EBREAK).
pub const SYSTEM: u8 = 0b111_0011;

/// Encoding format of a 7-bit opcode group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrFormat {
    /// Register-register.
    R,
    /// Register-immediate, loads, JALR, SYSTEM.
    I,
    /// Stores.
    S,
    /// Conditional branches.
    B,
    /// Upper immediates (LUI/AUIPC).
    U,
    /// Unconditional jumps (JAL).
    J,
    /// Registered opcode group carrying no decodable instructions
    /// (MISC-MEM).
    Reserved,
}

/// A decoded instruction record, tagged by format.
///
/// # Field Conventions
/// - `rd`: destination register (0-31)
/// - `rs1` / `rs2`: source registers (0-31)
/// - `funct3` / `funct7`: sub-function discriminators
/// - `imm`: immediate, reassembled and sign-extended by the decoder; the
///   executor never re-derives immediate bits
///
/// The U-format immediate is kept unsigned and pre-shifted (low 12 bits
/// zero); all other immediates are two's-complement 32-bit values.
#[allow(missing_docs)] // Fields are self-documenting per the conventions above
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    R { funct7: u8, rs2: u8, rs1: u8, funct3: u8, rd: u8, opcode: u8 },
    I { imm: i32, rs1: u8, funct3: u8, rd: u8, opcode: u8 },
    S { imm: i32, rs2: u8, rs1: u8, funct3: u8, opcode: u8 },
    B { imm: i32, rs2: u8, rs1: u8, funct3: u8, opcode: u8 },
    U { imm: u32, rd: u8, opcode: u8 },
    J { imm: i32, rd: u8, opcode: u8 },
}

/// Maps 7-bit opcodes to instruction formats and drives field extraction.
///
/// The table starts empty; hosts call [`Decoder::register_base_iset`] to
/// install the RV32I groups, or [`Decoder::register`] to add entries one at
/// a time.
#[derive(Debug, Default)]
pub struct Decoder {
    formats: HashMap<u8, InstrFormat>,
}

impl Decoder {
    /// Create a decoder with an empty format table.
    #[must_use]
    pub fn new() -> Self {
        Decoder {
            formats: HashMap::new(),
        }
    }

    /// Map `opcode` to `format`.
    ///
    /// # Errors
    ///
    /// Returns [`EmuError::DuplicateRegistration`] when the opcode is
    /// already present.
    pub fn register(&mut self, opcode: u8, format: InstrFormat) -> EmuResult<()> {
        if self.formats.contains_key(&opcode) {
            return Err(EmuError::DuplicateRegistration(opcode));
        }
        self.formats.insert(opcode, format);
        Ok(())
    }

    /// Install the RV32I base opcode groups.
    ///
    /// # Errors
    ///
    /// Returns [`EmuError::DuplicateRegistration`] if any base opcode was
    /// registered before this call.
    pub fn register_base_iset(&mut self) -> EmuResult<()> {
        self.register(LOAD, InstrFormat::I)?;
        self.register(MISC_MEM, InstrFormat::Reserved)?;
        self.register(OP_IMM, InstrFormat::I)?;
        self.register(AUIPC, InstrFormat::U)?;
        self.register(STORE, InstrFormat::S)?;
        self.register(OP, InstrFormat::R)?;
        self.register(LUI, InstrFormat::U)?;
        self.register(BRANCH, InstrFormat::B)?;
        self.register(JALR, InstrFormat::I)?;
        self.register(JAL, InstrFormat::J)?;
        self.register(SYSTEM, InstrFormat::I)?;
        Ok(())
    }

    /// Decode a 32-bit instruction word into an [`Instruction`] record.
    ///
    /// # Errors
    ///
    /// Returns [`EmuError::UnknownOpcode`] when `word[6:0]` has no table
    /// entry, and [`EmuError::InvalidEncoding`] for reserved opcode groups.
    pub fn decode(&self, word: u32) -> EmuResult<Instruction> {
        let opcode = extract(word, 0, 6) as u8;

        let Some(format) = self.formats.get(&opcode) else {
            return Err(EmuError::UnknownOpcode(opcode));
        };

        match format {
            InstrFormat::R => Ok(decode_r(word)),
            InstrFormat::I => Ok(decode_i(word)),
            InstrFormat::S => Ok(decode_s(word)),
            InstrFormat::B => Ok(decode_b(word)),
            InstrFormat::U => Ok(decode_u(word)),
            InstrFormat::J => Ok(decode_j(word)),
            InstrFormat::Reserved => Err(EmuError::InvalidEncoding {
                opcode,
                funct3: extract(word, 12, 14) as u8,
                funct7: extract(word, 25, 31) as u8,
            }),
        }
    }
}

/// R-format: funct7 | rs2 | rs1 | funct3 | rd | opcode.
fn decode_r(word: u32) -> Instruction {
    Instruction::R {
        funct7: extract(word, 25, 31) as u8,
        rs2: extract(word, 20, 24) as u8,
        rs1: extract(word, 15, 19) as u8,
        funct3: extract(word, 12, 14) as u8,
        rd: extract(word, 7, 11) as u8,
        opcode: extract(word, 0, 6) as u8,
    }
}

/// I-format: imm[11:0] = word[31:20], sign-extended.
fn decode_i(word: u32) -> Instruction {
    Instruction::I {
        imm: as_signed(sext(extract(word, 20, 31), 11)),
        rs1: extract(word, 15, 19) as u8,
        funct3: extract(word, 12, 14) as u8,
        rd: extract(word, 7, 11) as u8,
        opcode: extract(word, 0, 6) as u8,
    }
}

/// S-format: imm[11:5] = word[31:25], imm[4:0] = word[11:7].
fn decode_s(word: u32) -> Instruction {
    let imm = (extract(word, 25, 31) << 5) | extract(word, 7, 11);
    Instruction::S {
        imm: as_signed(sext(imm, 11)),
        rs2: extract(word, 20, 24) as u8,
        rs1: extract(word, 15, 19) as u8,
        funct3: extract(word, 12, 14) as u8,
        opcode: extract(word, 0, 6) as u8,
    }
}

/// B-format: imm[12|10:5|4:1|11] = word[31|30:25|11:8|7]; bit 0 always 0.
fn decode_b(word: u32) -> Instruction {
    let imm = (extract(word, 31, 31) << 12)
        | (extract(word, 7, 7) << 11)
        | (extract(word, 25, 30) << 5)
        | (extract(word, 8, 11) << 1);
    Instruction::B {
        imm: as_signed(sext(imm, 12)),
        rs2: extract(word, 20, 24) as u8,
        rs1: extract(word, 15, 19) as u8,
        funct3: extract(word, 12, 14) as u8,
        opcode: extract(word, 0, 6) as u8,
    }
}

/// U-format: imm[31:12] = word[31:12], low 12 bits zero.
fn decode_u(word: u32) -> Instruction {
    Instruction::U {
        imm: extract(word, 12, 31) << 12,
        rd: extract(word, 7, 11) as u8,
        opcode: extract(word, 0, 6) as u8,
    }
}

/// J-format: imm[20|10:1|11|19:12] = word[31|30:21|20|19:12]; bit 0
/// always 0.
fn decode_j(word: u32) -> Instruction {
    let imm = (extract(word, 31, 31) << 20)
        | (extract(word, 12, 19) << 12)
        | (extract(word, 20, 20) << 11)
        | (extract(word, 21, 30) << 1);
    Instruction::J {
        imm: as_signed(sext(imm, 20)),
        rd: extract(word, 7, 11) as u8,
        opcode: extract(word, 0, 6) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_decoder() -> Decoder {
        let mut d = Decoder::new();
        d.register_base_iset().unwrap();
        d
    }

    #[test]
    fn test_decode_i_addi() {
        // addi a0, a1, 10
        let inst = base_decoder().decode(0x00A5_8513).unwrap();
        assert_eq!(
            inst,
            Instruction::I {
                imm: 10,
                rs1: 11,
                funct3: 0,
                rd: 10,
                opcode: OP_IMM
            }
        );
    }

    #[test]
    fn test_decode_i_negative_imm() {
        // addi x1, x0, -1
        let inst = base_decoder().decode(0xFFF0_0093).unwrap();
        assert_eq!(
            inst,
            Instruction::I {
                imm: -1,
                rs1: 0,
                funct3: 0,
                rd: 1,
                opcode: OP_IMM
            }
        );
    }

    #[test]
    fn test_decode_s_sw() {
        // sw x1, 3(x2)
        let inst = base_decoder().decode(0x0011_21A3).unwrap();
        assert_eq!(
            inst,
            Instruction::S {
                imm: 3,
                rs2: 1,
                rs1: 2,
                funct3: 2,
                opcode: STORE
            }
        );
    }

    #[test]
    fn test_decode_b_negative_offset() {
        // beq x1, x2, -16
        let inst = base_decoder().decode(0xFE20_88E3).unwrap();
        assert_eq!(
            inst,
            Instruction::B {
                imm: -16,
                rs2: 2,
                rs1: 1,
                funct3: 0,
                opcode: BRANCH
            }
        );
    }

    #[test]
    fn test_decode_u_lui() {
        // lui x1, 10
        let inst = base_decoder().decode(0x0000_A0B7).unwrap();
        assert_eq!(
            inst,
            Instruction::U {
                imm: 10 << 12,
                rd: 1,
                opcode: LUI
            }
        );
    }

    #[test]
    fn test_decode_j_negative_offset() {
        // jal x1, -1042430
        let inst = base_decoder().decode(0x8030_10EF).unwrap();
        assert_eq!(
            inst,
            Instruction::J {
                imm: -1_042_430,
                rd: 1,
                opcode: JAL
            }
        );
    }

    #[test]
    fn test_decode_r_add() {
        // add x1, x2, x3
        let inst = base_decoder().decode(0x0031_00B3).unwrap();
        assert_eq!(
            inst,
            Instruction::R {
                funct7: 0,
                rs2: 3,
                rs1: 2,
                funct3: 0,
                rd: 1,
                opcode: OP
            }
        );
    }

    #[test]
    fn test_unknown_opcode() {
        // Opcode 0b0101011 is not part of the base set.
        assert_eq!(
            base_decoder().decode(0x0000_002B),
            Err(EmuError::UnknownOpcode(0x2B))
        );
    }

    #[test]
    fn test_empty_decoder_knows_nothing() {
        let d = Decoder::new();
        assert_eq!(d.decode(0x00A5_8513), Err(EmuError::UnknownOpcode(OP_IMM)));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut d = base_decoder();
        assert_eq!(
            d.register(OP_IMM, InstrFormat::I),
            Err(EmuError::DuplicateRegistration(OP_IMM))
        );
        // And a second base registration trips on the first opcode.
        assert!(d.register_base_iset().is_err());
    }

    #[test]
    fn test_reserved_format_rejected() {
        // fence (MISC-MEM group): registered, but carries no instructions.
        let result = base_decoder().decode(0x0FF0_000F);
        assert!(matches!(
            result,
            Err(EmuError::InvalidEncoding {
                opcode: MISC_MEM,
                ..
            })
        ));
    }
}
