//! Property-based tests for the decode/encode/memory core.
//!
//! Every encoder must round-trip through the decoder to a record carrying
//! exactly the fields it was given, across the full field ranges including
//! negative immediates and maximum-magnitude shifts.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)] // Test code can use unwrap
#![allow(clippy::cast_sign_loss)] // Test code casts are intentional
#![allow(clippy::cast_possible_wrap)] // Test code casts are intentional

use proptest::prelude::*;

use rv32emu::bits::{as_signed, as_unsigned, sext};
use rv32emu::isa::{encode, Decoder, Instruction, BRANCH, JAL as JAL_OP, LOAD, LUI as LUI_OP, OP, OP_IMM, STORE};
use rv32emu::Memory;

fn base_decoder() -> Decoder {
    let mut d = Decoder::new();
    d.register_base_iset().unwrap();
    d
}

proptest! {
    #[test]
    fn addi_round_trip(rd in 0u8..32, rs1 in 0u8..32, imm in -2048i32..2048) {
        let inst = base_decoder().decode(encode::addi(rd, rs1, imm)).unwrap();
        prop_assert_eq!(
            inst,
            Instruction::I { imm, rs1, funct3: 0b000, rd, opcode: OP_IMM }
        );
    }

    #[test]
    fn shift_round_trip(rd in 0u8..32, rs1 in 0u8..32, shamt in 0u8..32) {
        let inst = base_decoder().decode(encode::slli(rd, rs1, shamt)).unwrap();
        prop_assert_eq!(
            inst,
            Instruction::I { imm: i32::from(shamt), rs1, funct3: 0b001, rd, opcode: OP_IMM }
        );

        // The arithmetic variant carries its static marker in imm[11:5].
        let inst = base_decoder().decode(encode::srai(rd, rs1, shamt)).unwrap();
        prop_assert_eq!(
            inst,
            Instruction::I {
                imm: i32::from(shamt) | (0b010_0000 << 5),
                rs1,
                funct3: 0b101,
                rd,
                opcode: OP_IMM,
            }
        );
    }

    #[test]
    fn r_type_round_trip(rd in 0u8..32, rs1 in 0u8..32, rs2 in 0u8..32) {
        let inst = base_decoder().decode(encode::sub(rd, rs1, rs2)).unwrap();
        prop_assert_eq!(
            inst,
            Instruction::R { funct7: 0b010_0000, rs2, rs1, funct3: 0b000, rd, opcode: OP }
        );
    }

    #[test]
    fn store_round_trip(rs1 in 0u8..32, rs2 in 0u8..32, imm in -2048i32..2048) {
        let inst = base_decoder().decode(encode::sw(rs1, rs2, imm)).unwrap();
        prop_assert_eq!(
            inst,
            Instruction::S { imm, rs2, rs1, funct3: 0b010, opcode: STORE }
        );
    }

    #[test]
    fn load_round_trip(rd in 0u8..32, rs1 in 0u8..32, imm in -2048i32..2048) {
        let inst = base_decoder().decode(encode::lbu(rd, rs1, imm)).unwrap();
        prop_assert_eq!(
            inst,
            Instruction::I { imm, rs1, funct3: 0b100, rd, opcode: LOAD }
        );
    }

    #[test]
    fn branch_round_trip(
        rs1 in 0u8..32,
        rs2 in 0u8..32,
        imm in (-4096i32..4096).prop_map(|i| i & !1),
    ) {
        let inst = base_decoder().decode(encode::beq(rs1, rs2, imm)).unwrap();
        prop_assert_eq!(
            inst,
            Instruction::B { imm, rs2, rs1, funct3: 0b000, opcode: BRANCH }
        );
    }

    #[test]
    fn jal_round_trip(
        rd in 0u8..32,
        imm in (-1_048_576i32..1_048_576).prop_map(|i| i & !1),
    ) {
        let inst = base_decoder().decode(encode::jal(rd, imm)).unwrap();
        prop_assert_eq!(inst, Instruction::J { imm, rd, opcode: JAL_OP });
    }

    #[test]
    fn lui_round_trip(rd in 0u8..32, imm20 in 0u32..(1 << 20)) {
        let inst = base_decoder().decode(encode::lui(rd, imm20)).unwrap();
        prop_assert_eq!(
            inst,
            Instruction::U { imm: imm20 << 12, rd, opcode: LUI_OP }
        );
    }

    #[test]
    fn reinterpret_round_trip(value in any::<i32>()) {
        prop_assert_eq!(as_signed(as_unsigned(value)), value);
        prop_assert_eq!(as_unsigned(as_signed(value as u32)), value as u32);
    }

    #[test]
    fn sext_is_identity_below_sign_bit(word in any::<u32>(), sign_bit in 1u32..32) {
        // Clear the sign bit and everything above it.
        let cleared = word & ((1u32 << sign_bit) - 1) & !(1 << (sign_bit - 1));
        prop_assert_eq!(sext(cleared, sign_bit - 1), cleared);
    }

    #[test]
    fn memory_round_trip_masks_by_width(
        addr in 0u32..252,
        value in any::<u32>(),
        n in prop::sample::select(vec![1u32, 2, 4]),
    ) {
        let mut mem = Memory::new(256, 0);
        mem.store(addr, value, n).unwrap();

        let mask = if n == 4 { u32::MAX } else { (1 << (8 * n)) - 1 };
        prop_assert_eq!(mem.load(addr, n).unwrap(), value & mask);
    }

    #[test]
    fn memory_offset_translates(addr in 0u32..60, value in any::<u32>()) {
        let offset = 0x8000_0000;
        let mut mem = Memory::new(64, offset);

        mem.store(offset + addr, value, 1).unwrap();
        prop_assert_eq!(mem.load(offset + addr, 1).unwrap(), value & 0xFF);

        // The same address without the offset is out of range.
        prop_assert!(mem.load(addr, 1).is_err());
    }
}
