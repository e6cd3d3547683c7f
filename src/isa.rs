//! RISC-V instruction set definitions: formats, decoding, encoding,
//! execution.

pub mod encode;
mod instruction;
mod rv32i;

pub use instruction::{
    Decoder, InstrFormat, Instruction, AUIPC, BRANCH, JAL, JALR, LOAD, LUI, MISC_MEM, OP, OP_IMM,
    STORE, SYSTEM,
};
pub(crate) use rv32i::execute_rv32i;
