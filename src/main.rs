//! rv32emu CLI - load an RV32I ELF binary and execute it.

// Allow print in the CLI binary
#![allow(clippy::print_stderr)]

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use rv32emu::{load_elf, Emulator};

/// Functional emulator for the RV32I base integer instruction set
#[derive(Parser, Debug)]
#[command(name = "rv32emu")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ELF file with RISC-V machine code in it
    #[arg(long)]
    file: PathBuf,

    /// Size of the backing memory in bytes
    #[arg(long = "memory_size", default_value_t = 100)]
    memory_size: u32,

    /// Base address of the backing memory
    #[arg(long = "memory_offset", default_value_t = 0)]
    memory_offset: u32,

    /// Trace every register and PC write
    #[arg(long)]
    log_reg: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_reg);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let elf_bytes = std::fs::read(&args.file)
        .map_err(|e| format!("failed to read {}: {e}", args.file.display()))?;

    let (regs, mem) = load_elf(&elf_bytes, args.memory_size, args.memory_offset)?;
    let mut emulator = Emulator::from_parts(regs, mem)?;
    emulator.run()?;

    Ok(())
}

fn init_logging(log_reg: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if log_reg {
        builder.filter_module("rv32emu::vm::registers", log::LevelFilter::Trace);
    }
    builder.init();
}
