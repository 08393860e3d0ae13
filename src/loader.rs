//! Utility functions for turning a program file into instructions

use std::path::Path;

use log::debug;
use log::info;

use crate::error::ProgramError;
use crate::error::SimulatorResult;
use crate::instruction::Instruction;

/// Bytes between consecutive instruction addresses
pub const INSTRUCTION_SIZE: u32 = 4;

/// Parses program text; blank lines and `#` comments are skipped
pub fn parse_program(source: &str) -> Vec<Instruction> {
    let mut program = Vec::new();
    let mut address: u32 = 0;

    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let inst = Instruction::new(address, line);
        debug!(
            "{:#06x}: {} (rd: {:?}, sources: {:?})",
            address, inst.text, inst.rd, inst.sources
        );
        program.push(inst);
        address += INSTRUCTION_SIZE;
    }

    program
}

/// Loads a program file
pub fn load_program(path: &Path) -> SimulatorResult<Vec<Instruction>> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| ProgramError::FileReadError(path.to_path_buf(), e))?;
    let program = parse_program(&source);
    info!("Loaded {} instructions from {}", program.len(), path.display());
    Ok(program)
}
