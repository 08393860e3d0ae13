//! Register dependency relations between two instructions.
//!
//! Register names are compared exactly. An instruction with no recognized
//! operands has empty read/write sets and never depends on anything.

use crate::instruction::Instruction;

/// Read-after-write: `consumer` reads the register `producer` writes
pub fn raw_hazard(producer: &Instruction, consumer: &Instruction) -> bool {
    producer.rd.as_ref().is_some_and(|rd| consumer.reads(rd))
}

/// Write-after-read: `later` writes a register `earlier` reads
pub fn war_hazard(earlier: &Instruction, later: &Instruction) -> bool {
    later.rd.as_ref().is_some_and(|rd| earlier.reads(rd))
}

/// Write-after-write: both write the same register
pub fn waw_hazard(earlier: &Instruction, later: &Instruction) -> bool {
    earlier.rd.as_ref().is_some_and(|rd| later.writes(rd))
}

/// Any RAW, WAR or WAW relation, in program order `earlier` then `later`
pub fn ordered(earlier: &Instruction, later: &Instruction) -> bool {
    raw_hazard(earlier, later)
        || war_hazard(earlier, later)
        || waw_hazard(earlier, later)
}

/// Any register name appearing in both instructions, read or written
pub fn shares_register(a: &Instruction, b: &Instruction) -> bool {
    a.registers().any(|reg| b.registers().any(|other| other == reg))
}
