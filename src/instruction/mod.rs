//! Instruction representation

use std::fmt;

pub mod decode_helper;

/// Register identifier as written in the program, e.g. `$t0`.
/// Compared as an opaque name; no aliasing between spellings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(String);

impl Register {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed program instruction.
///
/// Built once by the loader and never mutated afterwards; everything the
/// pipeline learns about an instruction at run time lives in its trace entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    /// Program address, assigned in program order
    pub address: u32,
    /// Opcode class
    pub opcode: Opcode,
    /// Mnemonic
    pub function: Function,
    /// Destination register
    pub rd: Option<Register>,
    /// Source registers, in operand order
    pub sources: Vec<Register>,
    /// Trimmed source line
    pub text: String,
}

impl Instruction {
    pub fn new(address: u32, line: &str) -> Self {
        decode_helper::parse(address, line)
    }

    pub fn is_load(&self) -> bool {
        self.opcode == Opcode::Load
    }

    /// Branches and jumps
    pub fn is_control(&self) -> bool {
        matches!(self.opcode, Opcode::Branch | Opcode::Jump)
    }

    pub fn reads(&self, reg: &Register) -> bool {
        self.sources.contains(reg)
    }

    pub fn writes(&self, reg: &Register) -> bool {
        self.rd.as_ref() == Some(reg)
    }

    /// Every register this instruction reads or writes
    pub fn registers(&self) -> impl Iterator<Item = &Register> {
        self.rd.iter().chain(self.sources.iter())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Opcode class
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Arithmetic,
    Load,
    Store,
    Branch,
    Jump,
    Unknown,
}

/// Supported mnemonics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Function {
    ADD,
    SUB,
    AND,
    OR,
    SLT,
    MUL,
    DIV,
    LW,
    LB,
    LH,
    SW,
    SB,
    SH,
    BEQ,
    BNE,
    J,
    JAL,
    #[default]
    UNKNOWN,
}

impl Function {
    /// Case-insensitive mnemonic lookup; anything else is `UNKNOWN`
    pub fn from_mnemonic(mnemonic: &str) -> Self {
        use Function::*;
        match mnemonic.to_ascii_lowercase().as_str() {
            "add" => ADD,
            "sub" => SUB,
            "and" => AND,
            "or" => OR,
            "slt" => SLT,
            "mul" => MUL,
            "div" => DIV,
            "lw" => LW,
            "lb" => LB,
            "lh" => LH,
            "sw" => SW,
            "sb" => SB,
            "sh" => SH,
            "beq" => BEQ,
            "bne" => BNE,
            "j" => J,
            "jal" => JAL,
            _ => UNKNOWN,
        }
    }

    pub fn opcode(self) -> Opcode {
        use Function::*;
        match self {
            ADD | SUB | AND | OR | SLT | MUL | DIV => Opcode::Arithmetic,
            LW | LB | LH => Opcode::Load,
            SW | SB | SH => Opcode::Store,
            BEQ | BNE => Opcode::Branch,
            J | JAL => Opcode::Jump,
            UNKNOWN => Opcode::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonics_map_to_classes() {
        assert_eq!(Function::from_mnemonic("LW").opcode(), Opcode::Load);
        assert_eq!(Function::from_mnemonic("sh").opcode(), Opcode::Store);
        assert_eq!(Function::from_mnemonic("jal").opcode(), Opcode::Jump);
        assert_eq!(Function::from_mnemonic("addi"), Function::UNKNOWN);
    }

    #[test]
    fn control_instructions() {
        assert!(Instruction::new(0, "beq $t0, $t1, 8").is_control());
        assert!(Instruction::new(0, "j 64").is_control());
        assert!(!Instruction::new(0, "lw $t0, 0($sp)").is_control());
    }
}
