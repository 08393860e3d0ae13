//! Decoding helpers: one line of assembly text into an [`Instruction`].
//!
//! Register tokens start with `$` and end at `,`, `)` or whitespace.
//! Memory operands are written `offset($base)`.

use super::Function;
use super::Instruction;
use super::Opcode;
use super::Register;

fn is_register_end(c: char) -> bool {
    c == ',' || c == ')' || c.is_whitespace()
}

/// Every register token in `text`, left to right
fn registers(text: &str) -> Vec<Register> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('$') {
        let token = &rest[start..];
        let end = token.find(is_register_end).unwrap_or(token.len());
        // A bare `$` is a missing operand, not a register
        if end > 1 {
            found.push(Register::new(&token[..end]));
        }
        rest = &token[end..];
    }
    found
}

/// The base register of an `offset($base)` operand
fn base_register(operands: &str) -> Option<Register> {
    let (_, inner) = operands.split_once('(')?;
    registers(inner).into_iter().next()
}

/// Registers written before the memory operand
fn leading_register(operands: &str) -> Option<Register> {
    let head = operands.split('(').next().unwrap_or(operands);
    registers(head).into_iter().next()
}

/// Parses one trimmed line; unknown mnemonics and missing operands
/// produce empty dependency sets instead of an error
pub fn parse(address: u32, line: &str) -> Instruction {
    let text = line.trim();
    let mnemonic = text.split_whitespace().next().unwrap_or("");
    let function = Function::from_mnemonic(mnemonic);
    let opcode = function.opcode();
    let operands = &text[mnemonic.len()..];

    let (rd, sources) = match opcode {
        Opcode::Arithmetic => {
            let mut regs = registers(operands).into_iter();
            let rd = regs.next();
            (rd, regs.take(2).collect())
        }
        Opcode::Load => {
            (leading_register(operands), base_register(operands).into_iter().collect())
        }
        Opcode::Store => {
            // Stored value first, then the base
            let sources = leading_register(operands)
                .into_iter()
                .chain(base_register(operands))
                .collect();
            (None, sources)
        }
        Opcode::Branch => (None, registers(operands).into_iter().take(2).collect()),
        Opcode::Jump | Opcode::Unknown => (None, Vec::new()),
    };

    Instruction {
        address,
        opcode,
        function,
        rd,
        sources,
        text: text.to_string(),
    }
}
