//! Interactive configuration of the mitigation toggles

use std::io;
use std::io::Write;

use text_io::try_read;

use crate::cpu::CPUPolicy;

/// Asks a yes/no question. Anything other than an answer starting with
/// `y` or `n` (including end of input) keeps `current`.
pub fn ask(
    question: &str,
    current: bool,
    input: &mut impl Iterator<Item = u8>,
    output: &mut impl Write,
) -> io::Result<bool> {
    let choices = if current { "Y/n" } else { "y/N" };
    write!(output, "{} [{}]: ", question, choices)?;
    output.flush()?;

    let answer: Result<String, _> = try_read!("{}\n", input.by_ref());
    let answer = match answer {
        Ok(answer) => answer.trim().to_lowercase(),
        Err(_) => return Ok(current),
    };

    Ok(if answer.starts_with('y') {
        true
    } else if answer.starts_with('n') {
        false
    } else {
        current
    })
}

/// Prompts for prediction, forwarding and reordering in that order
pub fn configure(
    policy: &mut CPUPolicy,
    input: &mut impl Iterator<Item = u8>,
    output: &mut impl Write,
) -> io::Result<()> {
    policy.prediction =
        ask("Enable branch prediction?", policy.prediction, input, output)?;
    policy.forwarding = ask("Enable forwarding?", policy.forwarding, input, output)?;
    policy.reordering =
        ask("Enable instruction reordering?", policy.reordering, input, output)?;
    Ok(())
}
