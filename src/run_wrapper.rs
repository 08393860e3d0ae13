//! A simulator wrapper

use std::path::Path;

use log::warn;

use crate::cpu::CPUPolicy;
use crate::cpu::CPUState;
use crate::error::SimulatorResult;
use crate::instruction::Instruction;
use crate::loader;
use crate::pipelined;
use crate::pipelined::SimulationResult;
use crate::stats::Statistics;

/// Outcome of one run. `statistics` is `None` when no instruction retired.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub result: SimulationResult,
    pub statistics: Option<Statistics>,
}

/// Run simulation on the given program file with a fresh context
pub fn run(program_path: &Path, policy: CPUPolicy) -> SimulatorResult<RunReport> {
    let program = loader::load_program(program_path)?;
    let mut cpu = CPUState::make(policy);
    Ok(simulate(&mut cpu, &program))
}

/// Run simulation on already parsed instructions
pub fn simulate(cpu: &mut CPUState, program: &[Instruction]) -> RunReport {
    let result = pipelined::run(cpu, program);

    let statistics = match Statistics::compute(&result) {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };

    if cpu.policy.history {
        print_history(&cpu.policy, statistics.as_ref());
    }

    RunReport { result, statistics }
}

/// Runs `program` under every mitigation combination, each with its own
/// context so predictions never leak between configurations
pub fn sweep(program: &[Instruction]) -> Vec<(CPUPolicy, RunReport)> {
    CPUPolicy::sweep()
        .into_iter()
        .map(|policy| {
            let mut cpu = CPUState::make(policy);
            (policy, simulate(&mut cpu, program))
        })
        .collect()
}

fn print_history(policy: &CPUPolicy, statistics: Option<&Statistics>) {
    eprintln!("[HISTORY] Configuration = {}", policy.label());
    match statistics {
        Some(stats) => {
            eprintln!(
                "[HISTORY] # cycles = {}, # instructions = {}",
                stats.cycles, stats.executed
            );
            eprintln!(
                "[HISTORY] CPI = {:.2}, throughput = {:.3}, speedup = {:.2}",
                stats.cpi, stats.throughput, stats.speedup
            );
            eprintln!(
                "[HISTORY] stalls = {} data / {} control, mispredictions = {}",
                stats.data_stall_cycles, stats.control_stall_cycles, stats.mispredictions
            );
        }
        None => eprintln!("[HISTORY] No instructions executed"),
    }
}
