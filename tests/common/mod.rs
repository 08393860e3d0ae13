//! Helpers shared by the integration tests

#![allow(dead_code)]

use sim_lib::cpu::CPUPolicy;
use sim_lib::cpu::CPUState;
use sim_lib::loader::parse_program;
use sim_lib::pipelined;
use sim_lib::pipelined::SimulationResult;
use sim_lib::pipelined::TraceEntry;

pub fn simulate(source: &str, policy: CPUPolicy) -> SimulationResult {
    let mut cpu = CPUState::make(policy);
    pipelined::run(&mut cpu, &parse_program(source))
}

/// The entry of `text` that reached writeback
pub fn retired<'a>(result: &'a SimulationResult, text: &str) -> &'a TraceEntry {
    result
        .trace
        .iter()
        .find(|entry| entry.completed && result.instruction(entry).text == text)
        .unwrap_or_else(|| panic!("'{}' never retired", text))
}

/// `n` instructions touching pairwise disjoint registers
pub fn independent_program(n: usize) -> String {
    (0..n)
        .map(|i| format!("add $r{}, $r{}, $r{}", 3 * i, 3 * i + 1, 3 * i + 2))
        .collect::<Vec<_>>()
        .join("\n")
}
