//! Performance statistics of a finished run.
//!
//! Everything here is derived from a [`SimulationResult`]:
//! 1. **Cycles and retirement:** cycle count, executed and flushed instructions.
//! 2. **Ratios:** CPI, throughput, speedup over an unpipelined machine.
//! 3. **Time:** total elapsed time at a fixed cycle time.
//! 4. **Hazards:** stall cycles, mispredictions, bypassed operands.

use std::fmt;

use crate::error::SimulatorError;
use crate::error::SimulatorResult;
use crate::pipelined::pipeline::STAGE_COUNT;
use crate::pipelined::SimulationResult;

/// Duration of one clock cycle in picoseconds
pub const CYCLE_TIME_PS: u64 = 200;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Statistics {
    /// Total cycles of the run
    pub cycles: u64,
    /// Instructions that reached writeback
    pub executed: u64,
    /// Trace entries, flushed ones included
    pub fetched: u64,
    pub flushed: u64,

    /// Cycles per retired instruction
    pub cpi: f64,
    /// Retired instructions per cycle
    pub throughput: f64,
    /// Unpipelined cycles (`executed * STAGE_COUNT`) over pipelined cycles
    pub speedup: f64,
    pub total_time_ps: u64,

    pub data_stall_cycles: u64,
    pub control_stall_cycles: u64,
    pub mispredictions: u64,
    pub bypassed_operands: u64,

    /// False when the cycle ceiling cut the run short
    pub complete: bool,
}

impl Statistics {
    /// Fails with [`SimulatorError::NoInstructionsExecuted`] when nothing
    /// retired, since none of the ratios exist then
    pub fn compute(result: &SimulationResult) -> SimulatorResult<Self> {
        let executed = result.executed();
        let cycles = result.cycles;
        if executed == 0 || cycles == 0 {
            return Err(SimulatorError::NoInstructionsExecuted);
        }

        let history = result.history;
        Ok(Self {
            cycles,
            executed,
            fetched: result.trace.len() as u64,
            flushed: history.flushed,
            cpi: cycles as f64 / executed as f64,
            throughput: executed as f64 / cycles as f64,
            speedup: (executed * STAGE_COUNT as u64) as f64 / cycles as f64,
            total_time_ps: cycles * CYCLE_TIME_PS,
            data_stall_cycles: history.data_stall_cycles,
            control_stall_cycles: history.control_stall_cycles,
            mispredictions: history.mispredictions,
            bypassed_operands: history.bypassed_operands,
            complete: result.is_complete(),
        })
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Cycles: {}", self.cycles)?;
        writeln!(f, "Executed Instructions: {}", self.executed)?;
        writeln!(f, "Flushed Instructions: {}", self.flushed)?;
        writeln!(f, "CPI: {:.2}", self.cpi)?;
        writeln!(f, "Throughput (instr/cycle): {:.3}", self.throughput)?;
        writeln!(f, "Speedup: {:.2}x", self.speedup)?;
        writeln!(f, "Total Time (ps): {}", self.total_time_ps)?;
        writeln!(
            f,
            "Stall Cycles: {} data, {} control",
            self.data_stall_cycles, self.control_stall_cycles
        )?;
        writeln!(f, "Branch Mispredictions: {}", self.mispredictions)?;
        write!(f, "Bypassed Operands: {}", self.bypassed_operands)?;
        if !self.complete {
            write!(f, "\n(cycle limit reached; figures cover a partial run)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CPUPolicy;
    use crate::cpu::CPUState;
    use crate::loader::parse_program;
    use crate::pipelined;

    fn stats_for(source: &str, policy: CPUPolicy) -> SimulatorResult<Statistics> {
        let mut cpu = CPUState::make(policy);
        let result = pipelined::run(&mut cpu, &parse_program(source));
        Statistics::compute(&result)
    }

    #[test]
    fn ideal_pipeline_figures() {
        let stats = stats_for(
            "add $t0, $t1, $t2\nor $s0, $s1, $s2\nsub $a0, $a1, $a2\nand $v0, $v1, $t9",
            CPUPolicy::with_mitigations(false, false, false),
        )
        .unwrap();
        assert_eq!(stats.cycles, 8);
        assert_eq!(stats.executed, 4);
        assert!((stats.cpi - 2.0).abs() < 1e-12);
        assert!((stats.throughput - 0.5).abs() < 1e-12);
        assert!((stats.speedup - 2.5).abs() < 1e-12);
        assert_eq!(stats.total_time_ps, 1600);
        assert!(stats.complete);
    }

    #[test]
    fn nothing_executed_is_an_error() {
        let err = stats_for("", CPUPolicy::default()).unwrap_err();
        assert!(matches!(err, SimulatorError::NoInstructionsExecuted));
    }

    #[test]
    fn partial_run_is_flagged() {
        let policy = CPUPolicy { cycle_limit: 6, ..CPUPolicy::default() };
        let stats = stats_for(
            "add $t0, $t1, $t2\nor $s0, $s1, $s2\nsub $a0, $a1, $a2",
            policy,
        )
        .unwrap();
        assert!(!stats.complete);
        assert_eq!(stats.executed, 2);
        assert!(stats.to_string().contains("cycle limit reached"));
    }
}
