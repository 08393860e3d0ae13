//! Pipelined implementation

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;

use log::debug;
use log::info;
use log::log_enabled;
use log::warn;
use log::Level;

use crate::cpu::CPUState;
use crate::instruction::Instruction;
use crate::instruction::Register;
use crate::pipelined::pipeline::PipelineState;
use crate::pipelined::pipeline::Stage;
use crate::scheduler;

pub mod branch_predictor;
pub mod pipeline;
pub mod stages;

/// Cycle in which an instruction entered each stage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageCycles {
    pub fetch: Option<u64>,
    pub decode: Option<u64>,
    pub execute: Option<u64>,
    pub memory: Option<u64>,
    pub write_back: Option<u64>,
}

impl StageCycles {
    pub fn get(&self, stage: Stage) -> Option<u64> {
        match stage {
            Stage::Fetch => self.fetch,
            Stage::Decode => self.decode,
            Stage::Execute => self.execute,
            Stage::Memory => self.memory,
            Stage::WriteBack => self.write_back,
        }
    }

    /// Stamps the first entry into `stage`; later calls keep the first stamp
    pub fn enter(&mut self, stage: Stage, cycle: u64) {
        let slot = match stage {
            Stage::Fetch => &mut self.fetch,
            Stage::Decode => &mut self.decode,
            Stage::Execute => &mut self.execute,
            Stage::Memory => &mut self.memory,
            Stage::WriteBack => &mut self.write_back,
        };
        slot.get_or_insert(cycle);
    }

    /// The stage entered in `cycle`, if any
    pub fn stage_at(&self, cycle: u64) -> Option<Stage> {
        Stage::ALL.into_iter().find(|&stage| self.get(stage) == Some(cycle))
    }

    /// Still sitting in ID during `cycle` because of a stall
    pub fn held_in_decode(&self, cycle: u64) -> bool {
        match (self.decode, self.execute) {
            (Some(decode), Some(execute)) => decode < cycle && cycle < execute,
            _ => false,
        }
    }
}

/// One fetch of a program instruction. A misprediction flush discards the
/// entry; the refetched instruction gets a fresh entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceEntry {
    /// Position in the (possibly reordered) program
    pub index: usize,
    /// Prediction taken at fetch; only meaningful for branches and jumps
    pub predicted_taken: bool,
    pub cycles: StageCycles,
    pub flushed: bool,
    pub completed: bool,
}

impl TraceEntry {
    fn fetched(index: usize, cycle: u64, predicted_taken: bool) -> Self {
        let mut cycles = StageCycles::default();
        cycles.enter(Stage::Fetch, cycle);
        Self { index, predicted_taken, cycles, flushed: false, completed: false }
    }
}

/// Classification of a cycle in the event log
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineEvent {
    DataHazardStall,
    /// Fixed two-cycle stall used when forwarding and reordering are off
    UnmitigatedDataHazardStall,
    /// Fetch held behind an unresolved branch (prediction off)
    ControlHazardStall,
    BranchMisprediction,
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineEvent::DataHazardStall => "STALL (Data Hazard)",
            PipelineEvent::UnmitigatedDataHazardStall => {
                "STALL (Data Hazard, FWD & REORD OFF)"
            }
            PipelineEvent::ControlHazardStall => "STALL (Control Hazard)",
            PipelineEvent::BranchMisprediction => "FLUSH (Branch Misprediction)",
        })
    }
}

/// At most one event per cycle, ordered by cycle
pub type EventLog = BTreeMap<u64, PipelineEvent>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationStatus {
    Completed,
    /// Ceiling hit before every instruction retired; statistics only
    /// describe the part that ran
    CycleLimitReached,
}

/// Counters kept while the pipeline runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineHistory {
    pub data_stall_cycles: u64,
    pub control_stall_cycles: u64,
    pub mispredictions: u64,
    pub flushed: u64,
    pub bypassed_operands: u64,
}

/// Mutable state of a single run
#[derive(Debug, Default)]
pub struct SimulationState {
    pub cycle: u64,
    pub pipeline: PipelineState,
    /// Register -> trace entry expected to produce it, from EX to retirement
    pub pending_writers: HashMap<Register, usize>,
    pub events: EventLog,
    /// Next program index to fetch
    pub next_fetch: usize,
    /// Cycles the front end stays frozen for a detected data hazard
    pub hold: u32,
    pub trace: Vec<TraceEntry>,
    pub retired: usize,
    pub history: PipelineHistory,
}

/// Everything a run produced
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationResult {
    /// Program in the order it was fetched
    pub program: Vec<Instruction>,
    pub trace: Vec<TraceEntry>,
    pub events: EventLog,
    /// Cycle index at which the run stopped
    pub cycles: u64,
    pub status: SimulationStatus,
    pub history: PipelineHistory,
}

impl SimulationResult {
    /// Retired (written back) instructions
    pub fn executed(&self) -> u64 {
        self.trace.iter().filter(|entry| entry.completed).count() as u64
    }

    pub fn instruction(&self, entry: &TraceEntry) -> &Instruction {
        &self.program[entry.index]
    }

    pub fn is_complete(&self) -> bool {
        self.status == SimulationStatus::Completed
    }
}

/// Runs `program` to completion or to the cycle ceiling
pub fn run(cpu: &mut CPUState, program: &[Instruction]) -> SimulationResult {
    let program = if cpu.policy.reordering {
        scheduler::reorder(program, cpu.policy.reorder_heuristic)
    } else {
        program.to_vec()
    };

    let mut state = SimulationState::default();

    let status = loop {
        stages::write_back(&program, &mut state);

        if state.retired == program.len() {
            break SimulationStatus::Completed;
        }
        if state.cycle >= cpu.policy.cycle_limit {
            warn!(
                "Cycle limit of {} reached with {} of {} instructions retired",
                cpu.policy.cycle_limit,
                state.retired,
                program.len()
            );
            break SimulationStatus::CycleLimitReached;
        }

        stages::advance(&mut state);
        let stalled = stages::detect_data_hazard(&cpu.policy, &program, &mut state);
        let flushed = stages::resolve_branch(cpu, &program, &mut state);
        stages::instruction_fetch(cpu, &program, &mut state, stalled || flushed);
        stages::record_stages(&program, &mut state);

        if log_enabled!(Level::Debug) {
            log_cycle(&program, &state);
        }

        state.cycle += 1;
    };

    info!(
        "Pipeline stopped at cycle {} ({:?}); {} fetched, {} retired, {} events",
        state.cycle,
        status,
        state.trace.len(),
        state.retired,
        state.events.len()
    );

    SimulationResult {
        program,
        trace: state.trace,
        events: state.events,
        cycles: state.cycle,
        status,
        history: state.history,
    }
}

fn log_cycle(program: &[Instruction], state: &SimulationState) {
    let occupancy: Vec<String> = Stage::ALL
        .into_iter()
        .map(|stage| {
            let text = match state.pipeline.slot(stage) {
                Some(id) => program[state.trace[id].index].text.as_str(),
                None => "-",
            };
            format!("{} [{}]", stage, text)
        })
        .collect();
    debug!("Cycle {}: {}", state.cycle, occupancy.join(" "));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CPUPolicy;
    use crate::loader::parse_program;

    fn simulate(source: &str, policy: CPUPolicy) -> SimulationResult {
        let mut cpu = CPUState::make(policy);
        run(&mut cpu, &parse_program(source))
    }

    #[test]
    fn single_instruction_walks_every_stage() {
        let result = simulate("add $t0, $t1, $t2", CPUPolicy::default());
        let cycles = result.trace[0].cycles;
        assert_eq!(cycles.fetch, Some(0));
        assert_eq!(cycles.decode, Some(1));
        assert_eq!(cycles.execute, Some(2));
        assert_eq!(cycles.memory, Some(3));
        assert_eq!(cycles.write_back, Some(4));
        assert_eq!(result.cycles, 5);
        assert!(result.is_complete());
    }

    #[test]
    fn empty_program_stops_immediately() {
        let result = simulate("# nothing\n", CPUPolicy::default());
        assert_eq!(result.cycles, 0);
        assert_eq!(result.executed(), 0);
        assert!(result.trace.is_empty());
    }

    #[test]
    fn held_decode_cycles_are_reported() {
        let policy = CPUPolicy::with_mitigations(false, false, false);
        let result =
            simulate("add $t0, $t1, $t2\nsub $t3, $t0, $t4", policy);
        let consumer = result.trace[1].cycles;
        assert_eq!(consumer.decode, Some(2));
        assert_eq!(consumer.execute, Some(5));
        assert!(consumer.held_in_decode(3));
        assert!(consumer.held_in_decode(4));
        assert!(!consumer.held_in_decode(5));
        assert_eq!(consumer.stage_at(2), Some(Stage::Decode));
    }

    #[test]
    fn ceiling_is_reported() {
        let policy = CPUPolicy { cycle_limit: 3, ..CPUPolicy::default() };
        let result = simulate("add $t0, $t1, $t2\nor $t3, $t4, $t5", policy);
        assert_eq!(result.status, SimulationStatus::CycleLimitReached);
        assert_eq!(result.cycles, 3);
        assert_eq!(result.executed(), 0);
    }
}
