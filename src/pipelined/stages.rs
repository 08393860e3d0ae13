//! The steps of one pipeline cycle, in the order the engine runs them

use log::debug;

use super::pipeline::Stage;
use super::PipelineEvent;
use super::SimulationState;
use super::TraceEntry;
use crate::cpu::CPUPolicy;
use crate::cpu::CPUState;
use crate::dependency;
use crate::instruction::Instruction;

/// Stall length when neither forwarding nor reordering is available
pub const UNMITIGATED_STALL_CYCLES: u32 = 2;
/// Stall length otherwise; the hazard is re-checked afterwards
pub const STALL_CYCLES: u32 = 1;

/// WB stage: retires the instruction that sat in WB last cycle
pub fn write_back(program: &[Instruction], state: &mut SimulationState) {
    let Some(id) = state.pipeline.wb_slot else {
        return;
    };

    let entry = &mut state.trace[id];
    entry.completed = true;
    let index = entry.index;
    state.retired += 1;

    // Only the latest writer of a register owns its entry
    if let Some(rd) = &program[index].rd {
        if state.pending_writers.get(rd) == Some(&id) {
            state.pending_writers.remove(rd);
        }
    }
}

/// Moves every instruction one stage ahead, or freezes IF/ID behind a
/// bubble while a stall is being served
pub fn advance(state: &mut SimulationState) {
    state.pipeline = if state.hold > 0 {
        state.hold -= 1;
        state.history.data_stall_cycles += 1;
        state.pipeline.advance_stalled()
    } else {
        state.pipeline.advance()
    };
}

/// ID stage: RAW check of the decoding instruction against EX and MEM.
/// Returns whether the front end is stalled this cycle.
pub fn detect_data_hazard(
    policy: &CPUPolicy,
    program: &[Instruction],
    state: &mut SimulationState,
) -> bool {
    // Still inside a fixed stall window; nothing is re-checked
    if state.hold > 0 {
        return true;
    }

    let Some(id) = state.pipeline.id_slot else {
        return false;
    };
    let consumer = &program[state.trace[id].index];

    // With forwarding only a load directly ahead (now in EX) must wait
    let stalls_on = |slot: Option<usize>, in_ex: bool| {
        slot.is_some_and(|producer_id| {
            let producer = &program[state.trace[producer_id].index];
            dependency::raw_hazard(producer, consumer)
                && (!policy.forwarding || (in_ex && producer.is_load()))
        })
    };
    let hazard = stalls_on(state.pipeline.ex_slot, true)
        || stalls_on(state.pipeline.mem_slot, false);
    if !hazard {
        return false;
    }

    let event = if !policy.forwarding && !policy.reordering {
        state.hold = UNMITIGATED_STALL_CYCLES;
        PipelineEvent::UnmitigatedDataHazardStall
    } else {
        state.hold = STALL_CYCLES;
        PipelineEvent::DataHazardStall
    };
    debug!(
        "Cycle {}: '{}' stalls {} cycle(s) in ID",
        state.cycle, consumer.text, state.hold
    );
    state.events.insert(state.cycle, event);
    true
}

/// EX stage: resolves a branch or jump against its prediction.
/// Returns whether IF/ID were flushed this cycle.
pub fn resolve_branch(
    cpu: &CPUState,
    program: &[Instruction],
    state: &mut SimulationState,
) -> bool {
    let Some(id) = state.pipeline.ex_slot else {
        return false;
    };
    let entry = state.trace[id];
    let inst = &program[entry.index];

    // Without prediction nothing was fetched past the branch
    if !inst.is_control() || !cpu.policy.prediction {
        return false;
    }

    let actual = cpu.evaluator.evaluate(inst);
    if actual == entry.predicted_taken {
        debug!("Cycle {}: '{}' predicted correctly", state.cycle, inst.text);
        return false;
    }

    state.history.mispredictions += 1;
    let squashed = [state.pipeline.if_slot.take(), state.pipeline.id_slot.take()];
    for flushed_id in squashed.into_iter().flatten() {
        state.trace[flushed_id].flushed = true;
        state.history.flushed += 1;
        debug!(
            "Cycle {}: flushing '{}'",
            state.cycle, program[state.trace[flushed_id].index].text
        );
    }
    // A stalled instruction in ID is gone, so is its stall
    state.hold = 0;
    // Not-taken outcomes restart here too, so the flushed instructions are refetched
    state.next_fetch = entry.index + 1;
    state.events.insert(state.cycle, PipelineEvent::BranchMisprediction);
    true
}

/// IF stage
pub fn instruction_fetch(
    cpu: &mut CPUState,
    program: &[Instruction],
    state: &mut SimulationState,
    blocked: bool,
) {
    if blocked || state.pipeline.if_slot.is_some() {
        return;
    }
    let Some(inst) = program.get(state.next_fetch) else {
        return;
    };

    if !cpu.policy.prediction && control_unresolved(program, state) {
        state.history.control_stall_cycles += 1;
        state
            .events
            .entry(state.cycle)
            .or_insert(PipelineEvent::ControlHazardStall);
        return;
    }

    let predicted_taken = cpu.policy.prediction
        && inst.is_control()
        && cpu.branch_predictor.predict(inst.address);

    let id = state.trace.len();
    state
        .trace
        .push(TraceEntry::fetched(state.next_fetch, state.cycle, predicted_taken));
    state.pipeline.if_slot = Some(id);
    state.next_fetch += 1;
}

/// A branch or jump still waiting in ID or EX
fn control_unresolved(program: &[Instruction], state: &SimulationState) -> bool {
    [state.pipeline.id_slot, state.pipeline.ex_slot]
        .into_iter()
        .flatten()
        .any(|id| program[state.trace[id].index].is_control())
}

/// Stamps stage entry cycles for whatever occupies ID, EX, MEM and WB
pub fn record_stages(program: &[Instruction], state: &mut SimulationState) {
    let cycle = state.cycle;
    let pipeline = state.pipeline;

    if let Some(id) = pipeline.id_slot {
        state.trace[id].cycles.enter(Stage::Decode, cycle);
    }
    if let Some(id) = pipeline.ex_slot {
        enter_execute(program, state, id);
    }
    if let Some(id) = pipeline.mem_slot {
        state.trace[id].cycles.enter(Stage::Memory, cycle);
    }
    if let Some(id) = pipeline.wb_slot {
        state.trace[id].cycles.enter(Stage::WriteBack, cycle);
    }
}

fn enter_execute(program: &[Instruction], state: &mut SimulationState, id: usize) {
    state.trace[id].cycles.enter(Stage::Execute, state.cycle);
    let inst = &program[state.trace[id].index];

    // Operands whose producer has not retired arrive over the bypass
    for source in &inst.sources {
        if let Some(&writer) = state.pending_writers.get(source) {
            state.history.bypassed_operands += 1;
            debug!(
                "Cycle {}: {} bypassed from '{}' to '{}'",
                state.cycle, source, program[state.trace[writer].index].text, inst.text
            );
        }
    }

    if let Some(rd) = &inst.rd {
        state.pending_writers.insert(rd.clone(), id);
    }
}
