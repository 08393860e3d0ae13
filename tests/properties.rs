//! Randomised checks over generated programs and policies

use proptest::prelude::*;
use sim_lib::cpu::CPUPolicy;
use sim_lib::cpu::CPUState;
use sim_lib::dependency;
use sim_lib::instruction::Instruction;
use sim_lib::loader::parse_program;
use sim_lib::pipelined;
use sim_lib::scheduler::reorder;
use sim_lib::scheduler::ReorderHeuristic;
use sim_lib::stats::Statistics;

// A small register pool keeps dependencies frequent
fn register() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["$t0", "$t1", "$t2", "$t3", "$s0"])
}

fn instruction_line() -> impl Strategy<Value = String> {
    prop_oneof![
        (register(), register(), register())
            .prop_map(|(d, a, b)| format!("add {}, {}, {}", d, a, b)),
        (register(), register(), register())
            .prop_map(|(d, a, b)| format!("sub {}, {}, {}", d, a, b)),
        (register(), register()).prop_map(|(d, b)| format!("lw {}, 0({})", d, b)),
        (register(), register()).prop_map(|(v, b)| format!("sw {}, 4({})", v, b)),
        (register(), register()).prop_map(|(a, b)| format!("beq {}, {}, 8", a, b)),
        Just("j 0".to_string()),
        Just("nop".to_string()),
    ]
}

fn program(max_len: usize) -> impl Strategy<Value = Vec<Instruction>> {
    prop::collection::vec(instruction_line(), 1..max_len)
        .prop_map(|lines| parse_program(&lines.join("\n")))
}

fn policy() -> impl Strategy<Value = CPUPolicy> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(prediction, forwarding, reordering, hazard_aware)| CPUPolicy {
            reorder_heuristic: if hazard_aware {
                ReorderHeuristic::HazardAware
            } else {
                ReorderHeuristic::Conservative
            },
            ..CPUPolicy::with_mitigations(prediction, forwarding, reordering)
        },
    )
}

/// Position of each original instruction in `reordered`, by address
fn positions(original: &[Instruction], reordered: &[Instruction]) -> Vec<usize> {
    original
        .iter()
        .map(|inst| {
            reordered
                .iter()
                .position(|other| other.address == inst.address)
                .expect("instruction lost by reorder")
        })
        .collect()
}

proptest! {
    #[test]
    fn conservative_reorder_keeps_sharing_pairs_in_order(program in program(12)) {
        let reordered = reorder(&program, ReorderHeuristic::Conservative);
        prop_assert_eq!(reordered.len(), program.len());

        let at = positions(&program, &reordered);
        for i in 0..program.len() {
            for j in i + 1..program.len() {
                if dependency::shares_register(&program[i], &program[j]) {
                    prop_assert!(at[i] < at[j], "{} moved above {}", program[j], program[i]);
                }
            }
        }
    }

    #[test]
    fn hazard_aware_reorder_keeps_dependent_pairs_in_order(program in program(12)) {
        let reordered = reorder(&program, ReorderHeuristic::HazardAware);
        let at = positions(&program, &reordered);
        for i in 0..program.len() {
            for j in i + 1..program.len() {
                if dependency::ordered(&program[i], &program[j]) {
                    prop_assert!(at[i] < at[j], "{} moved above {}", program[j], program[i]);
                }
            }
        }
    }

    #[test]
    fn every_instruction_retires_once(program in program(16), policy in policy()) {
        let mut cpu = CPUState::make(policy);
        let result = pipelined::run(&mut cpu, &program);

        prop_assert!(result.is_complete());
        prop_assert_eq!(result.executed(), program.len() as u64);
        for entry in &result.trace {
            prop_assert!(entry.completed != entry.flushed);
            if entry.completed {
                let c = entry.cycles;
                let stamps = [c.fetch, c.decode, c.execute, c.memory, c.write_back];
                prop_assert!(stamps.iter().all(Option::is_some));
                prop_assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]));
            }
        }
    }

    #[test]
    fn cpi_and_throughput_are_reciprocal(program in program(16), policy in policy()) {
        let mut cpu = CPUState::make(policy);
        let stats = Statistics::compute(&pipelined::run(&mut cpu, &program)).unwrap();
        prop_assert!((stats.cpi * stats.throughput - 1.0).abs() < 1e-9);
        prop_assert!(stats.cycles >= stats.executed + 4);
    }

    #[test]
    fn fresh_contexts_give_identical_runs(program in program(16), policy in policy()) {
        let first = pipelined::run(&mut CPUState::make(policy), &program);
        let second = pipelined::run(&mut CPUState::make(policy), &program);
        prop_assert_eq!(first, second);
    }
}
