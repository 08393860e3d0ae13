//! Static instruction reordering ahead of simulation.
//!
//! A single greedy forward pass: for each instruction still waiting to be
//! placed, every later instruction that is independent of it (and of every
//! waiting instruction in between) is hoisted in front of it, in original
//! order. Instructions that depend on each other never swap places.

use log::debug;

use crate::dependency;
use crate::instruction::Instruction;

/// Which register relations block a hoist
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReorderHeuristic {
    /// Any shared register, read or write, is a barrier
    #[default]
    Conservative,
    /// Only RAW, WAR and WAW relations are barriers
    HazardAware,
}

impl ReorderHeuristic {
    /// Whether `later` may be moved above `earlier`
    fn independent(self, earlier: &Instruction, later: &Instruction) -> bool {
        match self {
            ReorderHeuristic::Conservative => {
                !dependency::shares_register(earlier, later)
            }
            ReorderHeuristic::HazardAware => !dependency::ordered(earlier, later),
        }
    }
}

/// Returns the program in its new fetch order
pub fn reorder(
    program: &[Instruction],
    heuristic: ReorderHeuristic,
) -> Vec<Instruction> {
    let mut placed = vec![false; program.len()];
    let mut order: Vec<usize> = Vec::with_capacity(program.len());

    for i in 0..program.len() {
        if placed[i] {
            continue;
        }

        // Waiting instructions that stay behind the hoisted ones
        let mut barriers = vec![i];
        for j in i + 1..program.len() {
            if placed[j] {
                continue;
            }
            let free = barriers
                .iter()
                .all(|&k| heuristic.independent(&program[k], &program[j]));
            if free {
                debug!(
                    "Hoisting '{}' above '{}'",
                    program[j].text, program[i].text
                );
                order.push(j);
                placed[j] = true;
            } else {
                barriers.push(j);
            }
        }

        order.push(i);
        placed[i] = true;
    }

    order.into_iter().map(|k| program[k].clone()).collect()
}
