//! Simulation context shared by every stage of one run

use crate::pipelined::branch_predictor::AlwaysTaken;
use crate::pipelined::branch_predictor::BranchEvaluator;
use crate::pipelined::branch_predictor::BranchPredictor;
use crate::scheduler::ReorderHeuristic;

/// Hard cycle ceiling of a run unless configured otherwise
pub const DEFAULT_CYCLE_LIMIT: u64 = 1000;

/// Run context. Owns the prediction table, so independent contexts never
/// share predictions while runs on the same context do.
#[derive(Debug)]
pub struct CPUState {
    /// CPU policy
    pub policy: CPUPolicy,

    /// Recorded predictions by address
    pub branch_predictor: BranchPredictor,

    /// Actual branch outcome at EX
    pub evaluator: Box<dyn BranchEvaluator>,
}

impl CPUState {
    pub fn make(policy: CPUPolicy) -> Self {
        Self::with_evaluator(policy, AlwaysTaken)
    }

    pub fn with_evaluator(
        policy: CPUPolicy,
        evaluator: impl BranchEvaluator + 'static,
    ) -> Self {
        Self {
            policy,
            branch_predictor: BranchPredictor::new(),
            evaluator: Box::new(evaluator),
        }
    }
}

/// CPU policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CPUPolicy {
    pub verbose: bool,
    pub history: bool,

    /// Speculative fetch past branches using the prediction table
    pub prediction: bool,
    /// Bypass results to EX instead of waiting for writeback
    pub forwarding: bool,
    /// Static reordering before the run
    pub reordering: bool,
    pub reorder_heuristic: ReorderHeuristic,

    pub cycle_limit: u64,
}

impl Default for CPUPolicy {
    fn default() -> Self {
        Self {
            verbose: false,
            history: false,
            prediction: true,
            forwarding: true,
            reordering: true,
            reorder_heuristic: ReorderHeuristic::default(),
            cycle_limit: DEFAULT_CYCLE_LIMIT,
        }
    }
}

impl CPUPolicy {
    pub fn with_mitigations(
        prediction: bool,
        forwarding: bool,
        reordering: bool,
    ) -> Self {
        Self { prediction, forwarding, reordering, ..Self::default() }
    }

    /// All eight on/off combinations of the three mitigations
    pub fn sweep() -> Vec<Self> {
        (0..8u8)
            .map(|bits| {
                Self::with_mitigations(bits & 4 != 0, bits & 2 != 0, bits & 1 != 0)
            })
            .collect()
    }

    /// Short tag such as `BP+FWD` or `none`
    pub fn label(&self) -> String {
        let parts: Vec<&str> = [
            (self.prediction, "BP"),
            (self.forwarding, "FWD"),
            (self.reordering, "REORD"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, tag)| *tag)
        .collect();

        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join("+")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_covers_every_combination() {
        let sweep = CPUPolicy::sweep();
        assert_eq!(sweep.len(), 8);
        assert_eq!(sweep[0].label(), "none");
        assert_eq!(sweep[7].label(), "BP+FWD+REORD");
        assert_eq!(sweep[2].label(), "FWD");
    }
}
