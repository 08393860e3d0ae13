//! Static branch predictor
//! plus the policy that decides how a branch actually resolves

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::instruction::Instruction;

/// Prediction table keyed by instruction address.
///
/// The first lookup of an address predicts not taken and records that
/// prediction; every later lookup returns the recorded value. Resolution
/// never writes back into the table.
#[derive(Clone, Debug, Default)]
pub struct BranchPredictor {
    table: BTreeMap<u32, bool>,
}

impl BranchPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn predict(&mut self, pc: u32) -> bool {
        *self.table.entry(pc).or_insert(false)
    }

    /// Pre-loads a prediction, e.g. from an earlier session
    pub fn seed(&mut self, pc: u32, taken: bool) {
        self.table.insert(pc, taken);
    }

    pub fn recorded(&self, pc: u32) -> Option<bool> {
        self.table.get(&pc).copied()
    }
}

/// Decides the actual outcome of a branch or jump in EX.
/// Must be deterministic.
pub trait BranchEvaluator: Debug {
    fn evaluate(&self, inst: &Instruction) -> bool;
}

/// Register values are not modelled, so everything resolves as taken
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysTaken;

impl BranchEvaluator for AlwaysTaken {
    fn evaluate(&self, _inst: &Instruction) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NeverTaken;

impl BranchEvaluator for NeverTaken {
    fn evaluate(&self, _inst: &Instruction) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_lookup_records_not_taken() {
        let mut predictor = BranchPredictor::new();
        assert_eq!(predictor.recorded(8), None);
        assert!(!predictor.predict(8));
        assert_eq!(predictor.recorded(8), Some(false));
    }

    #[test]
    fn seeded_prediction_sticks() {
        let mut predictor = BranchPredictor::new();
        predictor.seed(12, true);
        assert!(predictor.predict(12));
        assert!(predictor.predict(12));
        assert!(!predictor.predict(16));
    }
}
