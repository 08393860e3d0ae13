use std::path::PathBuf;
use std::str::FromStr;

use crate::cpu::CPUPolicy;
use crate::error::SimulatorError;
use crate::error::SimulatorResult;
use crate::scheduler::ReorderHeuristic;

xflags::xflags! {
    /// MIPS 5-stage pipeline timing simulator.
    cmd PipesimArgs {
        /// Path to the assembly program to simulate.
        required program: PathBuf

        /// Disables branch prediction; fetch waits for every branch to resolve.
        optional --no-prediction

        /// Disables forwarding; consumers wait for the producer to leave MEM.
        optional --no-forwarding

        /// Disables static instruction reordering.
        optional --no-reordering

        /// Specifies the reordering rule.
        /// C: Any shared register blocks a move (default)
        /// H: Only RAW/WAR/WAW dependencies block a move
        optional -r, --reorder-rule rule: ReorderArg

        /// Stops the run after this many cycles (default 1000).
        optional -c, --cycle-limit limit: u64

        /// Writes the timing diagram and statistics to a CSV file.
        optional -o, --output path: PathBuf

        /// Asks for each mitigation toggle on stdin before running.
        optional -i, --interactive

        /// Enables history module, printing the statistics block to stderr.
        optional --history

        /// Enables verbose mode, logging every pipeline cycle.
        optional -v, --verbose
    }
}

#[derive(Debug)]
pub enum ReorderArg {
    Conservative,
    HazardAware,
}

impl FromStr for ReorderArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "C" => Ok(ReorderArg::Conservative),
            "H" => Ok(ReorderArg::HazardAware),
            _ => Err(format!("Invalid reorder rule: '{}'. Expected 'C' or 'H'.", s)),
        }
    }
}

impl From<&ReorderArg> for ReorderHeuristic {
    fn from(val: &ReorderArg) -> Self {
        match val {
            ReorderArg::Conservative => ReorderHeuristic::Conservative,
            ReorderArg::HazardAware => ReorderHeuristic::HazardAware,
        }
    }
}

impl PipesimArgs {
    /// Policy described by the command line
    pub fn policy(&self) -> SimulatorResult<CPUPolicy> {
        let mut policy = CPUPolicy {
            verbose: self.verbose,
            history: self.history,
            prediction: !self.no_prediction,
            forwarding: !self.no_forwarding,
            reordering: !self.no_reordering,
            ..CPUPolicy::default()
        };

        if let Some(rule) = &self.reorder_rule {
            policy.reorder_heuristic = rule.into();
        }
        if let Some(limit) = self.cycle_limit {
            if limit == 0 {
                return Err(SimulatorError::ConfigError(
                    "cycle limit must be positive".to_string(),
                ));
            }
            policy.cycle_limit = limit;
        }

        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    fn parse(args: &[&str]) -> PipesimArgs {
        PipesimArgs::from_vec(args.iter().map(OsString::from).collect()).unwrap()
    }

    #[test]
    fn defaults_enable_every_mitigation() {
        let args = parse(&["programs/mixed.asm"]);
        assert_eq!(args.policy().unwrap(), CPUPolicy::default());
        assert!(args.output.is_none());
    }

    #[test]
    fn toggles_and_options() {
        let args = parse(&[
            "prog.asm",
            "--no-forwarding",
            "--no-prediction",
            "-r",
            "h",
            "-c",
            "42",
            "-o",
            "out.csv",
        ]);
        let policy = args.policy().unwrap();
        assert!(!policy.prediction);
        assert!(!policy.forwarding);
        assert!(policy.reordering);
        assert_eq!(policy.reorder_heuristic, ReorderHeuristic::HazardAware);
        assert_eq!(policy.cycle_limit, 42);
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn zero_cycle_limit_is_rejected() {
        let args = parse(&["prog.asm", "--cycle-limit", "0"]);
        assert!(matches!(args.policy(), Err(SimulatorError::ConfigError(_))));
    }

    #[test]
    fn unknown_reorder_rule() {
        assert!("X".parse::<ReorderArg>().is_err());
    }
}
