//! Sample programs under every mitigation combination

use std::path::PathBuf;

use rstest::rstest;
use sim_lib::cpu::CPUPolicy;
use sim_lib::loader::load_program;
use sim_lib::report;
use sim_lib::run_wrapper;

fn program_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("programs").join(name)
}

#[rstest]
#[case("independent.asm", 5)]
#[case("load-use.asm", 7)]
#[case("branchy.asm", 7)]
#[case("mixed.asm", 9)]
fn sweep_retires_every_instruction(#[case] name: &str, #[case] count: u64) {
    let program = load_program(&program_path(name)).unwrap();
    assert_eq!(program.len() as u64, count);

    for (policy, run) in run_wrapper::sweep(&program) {
        let stats = run.statistics.unwrap();
        assert!(stats.complete, "{} under {}", name, policy.label());
        assert_eq!(stats.executed, count, "{} under {}", name, policy.label());
    }
}

#[test]
fn mitigations_never_slow_down_load_use() {
    let program = load_program(&program_path("load-use.asm")).unwrap();
    let reports = run_wrapper::sweep(&program);
    let cycles = |policy: CPUPolicy| {
        reports
            .iter()
            .find(|(p, _)| *p == policy)
            .map(|(_, run)| run.result.cycles)
            .unwrap()
    };

    let none = cycles(CPUPolicy::with_mitigations(false, false, false));
    let forwarding = cycles(CPUPolicy::with_mitigations(false, true, false));
    assert!(forwarding < none);
}

#[test]
fn run_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("mixed.csv");

    let run = run_wrapper::run(&program_path("mixed.asm"), CPUPolicy::default()).unwrap();
    report::export_csv(&csv_path, &run.result, run.statistics.as_ref()).unwrap();

    let text = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(text.lines().count(), run.result.trace.len() + 9);
    assert!(text.contains("Executed Instructions,9"));
}

#[test]
fn missing_program_is_reported() {
    let err = run_wrapper::run(&program_path("does-not-exist.asm"), CPUPolicy::default())
        .unwrap_err();
    assert!(err.to_string().contains("does-not-exist.asm"));
}
