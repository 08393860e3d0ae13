use std::path::Path;
use std::process;

use sim_lib::error::SimulatorResult;
use sim_lib::loader;
use sim_lib::run_wrapper::sweep;

const PROGRAMS: [&str; 4] = ["independent", "load-use", "branchy", "mixed"];

fn main() {
    if let Err(e) = run_eval() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_eval() -> SimulatorResult<()> {
    let output_path = Path::new("eval/sim_eval.csv");
    if let Some(dir) = output_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut writer = csv::Writer::from_path(output_path)?;

    writer.write_record([
        "Program",
        "Configuration",
        "Cycles",
        "Executed",
        "CPI",
        "Throughput",
        "Speedup",
        "Data stalls",
        "Control stalls",
        "Mispredictions",
    ])?;

    for program in PROGRAMS {
        let program_path = format!("programs/{}.asm", program);
        eprintln!("Running program: {}", program_path);

        let instructions = match loader::load_program(Path::new(&program_path)) {
            Ok(instructions) => instructions,
            Err(e) => {
                eprintln!("Warning: Failed to run program '{}': {}", program, e);
                writer.write_record([program, "Error"])?;
                continue;
            }
        };

        for (policy, run) in sweep(&instructions) {
            let label = policy.label();
            match run.statistics {
                Some(stats) => writer.write_record([
                    program,
                    &label,
                    &stats.cycles.to_string(),
                    &stats.executed.to_string(),
                    &format!("{:.3}", stats.cpi),
                    &format!("{:.3}", stats.throughput),
                    &format!("{:.3}", stats.speedup),
                    &stats.data_stall_cycles.to_string(),
                    &stats.control_stall_cycles.to_string(),
                    &stats.mispredictions.to_string(),
                ])?,
                None => writer.write_record([program, &label, "0", "0"])?,
            }
        }
    }

    writer.flush()?;
    eprintln!("Results written to {}", output_path.display());
    Ok(())
}
