use std::io;
use std::io::IsTerminal;
use std::io::Read;
use std::process;

use log::info;
use log::LevelFilter;
use sim_lib::cpu::CPUState;
use sim_lib::error::SimulatorResult;
use sim_lib::flags::PipesimArgs;
use sim_lib::loader;
use sim_lib::prompt;
use sim_lib::report;
use sim_lib::run_wrapper;

fn main() {
    let args = PipesimArgs::from_env_or_exit();
    if let Err(e) = run_sim(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_sim(args: &PipesimArgs) -> SimulatorResult<()> {
    let mut policy = args.policy()?;

    // RUST_LOG still wins over the flag
    env_logger::Builder::new()
        .filter_level(if policy.verbose { LevelFilter::Debug } else { LevelFilter::Warn })
        .parse_default_env()
        .init();

    if args.interactive {
        let mut input = io::stdin().lock().bytes().map_while(Result::ok);
        prompt::configure(&mut policy, &mut input, &mut io::stdout())?;
    }
    info!("Running with {}", policy.label());

    let program = loader::load_program(&args.program)?;
    let mut cpu = CPUState::make(policy);
    let run = run_wrapper::simulate(&mut cpu, &program);

    let chart = report::Chart {
        result: &run.result,
        statistics: run.statistics.as_ref(),
        color: io::stdout().is_terminal(),
    };
    println!("{}", chart);

    if let Some(path) = &args.output {
        report::export_csv(path, &run.result, run.statistics.as_ref())?;
        println!("\nTiming diagram exported to {}", path.display());
    }

    Ok(())
}
