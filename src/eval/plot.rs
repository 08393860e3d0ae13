use std::path::Path;

use plotters::prelude::*;
use sim_lib::cpu::CPUPolicy;
use sim_lib::loader;
use sim_lib::run_wrapper::sweep;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let param_tokens: Vec<String> = std::env::args().skip(1).collect();
    if param_tokens.is_empty() {
        return Err("You should specify at least one program file".into());
    }

    // CPI of every mitigation combination, one series per program
    let labels: Vec<String> = CPUPolicy::sweep().iter().map(CPUPolicy::label).collect();
    let mut data: Vec<(String, Vec<(i32, f64)>)> = Vec::new();
    let mut y_max: f64 = 0.;
    for program_path in &param_tokens {
        let program = loader::load_program(Path::new(program_path))?;
        let points: Vec<(i32, f64)> = sweep(&program)
            .into_iter()
            .enumerate()
            .filter_map(|(i, (_, run))| run.statistics.map(|stats| (i as i32, stats.cpi)))
            .collect();
        for (_, cpi) in &points {
            y_max = y_max.max(*cpi);
        }
        let name = Path::new(program_path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| program_path.clone());
        data.push((name, points));
    }
    if y_max == 0. {
        return Err("No program executed any instruction".into());
    }

    // Plot the data
    std::fs::create_dir_all("eval")?;
    let output_path = "eval/plot_eval.svg";
    let root = SVGBackend::new(output_path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_formatter = |x: &i32| labels.get(*x as usize).cloned().unwrap_or_default();
    let mut ctx = ChartBuilder::on(&root)
        .caption("CPI per mitigation set", ("sans-serif", 40).into_font())
        .margin(5)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0..7, 0.0..y_max * 1.1)?;
    ctx.configure_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&x_formatter)
        .x_desc("Mitigations")
        .y_desc("CPI")
        .draw()?;

    for (i, (name, points)) in data.into_iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        ctx.draw_series(LineSeries::new(points, color))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    ctx.configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    eprintln!("Plot written to {}", output_path);
    Ok(())
}
