//! Timing diagram output: colored console chart and CSV export

use std::fmt;
use std::io;
use std::path::Path;

use crate::error::SimulatorResult;
use crate::pipelined::pipeline::Stage;
use crate::pipelined::SimulationResult;
use crate::pipelined::TraceEntry;
use crate::stats::Statistics;

/// Cycles shown on the console; the CSV export has all of them
pub const DISPLAY_CYCLES: u64 = 50;

const LABEL_WIDTH: usize = 24;
const CELL_WIDTH: usize = 4;

const CLR_RESET: &str = "\x1b[0m";
const CLR_RED: &str = "\x1b[31m";
const CLR_GREEN: &str = "\x1b[32m";
const CLR_YELLOW: &str = "\x1b[33m";
const CLR_BLUE: &str = "\x1b[34m";
const CLR_MAGENTA: &str = "\x1b[35m";
const CLR_CYAN: &str = "\x1b[36m";
const CLR_BOLD: &str = "\x1b[1m";

fn stage_color(stage: Stage) -> &'static str {
    match stage {
        Stage::Fetch => CLR_BLUE,
        Stage::Decode => CLR_YELLOW,
        Stage::Execute => CLR_MAGENTA,
        Stage::Memory => CLR_CYAN,
        Stage::WriteBack => CLR_GREEN,
    }
}

/// Text of one diagram cell: the stage entered in `cycle`, `--` while
/// stalled in ID, otherwise empty
pub fn cell(entry: &TraceEntry, cycle: u64) -> &'static str {
    match entry.cycles.stage_at(cycle) {
        Some(stage) => stage.label(),
        None if entry.cycles.held_in_decode(cycle) => "--",
        None => "",
    }
}

fn row_label(result: &SimulationResult, entry: &TraceEntry) -> String {
    let text = &result.instruction(entry).text;
    if entry.flushed {
        format!("{} (flushed)", text)
    } else {
        text.clone()
    }
}

/// Console timing diagram; `Display` writes it
pub struct Chart<'a> {
    pub result: &'a SimulationResult,
    pub statistics: Option<&'a Statistics>,
    pub color: bool,
}

impl<'a> Chart<'a> {
    fn paint(&self, f: &mut fmt::Formatter<'_>, code: &str, text: &str) -> fmt::Result {
        if self.color && !text.trim().is_empty() {
            write!(f, "{}{}{}", code, text, CLR_RESET)
        } else {
            f.write_str(text)
        }
    }
}

impl fmt::Display for Chart<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let shown = result.cycles.min(DISPLAY_CYCLES);

        self.paint(f, CLR_BOLD, "MIPS Pipeline Simulation")?;
        write!(
            f,
            "\nInstructions: {} | Cycles: {}",
            result.program.len(),
            result.cycles
        )?;
        if result.cycles > DISPLAY_CYCLES {
            write!(f, " (showing first {})", DISPLAY_CYCLES)?;
        }
        writeln!(f, "\n")?;

        write!(f, "{:<LABEL_WIDTH$}", "Instruction")?;
        for cycle in 0..shown {
            write!(f, "{:<CELL_WIDTH$}", cycle)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(LABEL_WIDTH + CELL_WIDTH * shown as usize))?;

        for entry in &result.trace {
            let mut label = row_label(result, entry);
            label.truncate(LABEL_WIDTH - 2);
            write!(f, "{:<LABEL_WIDTH$}", label)?;
            for cycle in 0..shown {
                let text = format!("{:<CELL_WIDTH$}", cell(entry, cycle));
                match entry.cycles.stage_at(cycle) {
                    Some(stage) => self.paint(f, stage_color(stage), &text)?,
                    None => f.write_str(&text)?,
                }
            }
            writeln!(f)?;
        }

        write!(f, "{:<LABEL_WIDTH$}", "EVENTS")?;
        for cycle in 0..shown {
            let mark = if result.events.contains_key(&cycle) { "!" } else { "" };
            self.paint(f, CLR_RED, &format!("{:<CELL_WIDTH$}", mark))?;
        }
        writeln!(f, "\n")?;

        self.paint(f, CLR_BOLD, "Statistics:")?;
        writeln!(f)?;
        match self.statistics {
            Some(stats) => writeln!(f, "{}", stats)?,
            None => writeln!(f, "No instructions executed")?,
        }

        writeln!(f)?;
        self.paint(f, CLR_BOLD, "Pipeline Events:")?;
        for (cycle, event) in &result.events {
            write!(f, "\nCycle {}: {}", cycle, event)?;
        }
        Ok(())
    }
}

/// Writes the full diagram, the event row and the statistics to `path`
pub fn export_csv(
    path: &Path,
    result: &SimulationResult,
    statistics: Option<&Statistics>,
) -> SimulatorResult<()> {
    let file = std::fs::File::create(path)?;
    write_csv(file, result, statistics)
}

pub fn write_csv<W: io::Write>(
    sink: W,
    result: &SimulationResult,
    statistics: Option<&Statistics>,
) -> SimulatorResult<()> {
    // Statistics rows are shorter than diagram rows
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(sink);

    let mut header = vec!["Instruction".to_string()];
    header.extend((0..result.cycles).map(|cycle| format!("C{}", cycle)));
    writer.write_record(&header)?;

    for entry in &result.trace {
        let mut row = vec![row_label(result, entry)];
        row.extend((0..result.cycles).map(|cycle| cell(entry, cycle).to_string()));
        writer.write_record(&row)?;
    }

    let mut events = vec!["EVENTS".to_string()];
    events.extend((0..result.cycles).map(|cycle| {
        result.events.get(&cycle).map(|event| event.to_string()).unwrap_or_default()
    }));
    writer.write_record(&events)?;

    writer.write_record([""])?;
    let executed = result.executed().to_string();
    writer.write_record(["Total Cycles", &result.cycles.to_string()])?;
    writer.write_record(["Executed Instructions", &executed])?;
    match statistics {
        Some(stats) => {
            writer.write_record(["CPI", &format!("{:.3}", stats.cpi)])?;
            writer.write_record([
                "Throughput (instr/cycle)",
                &format!("{:.3}", stats.throughput),
            ])?;
            writer.write_record(["Speedup", &format!("{:.3}", stats.speedup)])?;
            writer
                .write_record(["Total Time (ps)", &stats.total_time_ps.to_string()])?;
        }
        None => writer.write_record(["CPI", "No instructions executed"])?,
    }
    if !result.is_complete() {
        writer.write_record(["Status", "Cycle limit reached"])?;
    }

    writer.flush()?;
    Ok(())
}
