use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use focusclock_core::{Config, Mode, ModeSequencer};

#[derive(Args)]
pub struct SequenceArgs {
    /// Number of intervals to list
    #[arg(short = 'n', long, default_value_t = 8)]
    pub count: usize,
    /// Mode the sequence starts from
    #[arg(long, value_parser = super::parse_mode, default_value = "pomodoro")]
    pub from: Mode,
    /// Work intervals already completed before the first listed one
    #[arg(long, default_value_t = 0)]
    pub cycles: u64,
    /// Preset file to read instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Row {
    pub mode: Mode,
    pub minutes: u32,
}

/// `from` followed by the modes the sequencer would pick after it.
pub fn rows(config: &Config, from: Mode, cycles: u64, count: usize) -> Vec<Row> {
    std::iter::once(from)
        .chain(ModeSequencer::preview(from, cycles))
        .take(count)
        .map(|mode| Row {
            mode,
            minutes: config.minutes_for(mode),
        })
        .collect()
}

pub fn run(args: SequenceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(args.config.as_deref())?;
    let rows = rows(&config, args.from, args.cycles, args.count);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for (i, row) in rows.iter().enumerate() {
        println!("{:>2}. {:<11} {:>2} min", i + 1, row.mode.display_name(), row.minutes);
    }
    Ok(())
}
