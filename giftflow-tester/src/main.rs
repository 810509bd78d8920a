mod reports;
mod scenarios;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use scenarios::{ScenarioResult, ScenarioRunner, list_scenarios, select_scenarios};

#[derive(Debug, Parser)]
#[command(name = "giftflow-tester", version)]
#[command(about = "Drive the Giftflow core through scripted sessions and report the outcome")]
struct Args {
    /// Scenarios to run (comma-separated, `all` for the whole catalog)
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Iterations per scenario
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Report format
    #[arg(long, default_value = "console", value_parser = ["console", "json", "markdown"])]
    report: String,

    /// Print per-iteration progress
    #[arg(short, long)]
    verbose: bool,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    let selected = select_scenarios(&args.scenarios)?;
    let machine_readable = args.report != "console" && args.output.is_none();
    if !machine_readable {
        announce_banner();
    }

    let start_time = Instant::now();
    let runner = ScenarioRunner::new(args.verbose && !machine_readable);
    let results: Vec<ScenarioResult> = selected
        .iter()
        .map(|scenario| runner.run(scenario, args.iterations))
        .collect();
    log::info!(
        "Ran {} scenarios x {} iterations in {:?}",
        results.len(),
        args.iterations,
        start_time.elapsed()
    );

    write_report(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎁 Giftflow Scenario Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn write_report(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(output_target.writer(), results)?,
        "markdown" => {
            reports::generate_markdown_report(output_target.writer(), results, chrono::Utc::now())?;
        }
        _ => {
            reports::generate_console_report(output_target.writer(), results, start_time.elapsed())?;
            writeln!(output_target.writer())?;
            writeln!(output_target.writer(), "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
