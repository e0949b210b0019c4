//! paramtune CLI - Linux tuning parameter reconciliation
//!
//! Inspects, optimises, applies and reverts tuning parameters given on the
//! command line.

use clap::Parser;
use paramtune::config::{
    apply_overrides, parse_assignment, CliArgs, Commands, EngineConfig, OutputFormat,
};
use paramtune::error::{collect_errors, Result, TuneError};
use paramtune::param::Recommendation;
use paramtune::system::{LinuxHost, MemoryTotals};
use paramtune::tuning::{to_json, write_text, ParamReport, RunMode, Summary, Tuner};
use std::fs::File;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    if let Err(e) = init_logging(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        if e.is_permission_error() {
            eprintln!("Hint: writing tuning parameters usually requires root");
        }
        std::process::exit(1);
    }
}

fn init_logging(args: &CliArgs) -> Result<()> {
    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match &args.log_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| TuneError::io(path, e))?;
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn run(args: CliArgs) -> Result<()> {
    let config = EngineConfig::from_cli(&args)?;
    tracing::debug!("configuration: {:?}", config);

    let tuner = Tuner::new(LinuxHost::with_root(&config.root));
    let format = args.output_format;
    let overrides = &args.overrides;

    match &args.command {
        Commands::Inspect { names } => cmd_inspect(&tuner, names, format),
        Commands::Optimise { assignments } => {
            cmd_note(&tuner, &config, assignments, overrides, RunMode::Verify, format).map(|_| ())
        }
        Commands::Verify { assignments } => {
            let summary =
                cmd_note(&tuner, &config, assignments, overrides, RunMode::Verify, format)?;
            if summary.non_compliant > 0 || summary.failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Apply {
            assignments,
            dry_run,
        } => {
            let mode = if *dry_run {
                if format == OutputFormat::Text {
                    println!("=== Dry Run Mode ===");
                    println!("No parameters will be changed.");
                    println!();
                }
                RunMode::Verify
            } else {
                RunMode::Apply
            };
            let summary = cmd_note(&tuner, &config, assignments, overrides, mode, format)?;
            if summary.failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Revert { assignments } => cmd_revert(&tuner, assignments, format),
        Commands::Memory => cmd_memory(&tuner, format),
    }
}

fn parse_note(assignments: &[String]) -> Result<Vec<(String, Recommendation)>> {
    collect_errors(assignments.iter().map(|a| parse_assignment(a)).collect())
}

fn print_reports(reports: &[ParamReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_text(&mut out, reports).map_err(|e| TuneError::io("<stdout>", e))?;
        }
        OutputFormat::Json => println!("{}", to_json(reports)?),
    }
    Ok(())
}

fn cmd_inspect(tuner: &Tuner<LinuxHost>, names: &[String], format: OutputFormat) -> Result<()> {
    let mut reports = Vec::new();
    for name in names {
        for expanded in tuner.expand(name)? {
            let outcome = tuner.inspect(&expanded);
            reports.push(ParamReport {
                name: expanded,
                outcome,
            });
        }
    }
    print_reports(&reports, format)
}

fn cmd_note(
    tuner: &Tuner<LinuxHost>,
    config: &EngineConfig,
    assignments: &[String],
    overrides: &[String],
    mode: RunMode,
    format: OutputFormat,
) -> Result<Summary> {
    let note = apply_overrides(parse_note(assignments)?, overrides)?;
    let ctx = tuner
        .context(config.load_pagecache()?)?
        .with_tmpfs_percent(config.tmpfs_percent);

    let (ctx, reports) = tuner.run_note(&note, ctx, mode);
    tracing::debug!("final pagecache settings: {:?}", ctx.pagecache);

    print_reports(&reports, format)?;
    Ok(Summary::of(&reports))
}

fn cmd_revert(tuner: &Tuner<LinuxHost>, assignments: &[String], format: OutputFormat) -> Result<()> {
    let previous = parse_note(assignments)?;

    let mut results = Vec::new();
    let mut rows = Vec::new();
    for (name, recommendation) in &previous {
        let result = tuner.apply(name, &recommendation.value, true);
        rows.push(serde_json::json!({
            "name": name,
            "value": recommendation.value.to_string(),
            "error": result.as_ref().err().map(|e| e.to_string()),
        }));
        if format == OutputFormat::Text {
            match &result {
                Ok(()) => println!("[OK] {} = {}", name, recommendation.value),
                Err(e) => println!("[!!] {}: {}", name, e),
            }
        }
        results.push(result);
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    collect_errors(results).map(|_| ())
}

fn cmd_memory(tuner: &Tuner<LinuxHost>, format: OutputFormat) -> Result<()> {
    let totals = MemoryTotals::read(tuner.host())?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&totals)?),
        OutputFormat::Text => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            print_memory(&mut out, &totals).map_err(|e| TuneError::io("<stdout>", e))?;
        }
    }
    Ok(())
}

fn print_memory(out: &mut impl Write, totals: &MemoryTotals) -> io::Result<()> {
    let mib = |mb: u64| humansize::format_size(mb * 1024 * 1024, humansize::BINARY);
    writeln!(out, "=== Memory ===")?;
    writeln!(out, "Main:  {} ({} MB)", mib(totals.main_mb), totals.main_mb)?;
    writeln!(out, "Swap:  {} ({} MB)", mib(totals.swap_mb), totals.swap_mb)?;
    writeln!(out, "Total: {} ({} MB)", mib(totals.total_mb()), totals.total_mb())
}
