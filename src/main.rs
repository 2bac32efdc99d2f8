//! CareNest - Main Entry Point
//!
//! Command-line front-end for the strip analysis core: analyze photos,
//! browse or clear the history, inspect engine status.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use carenest_core::api::commands::{self, AppState};
use carenest_core::constants::{APP_NAME, APP_VERSION};
use carenest_core::{AnalysisConfig, AnalysisResult, HistoryEntry, ResizeFilter};

#[derive(Parser, Debug)]
#[command(name = "carenest", version, about = "CareNest kidney test strip analyzer")]
struct Cli {
    /// Path to the ONNX model artifact
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Directory holding the analysis history
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Resize filter (nearest, triangle, catmullrom, gaussian, lanczos3)
    #[arg(long, global = true)]
    filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one or more strip photos ("-" reads stdin)
    Analyze {
        #[arg(required = true)]
        images: Vec<String>,

        /// Do not save results to history
        #[arg(long)]
        no_record: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List past results, newest first
    History {
        /// Show at most N entries
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },
    /// Delete the stored history
    ClearHistory,
    /// Show model and history status
    Status,
}

fn read_image(source: &str) -> std::io::Result<Vec<u8>> {
    if source == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(source)
    }
}

fn print_result(label: &str, result: &AnalysisResult) {
    println!("== {}", label);
    if result.is_fallback() {
        println!("   Analysis failed - please retry.");
        println!("   {}", result.diagnosis());
        return;
    }
    println!("   Severity:   {}", result.severity());
    println!("   Color:      {}", result.color_detected());
    println!("   ACR band:   {}", result.albumin_creatinine_ratio());
    println!("   Confidence: {}%", result.confidence_percent());
    println!("   Diagnosis:  {}", result.diagnosis());
    println!("   Recommendations:");
    for rec in result.recommendations() {
        println!("     - {}", rec);
    }
}

fn print_entry(entry: &HistoryEntry) {
    let result = &entry.result;
    println!(
        "Test #{:<4} {}  {:<9} {:>3}%  {}",
        entry.number,
        result.timestamp(),
        result.severity(),
        result.confidence_percent(),
        result.albumin_creatinine_ratio()
    );
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

async fn run(cli: Cli) -> Result<(), String> {
    let mut config = AnalysisConfig::default();
    if let Some(model) = cli.model {
        config.model_path = model;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(raw) = cli.filter {
        config.resize_filter = ResizeFilter::parse(&raw)
            .ok_or_else(|| format!("Unknown resize filter '{}'", raw))?;
    }

    let state = AppState::from_config(&config);

    match cli.command {
        Command::Analyze { images, no_record, json } => {
            let mut failures = 0;
            let mut outcomes = Vec::new();

            for source in &images {
                let bytes = read_image(source).map_err(|e| format!("Cannot read '{}': {}", source, e))?;
                let outcome = commands::analyze_image(&state, bytes, !no_record).await?;
                if outcome.needs_retry {
                    failures += 1;
                }
                if let Some(e) = &outcome.save_error {
                    log::warn!("Result for '{}' was not saved: {}", source, e);
                    failures += 1;
                }
                if !json {
                    print_result(source, &outcome.result);
                }
                outcomes.push(outcome);
            }

            if json {
                println!("{}", to_json(&outcomes)?);
            }
            if failures > 0 {
                return Err(format!("{} of {} analyses failed or were not saved", failures, images.len()));
            }
        }
        Command::History { limit, json } => {
            let entries = commands::get_analysis_history(&state, limit).await?;
            if json {
                println!("{}", to_json(&entries)?);
            } else if entries.is_empty() {
                println!("No tests yet. Take your first kidney test to see results here.");
            } else {
                entries.iter().for_each(print_entry);
            }
        }
        Command::ClearHistory => {
            commands::clear_analysis_history(&state).await?;
            println!("History cleared.");
        }
        Command::Status => {
            let status = commands::get_engine_status(&state).await?;
            println!("{}", to_json(&status)?);
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
