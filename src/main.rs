//! Credit Risk Scorer - Main Entry Point
//!
//! Reads loan applications as JSON Lines, runs the preprocessing and
//! inference pipeline on each, and emits one risk assessment per line.

use anyhow::{Context, Result};
use clap::Parser;
use credit_risk_scorer::{
    config::{AppConfig, LoggingConfig},
    form::style_label,
    pipeline::ScoringPipeline,
    stats::ScoringStats,
    types::application::LoanApplication,
    types::assessment::RiskTier,
};
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Score loan applications for default risk
#[derive(Debug, Parser)]
#[command(name = "credit-risk-scorer", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config/config.toml")]
    config: PathBuf,

    /// Input applications as JSON Lines ("-" reads stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output file for assessments as JSON Lines (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit a plain-text report per application instead of JSON
    #[arg(long)]
    report: bool,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("credit_risk_scorer={}", logging.level))
    });

    if logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn open_input(path: &str) -> Result<Box<dyn BufRead>> {
    if path == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open input file {}", path))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create output file {:?}", path))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_path(&cli.config)?;
    init_tracing(&config.logging);

    info!("Starting Credit Risk Scorer");
    info!(
        "Risk tiers: moderate >= {:.0}%, high >= {:.0}%",
        config.scoring.risk_tiers.moderate * 100.0,
        config.scoring.risk_tiers.high * 100.0
    );

    let pipeline = ScoringPipeline::from_config(&config)?;

    let reader = open_input(&cli.input)?;
    let mut writer = open_output(cli.output.as_ref())?;
    let mut stats = ScoringStats::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input line")?;
        if line.trim().is_empty() {
            continue;
        }

        let application: LoanApplication = match serde_json::from_str(&line) {
            Ok(app) => app,
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "Failed to deserialize application");
                stats.record_failure();
                continue;
            }
        };

        let start_time = Instant::now();
        match pipeline.assess(&application) {
            Ok(assessment) => {
                stats.record_assessment(start_time.elapsed(), &assessment);

                match assessment.risk_tier {
                    RiskTier::Low => debug!(
                        application_id = %assessment.application_id,
                        probability = assessment.probability_of_default,
                        "Application approved"
                    ),
                    RiskTier::Moderate | RiskTier::High => info!(
                        application_id = %assessment.application_id,
                        probability = assessment.probability_of_default,
                        risk_tier = ?assessment.risk_tier,
                        "Application flagged"
                    ),
                }

                if cli.report {
                    writeln!(
                        writer,
                        "--- {} ({}, {}) ---",
                        assessment.application_id,
                        style_label(&assessment.purpose),
                        assessment.term
                    )?;
                    writeln!(writer, "{}", assessment.render())?;
                } else {
                    serde_json::to_writer(&mut writer, &assessment)?;
                    writeln!(writer)?;
                }
            }
            Err(e) => {
                error!(
                    application_id = %application.application_id,
                    error = format!("{:#}", e),
                    "Failed to assess application"
                );
                stats.record_failure();
            }
        }
    }

    writer.flush()?;
    stats.print_summary();

    Ok(())
}
