//! Command-line interface for dxlclean
//!
//! Argument parsing with clap and the top-level run orchestration: load
//! configuration, validate the input root, run the pipeline, and print
//! the reports.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod output;

pub use output::Output;

use crate::config::CleanConfig;
use crate::pipeline::Pipeline;
use crate::report;

/// Clean and count LotusScript/DXL design-element exports
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source directory to process (falls back to `source_dir` from config)
    #[arg(value_name = "INPUT_DIR")]
    pub input: Option<PathBuf>,

    /// Export directory (defaults to `<input>-export`)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of worker threads (default: process files one at a time)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Break the export line analysis down by file extension
    #[arg(long)]
    pub by_extension: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable quiet output (minimal)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Execute the full clean-and-count run
    pub fn run(self) -> Result<()> {
        init_tracing(self.verbose);
        let output = Output::new(self.verbose, self.quiet);

        let config = CleanConfig::load(self.config.as_deref())?;

        let source_root = match self
            .input
            .clone()
            .or_else(|| config.source_dir.clone().map(PathBuf::from))
        {
            Some(path) => path,
            None => bail!("no input directory given (pass one, or set `source_dir` in dxlclean.toml)"),
        };
        if !source_root.is_dir() {
            bail!("input directory does not exist: {}", source_root.display());
        }

        let export_root = self
            .output
            .clone()
            .unwrap_or_else(|| Pipeline::export_root(&source_root));

        output.table_row("Input", &source_root.display().to_string());
        output.table_row("Output", &export_root.display().to_string());

        let pipeline = Pipeline::new(&config)?;
        let stats = pipeline.run(&source_root, &export_root, self.jobs.unwrap_or(1))?;

        report::print_stats(&stats, &output);
        report::print_line_analysis(&export_root, self.by_extension, &output);
        report::print_source_census(&source_root, &config.report.count_dirs, &output);

        output.success("done");
        Ok(())
    }
}

/// Honors `RUST_LOG` when set; otherwise verbose mode turns on debug
/// logging for this crate. Diagnostics go to stderr so report output on
/// stdout stays clean.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "dxlclean=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
