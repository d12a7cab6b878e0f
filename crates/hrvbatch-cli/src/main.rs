use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use hrvbatch_lib::{
    batch::{compute_selected_hrv, run_and_write, BatchReport},
    config::BatchConfig,
    io::ibi::read_ibi_csv,
    metrics::hrv::{hrv_features, FREQUENCY_KEYS, TIME_KEYS},
    signal::intervals_to_peaks,
};
use log::info;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "hrvbatch",
    version,
    about = "Batch HRV metrics from per-subject IBI exports"
)]
struct Cli {
    /// Logging verbosity (e.g., debug, info, warn)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides layered on top of the config file.
#[derive(Args)]
struct ConfigArgs {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reference sampling rate (Hz) for peak reconstruction
    #[arg(long)]
    sampling_rate: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the selected metrics for every subject and write one spreadsheet
    Batch {
        #[command(flatten)]
        cfg: ConfigArgs,
        /// Directory holding one folder per subject
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(long)]
        session_folder: Option<String>,
        #[arg(long)]
        file_name: Option<String>,
        /// Subject identifier prefix
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        first: Option<u32>,
        #[arg(long)]
        last: Option<u32>,
        /// Output table (.xlsx, .csv or .tsv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Selected metrics for a single IBI export, as JSON
    Subject {
        #[command(flatten)]
        cfg: ConfigArgs,
        #[arg(long)]
        input: PathBuf,
    },
    /// Every time- and frequency-domain feature for a single IBI export, as JSON
    Features {
        #[command(flatten)]
        cfg: ConfigArgs,
        #[arg(long)]
        input: PathBuf,
    },
    /// List the feature keys a metric selection may refer to
    Metrics,
    /// Write the default configuration as TOML
    InitConfig {
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();
    match cli.command {
        Commands::Batch {
            cfg,
            root,
            session_folder,
            file_name,
            prefix,
            first,
            last,
            output,
        } => {
            let mut config = load_config(&cfg)?;
            if let Some(root) = root {
                config.root_dir = root;
            }
            if let Some(session_folder) = session_folder {
                config.session_folder = session_folder;
            }
            if let Some(file_name) = file_name {
                config.file_name = file_name;
            }
            if let Some(prefix) = prefix {
                config.subjects.prefix = prefix;
            }
            if let Some(first) = first {
                config.subjects.first = first;
            }
            if let Some(last) = last {
                config.subjects.last = last;
            }
            if output.is_some() {
                config.output = output;
            }
            config.validate()?;
            cmd_batch(&config)?
        }
        Commands::Subject { cfg, input } => cmd_subject(&load_config(&cfg)?, &input)?,
        Commands::Features { cfg, input } => cmd_features(&load_config(&cfg)?, &input)?,
        Commands::Metrics => cmd_metrics(),
        Commands::InitConfig { out } => cmd_init_config(&out)?,
    }
    Ok(())
}

fn load_config(args: &ConfigArgs) -> Result<BatchConfig> {
    let mut config = match &args.config {
        Some(path) => BatchConfig::load(path)?,
        None => BatchConfig::default(),
    };
    if let Some(rate) = args.sampling_rate {
        config.sampling_rate = rate;
    }
    config.validate()?;
    Ok(config)
}

#[derive(Serialize)]
struct FailedSubject {
    subject: String,
    path: PathBuf,
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct BatchSummary {
    succeeded: Vec<String>,
    failed: Vec<FailedSubject>,
    output: Option<PathBuf>,
}

impl BatchSummary {
    fn new(report: &BatchReport, config: &BatchConfig) -> Self {
        Self {
            succeeded: report.succeeded().map(|o| o.subject.clone()).collect(),
            failed: report
                .failed()
                .map(|(outcome, err)| FailedSubject {
                    subject: outcome.subject.clone(),
                    path: err.path().to_path_buf(),
                    kind: err.kind(),
                    message: err.to_string(),
                })
                .collect(),
            output: report.table.as_ref().map(|_| config.output_path()),
        }
    }
}

fn cmd_batch(config: &BatchConfig) -> Result<()> {
    info!(
        "processing {} subject(s) under {}",
        config.subject_ids().len(),
        config.root_dir.display()
    );
    let report = run_and_write(config)?;
    let summary = BatchSummary::new(&report, config);
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn cmd_subject(config: &BatchConfig, input: &Path) -> Result<()> {
    let record = compute_selected_hrv(input, config)?;
    println!("{}", serde_json::to_string(&record)?);
    Ok(())
}

fn cmd_features(config: &BatchConfig, input: &Path) -> Result<()> {
    let ibi = read_ibi_csv(input, &config.csv)?;
    let peaks = intervals_to_peaks(&ibi.to_rr_ms(), config.sampling_rate)?;
    let features = hrv_features(&peaks, &config.frequency, true)?;
    println!("{}", serde_json::to_string(&features)?);
    Ok(())
}

fn cmd_metrics() {
    for key in TIME_KEYS.iter().chain(FREQUENCY_KEYS) {
        println!("{}", key);
    }
}

fn cmd_init_config(out: &Path) -> Result<()> {
    let text = BatchConfig::default().to_toml()?;
    fs::write(out, text).with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}
