//! loanfetch: stage a hosted dataset's CSV files in a local data directory.
//!
//! By default it downloads the Lending Club loan data from Kaggle, finds the
//! CSV files in the downloaded bundle and copies them into `data/raw/`.
//!
//! # Modules
//!
//! - [`dataset`]: Dataset references and input parsing
//! - [`remote`]: Dataset hosting clients (Kaggle, Hugging Face Hub)
//! - [`manifest`]: Discovery of matching files in a downloaded bundle
//! - [`fetch`]: The download / discover / copy sequence and its report
//! - [`summary`]: CSV shape summaries
//! - [`error`]: Error types for loanfetch operations

pub mod dataset;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod remote;
pub mod summary;

use std::path::PathBuf;

use clap::Parser;

pub use dataset::DatasetRef;
pub use error::FetchError;
pub use fetch::{fetch_dataset, FetchOptions, FetchReport};

use manifest::SuffixFilter;
use remote::{ClientSettings, Provider};

/// The loanfetch CLI application.
#[derive(Parser)]
#[command(name = "loanfetch")]
#[command(version, about)]
struct Cli {
    /// Dataset to fetch ('owner/dataset', 'owner/dataset/versions/N', or a dataset URL).
    #[arg(long, env = "LOANFETCH_DATASET", default_value = dataset::DEFAULT_DATASET)]
    dataset: String,

    /// Dataset host.
    #[arg(long, value_enum, env = "LOANFETCH_PROVIDER", default_value_t = Provider::Kaggle)]
    provider: Provider,

    /// Directory the matching files are copied into.
    #[arg(long, env = "LOANFETCH_DEST", default_value = fetch::DEFAULT_DESTINATION)]
    dest: PathBuf,

    /// File name suffix to collect (repeatable).
    #[arg(long = "suffix", default_value = ".csv")]
    suffixes: Vec<String>,

    /// Also collect files from subdirectories, mirroring their layout.
    #[arg(long)]
    recursive: bool,

    /// Cache directory for downloaded datasets (provider default if unset).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Download again even if a complete cached copy exists.
    #[arg(long)]
    force_download: bool,

    /// Hub revision to download (Hugging Face only).
    #[arg(long)]
    revision: Option<String>,

    /// Hub access token (Hugging Face only).
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print header and record counts for each copied CSV.
    #[arg(long)]
    summary: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// How the run is reported on stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// Status line per step.
    Text,
    /// A single JSON report, no status lines.
    Json,
}

/// Run the loanfetch CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), FetchError> {
    let cli = Cli::parse();

    let json = cli.output == OutputFormat::Json;
    let dataset = dataset::parse_dataset_input(&cli.dataset)?;
    let filter = SuffixFilter::new(cli.suffixes.clone());

    let settings = ClientSettings {
        cache_dir: cli.cache_dir,
        force_download: cli.force_download,
        revision: cli.revision,
        token: cli.token,
        suffixes: cli.suffixes,
    };
    let client = remote::build_client(cli.provider, &settings)?;

    let options = FetchOptions {
        destination: cli.dest,
        filter,
        recursive: cli.recursive,
        verbose: !json,
        summarize: cli.summary,
    };

    let report = fetch_dataset(client.as_ref(), &dataset, &options)?;

    if json {
        let rendered = serde_json::to_string_pretty(&report).map_err(FetchError::ReportJson)?;
        println!("{rendered}");
    } else {
        print!("{report}");
    }

    Ok(())
}
