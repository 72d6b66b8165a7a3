//! Dataset fetching: download, discover, copy.
//!
//! [`fetch_dataset`] runs the whole sequence:
//!
//! 1. ask the [`DatasetClient`] for a local copy of the dataset,
//! 2. create the destination directory (with parents),
//! 3. build the [`FileManifest`] of matching files,
//! 4. copy each file into the destination.
//!
//! An empty manifest is not an error: the destination still exists and the
//! report simply lists no copies. Any other failure aborts the run.

use std::fmt;
use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::dataset::DatasetRef;
use crate::error::FetchError;
use crate::manifest::{self, FileManifest, ManifestEntry, SuffixFilter};
use crate::remote::{DatasetClient, Provider};
use crate::summary::{self, CsvSummary};

/// Default staging directory, relative to the working directory.
pub const DEFAULT_DESTINATION: &str = "data/raw";

/// Options for one fetch run.
#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub destination: PathBuf,
    pub filter: SuffixFilter,
    /// Descend into subdirectories and mirror them under the destination.
    pub recursive: bool,
    /// Print per-step status lines to stdout.
    pub verbose: bool,
    /// Summarize copied CSV files.
    pub summarize: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            destination: PathBuf::from(DEFAULT_DESTINATION),
            filter: SuffixFilter::csv(),
            recursive: false,
            verbose: true,
            summarize: false,
        }
    }
}

/// A file copied into the destination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CopiedFile {
    pub name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
}

/// A manifest entry that was not copied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// Outcome of a fetch run.
#[derive(Clone, Debug, Serialize)]
pub struct FetchReport {
    pub dataset: String,
    pub provider: Provider,
    pub source_dir: PathBuf,
    pub destination: PathBuf,
    pub copied: Vec<CopiedFile>,
    pub skipped: Vec<SkippedFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<CsvSummary>,
}

impl FetchReport {
    pub fn copied_count(&self) -> usize {
        self.copied.len()
    }

    pub fn total_bytes(&self) -> u64 {
        self.copied.iter().map(|file| file.bytes).sum()
    }

    /// True when no file matched the suffix filter.
    pub fn is_empty(&self) -> bool {
        self.copied.is_empty() && self.skipped.is_empty()
    }
}

impl fmt::Display for FetchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset: {} ({})", self.dataset, self.provider)?;
        writeln!(f, "  source:      {}", self.source_dir.display())?;
        writeln!(f, "  destination: {}", self.destination.display())?;
        writeln!(
            f,
            "  {} file(s) copied, {} byte(s)",
            self.copied_count(),
            self.total_bytes()
        )?;
        for skipped in &self.skipped {
            writeln!(f, "  skipped {}: {}", skipped.name, skipped.reason)?;
        }
        for summary in &self.summaries {
            writeln!(f, "  {summary}")?;
        }
        Ok(())
    }
}

/// Download `dataset` through `client` and stage its matching files.
pub fn fetch_dataset(
    client: &dyn DatasetClient,
    dataset: &DatasetRef,
    options: &FetchOptions,
) -> Result<FetchReport, FetchError> {
    let say = |line: String| {
        if options.verbose {
            println!("{line}");
        }
    };

    say(format!(
        "Downloading {dataset} from {}...",
        client.provider()
    ));
    let source_dir = client.dataset_download(dataset)?;
    say(format!("Dataset downloaded to: {}", source_dir.display()));

    let destination = &options.destination;
    fs::create_dir_all(destination).map_err(|source| FetchError::CreateDestination {
        path: destination.clone(),
        source,
    })?;
    log::info!("staging into {}", destination.display());

    let manifest = manifest::discover(&source_dir, &options.filter, options.recursive)?;

    let mut report = FetchReport {
        dataset: dataset.to_string(),
        provider: client.provider(),
        source_dir,
        destination: destination.clone(),
        copied: Vec::new(),
        skipped: Vec::new(),
        summaries: Vec::new(),
    };

    if manifest.is_empty() {
        say(format!(
            "No {} files found in downloaded dataset",
            options.filter.describe()
        ));
        return Ok(report);
    }

    copy_manifest(&manifest, options, &mut report, &say)?;

    if options.summarize {
        for copied in &report.copied {
            report.summaries.push(summary::summarize_csv(&copied.destination)?);
        }
    }

    Ok(report)
}

fn copy_manifest(
    manifest: &FileManifest,
    options: &FetchOptions,
    report: &mut FetchReport,
    say: &dyn Fn(String),
) -> Result<(), FetchError> {
    for entry in manifest.iter() {
        let target = destination_for(entry, &options.destination, options.recursive);
        let name = entry.file_name();

        if same_file(&entry.path, &target) {
            log::warn!("{} is already at its destination", entry.path.display());
            report.skipped.push(SkippedFile {
                name,
                reason: "source and destination are the same file".to_string(),
            });
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| FetchError::CreateDestination {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let bytes = copy_with_times(&entry.path, &target)?;
        say(format!("Copied {name} to {}", target.display()));

        report.copied.push(CopiedFile {
            name,
            source: entry.path.clone(),
            destination: target,
            bytes,
        });
    }

    Ok(())
}

fn destination_for(entry: &ManifestEntry, destination: &Path, recursive: bool) -> PathBuf {
    if recursive {
        destination.join(&entry.relative)
    } else {
        destination.join(entry.file_name())
    }
}

/// Device/inode identity, so hard links and symlinks to the source count too.
fn same_file(a: &Path, b: &Path) -> bool {
    same_file::is_same_file(a, b).unwrap_or(false)
}

/// Copy content and permissions, then carry over access and modification times.
fn copy_with_times(from: &Path, to: &Path) -> Result<u64, FetchError> {
    let copy_error = |source| FetchError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let bytes = fs::copy(from, to).map_err(copy_error)?;

    let metadata = fs::metadata(from).map_err(copy_error)?;
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    match File::options().write(true).open(to) {
        Ok(file) => file.set_times(times).map_err(copy_error)?,
        // Read-only sources copy to read-only targets; keep the content, drop the times.
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            log::debug!("cannot set times on read-only {}", to.display());
        }
        Err(err) => return Err(copy_error(err)),
    }

    Ok(bytes)
}
