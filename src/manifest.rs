//! File manifest discovery.
//!
//! The default mode matches a path glob like `*.csv` in the downloaded
//! directory: direct children only, regular files only, case-sensitive
//! suffix match. Dotfiles such as `.loan.csv` (or a bare `.csv`) are
//! included. Recursive mode applies the same filters at every depth.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::FetchError;

/// Suffix filter applied to file names (e.g. `.csv`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuffixFilter {
    suffixes: Vec<String>,
}

impl SuffixFilter {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn csv() -> Self {
        Self::new([".csv"])
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.suffixes
            .iter()
            .any(|suffix| file_name.ends_with(suffix.as_str()))
    }

    /// `*.csv` / `*.csv, *.tsv` style description for messages.
    pub fn describe(&self) -> String {
        self.suffixes
            .iter()
            .map(|suffix| format!("*{suffix}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One discovered file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Absolute (or root-joined) path of the source file.
    pub path: PathBuf,
    /// Path relative to the manifest root.
    pub relative: PathBuf,
}

impl ManifestEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Files under a root that passed the suffix filter, sorted by relative path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileManifest {
    pub root: PathBuf,
    pub entries: Vec<ManifestEntry>,
}

impl FileManifest {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }
}

/// Discover files under `root` matching `filter`.
pub fn discover(
    root: &Path,
    filter: &SuffixFilter,
    recursive: bool,
) -> Result<FileManifest, FetchError> {
    let mut walker = WalkDir::new(root).follow_links(true).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| FetchError::ManifestWalk {
            path: root.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            log::warn!("skipping non UTF-8 file name {}", entry.path().display());
            continue;
        };
        if !filter.matches(name) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(name));
        entries.push(ManifestEntry {
            path: entry.path().to_path_buf(),
            relative,
        });
    }

    entries.sort_by(|a, b| a.relative.cmp(&b.relative));
    log::debug!(
        "{} file(s) matched {} under {}",
        entries.len(),
        filter.describe(),
        root.display()
    );

    Ok(FileManifest {
        root: root.to_path_buf(),
        entries,
    })
}
