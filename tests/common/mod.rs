#![allow(dead_code)]

use std::cell::Cell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use loanfetch::remote::{DatasetClient, Provider};
use loanfetch::{DatasetRef, FetchError};

/// Client that "downloads" by pointing at an existing directory.
pub struct StaticClient {
    dir: PathBuf,
    calls: Cell<usize>,
}

impl StaticClient {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl DatasetClient for StaticClient {
    fn provider(&self) -> Provider {
        Provider::Kaggle
    }

    fn dataset_download(&self, _dataset: &DatasetRef) -> Result<PathBuf, FetchError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.dir.clone())
    }
}

/// Client whose download always fails.
pub struct FailingClient;

impl DatasetClient for FailingClient {
    fn provider(&self) -> Provider {
        Provider::Kaggle
    }

    fn dataset_download(&self, dataset: &DatasetRef) -> Result<PathBuf, FetchError> {
        Err(FetchError::Unauthorized {
            dataset: dataset.handle(),
        })
    }
}

pub fn write_files(dir: &Path, files: &[(&str, &[u8])]) {
    fs::create_dir_all(dir).expect("create dir");
    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, content).expect("write file");
    }
}

/// Lay out a completed kagglehub-style cache entry and return its directory.
pub fn seed_kaggle_cache(
    cache: &Path,
    owner: &str,
    slug: &str,
    version: u32,
    files: &[(&str, &[u8])],
) -> PathBuf {
    let versions = cache
        .join("datasets")
        .join(owner)
        .join(slug)
        .join("versions");
    let dir = versions.join(version.to_string());
    write_files(&dir, files);
    File::create(versions.join(format!("{version}.complete"))).expect("write marker");
    dir
}
