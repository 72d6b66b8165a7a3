//! Dataset hosting clients.
//!
//! The fetcher only ever sees [`DatasetClient`]: hand it a [`DatasetRef`], get
//! back a local directory holding the dataset files. Authentication, caching
//! and archive handling stay inside each provider module.

#[cfg(feature = "hf")]
pub mod hf;
#[cfg(feature = "kaggle")]
pub mod kaggle;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::dataset::DatasetRef;
use crate::error::FetchError;

/// Supported dataset hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Kaggle,
    #[value(alias = "hf")]
    Huggingface,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Kaggle => f.write_str("Kaggle"),
            Provider::Huggingface => f.write_str("Hugging Face Hub"),
        }
    }
}

/// A remote dataset host that can materialize a dataset on local disk.
pub trait DatasetClient {
    /// Which host this client talks to.
    fn provider(&self) -> Provider;

    /// Download (or reuse a cached copy of) `dataset` and return the local
    /// directory that holds its files.
    fn dataset_download(&self, dataset: &DatasetRef) -> Result<PathBuf, FetchError>;
}

/// Provider-independent client settings, usually taken from the CLI.
#[derive(Clone, Debug, Default)]
pub struct ClientSettings {
    pub cache_dir: Option<PathBuf>,
    pub force_download: bool,
    /// Hub revision (branch, tag or commit). Ignored by Kaggle.
    pub revision: Option<String>,
    /// Access token. Kaggle reads its own credentials instead.
    pub token: Option<String>,
    /// File suffixes worth downloading when the host serves files one by one.
    pub suffixes: Vec<String>,
}

/// Build the client for `provider`.
pub fn build_client(
    provider: Provider,
    settings: &ClientSettings,
) -> Result<Box<dyn DatasetClient>, FetchError> {
    match provider {
        #[cfg(feature = "kaggle")]
        Provider::Kaggle => Ok(Box::new(kaggle::KaggleClient::from_env(settings))),
        #[cfg(feature = "hf")]
        Provider::Huggingface => Ok(Box::new(hf::HfClient::new(settings))),
        #[allow(unreachable_patterns)]
        other => Err(FetchError::UnsupportedProvider(format!(
            "'{other}' (rebuild with the matching cargo feature enabled)"
        ))),
    }
}

/// Home directory from the environment, used to locate caches and credentials.
#[cfg(feature = "kaggle")]
pub(crate) fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
