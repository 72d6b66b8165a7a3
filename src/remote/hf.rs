//! Hugging Face Hub dataset client.
//!
//! The Hub serves files one by one, so only siblings matching the configured
//! suffixes are downloaded. The returned path is the snapshot root inside the
//! `hf-hub` cache, which mirrors the repository layout.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};

use crate::dataset::DatasetRef;
use crate::error::FetchError;

use super::{ClientSettings, DatasetClient, Provider};

#[derive(Clone, Debug)]
pub struct HfClient {
    revision: Option<String>,
    token: Option<String>,
    cache_dir: Option<PathBuf>,
    suffixes: Vec<String>,
}

impl HfClient {
    pub fn new(settings: &ClientSettings) -> Self {
        let token = settings
            .token
            .clone()
            .or_else(|| std::env::var("HF_TOKEN").ok());
        Self {
            revision: settings.revision.clone(),
            token,
            cache_dir: settings.cache_dir.clone(),
            suffixes: settings.suffixes.clone(),
        }
    }
}

impl DatasetClient for HfClient {
    fn provider(&self) -> Provider {
        Provider::Huggingface
    }

    fn dataset_download(&self, dataset: &DatasetRef) -> Result<PathBuf, FetchError> {
        let repo_id = dataset.handle();
        let api_error = |message: String| FetchError::RemoteApi {
            dataset: repo_id.clone(),
            message,
        };

        let mut builder = ApiBuilder::new().with_progress(false);
        if self.token.is_some() {
            builder = builder.with_token(self.token.clone());
        }
        if let Some(dir) = &self.cache_dir {
            builder = builder.with_cache_dir(dir.clone());
        }
        let api = builder.build().map_err(|source| api_error(source.to_string()))?;

        let repo = match &self.revision {
            Some(revision) => api.repo(Repo::with_revision(
                repo_id.clone(),
                RepoType::Dataset,
                revision.clone(),
            )),
            None => api.dataset(repo_id.clone()),
        };

        let info = repo.info().map_err(|source| api_error(source.to_string()))?;
        let wanted: Vec<String> = info
            .siblings
            .iter()
            .map(|sibling| sibling.rfilename.clone())
            .filter(|name| wants_file(name, &self.suffixes))
            .collect();

        let mut snapshot_root = None;
        for remote_path in &wanted {
            let local = repo
                .download(remote_path)
                .map_err(|source| api_error(format!("failed downloading '{remote_path}': {source}")))?;
            log::debug!("downloaded {remote_path} to {}", local.display());
            if snapshot_root.is_none() {
                snapshot_root = snapshot_root_of(&local, remote_path);
            }
        }

        match snapshot_root {
            Some(root) => Ok(root),
            // Nothing matched: hand back the repo cache so the manifest comes up empty.
            None => {
                let cache = self
                    .cache_dir
                    .clone()
                    .unwrap_or_else(|| hf_hub::Cache::from_env().path().clone());
                let dir = cache.join(format!("datasets--{}", repo_id.replace('/', "--")));
                std::fs::create_dir_all(&dir)?;
                Ok(dir)
            }
        }
    }
}

fn wants_file(name: &str, suffixes: &[String]) -> bool {
    suffixes.is_empty() || suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
}

/// Strip the repo-relative path off a downloaded file to get the snapshot root.
fn snapshot_root_of(local: &Path, remote_path: &str) -> Option<PathBuf> {
    let depth = Path::new(remote_path).components().count();
    let mut root = local;
    for _ in 0..depth {
        root = root.parent()?;
    }
    Some(root.to_path_buf())
}
