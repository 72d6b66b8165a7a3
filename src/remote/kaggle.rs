//! Kaggle dataset client.
//!
//! Mirrors the on-disk layout of the `kagglehub` Python client so both tools
//! share one cache:
//!
//! ```text
//! <cache>/datasets/<owner>/<slug>/versions/<n>/...   extracted files
//! <cache>/datasets/<owner>/<slug>/versions/<n>.complete
//! ```
//!
//! A version directory is only trusted once its `.complete` marker exists.
//! Cache hits never touch the network or require credentials.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;

use crate::dataset::DatasetRef;
use crate::error::FetchError;

use super::{home_dir, ClientSettings, DatasetClient, Provider};

pub const DEFAULT_ENDPOINT: &str = "https://www.kaggle.com";

const METADATA_TIMEOUT: Duration = Duration::from_secs(30);
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// API credentials as stored in `kaggle.json`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct KaggleCredentials {
    pub username: String,
    pub key: String,
}

impl KaggleCredentials {
    fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.key);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

/// Client for the Kaggle public API.
#[derive(Clone, Debug)]
pub struct KaggleClient {
    endpoint: String,
    cache_root: PathBuf,
    force_download: bool,
    credentials: Option<KaggleCredentials>,
    config_dirs: Vec<PathBuf>,
}

impl KaggleClient {
    /// Client with an explicit endpoint and cache root and no credentials.
    pub fn new(endpoint: impl Into<String>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            cache_root: cache_root.into(),
            force_download: false,
            credentials: None,
            config_dirs: Vec::new(),
        }
    }

    /// Client configured from `KAGGLE_*` environment variables and the
    /// usual config locations.
    pub fn from_env(settings: &ClientSettings) -> Self {
        let endpoint =
            std::env::var("KAGGLE_API_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let cache_root = settings
            .cache_dir
            .clone()
            .or_else(|| std::env::var_os("KAGGLEHUB_CACHE").map(PathBuf::from))
            .unwrap_or_else(default_cache_root);

        let mut config_dirs = Vec::new();
        if let Some(dir) = std::env::var_os("KAGGLE_CONFIG_DIR") {
            config_dirs.push(PathBuf::from(dir));
        }
        if let Some(home) = home_dir() {
            config_dirs.push(home.join(".kaggle"));
            config_dirs.push(home.join(".config").join("kaggle"));
        }

        let mut client =
            Self::new(endpoint, cache_root).with_force_download(settings.force_download);
        client.config_dirs = config_dirs;
        client
    }

    pub fn with_credentials(mut self, credentials: KaggleCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_force_download(mut self, force: bool) -> Self {
        self.force_download = force;
        self
    }

    /// Directory holding the extracted files of one dataset version.
    pub fn version_dir(&self, dataset: &DatasetRef, version: u32) -> PathBuf {
        self.cache_root
            .join("datasets")
            .join(&dataset.owner)
            .join(&dataset.slug)
            .join("versions")
            .join(version.to_string())
    }

    fn credentials(&self) -> Result<Option<KaggleCredentials>, FetchError> {
        if let Some(credentials) = &self.credentials {
            return Ok(Some(credentials.clone()));
        }
        resolve_credentials(
            std::env::var("KAGGLE_USERNAME").ok(),
            std::env::var("KAGGLE_KEY").ok(),
            &self.config_dirs,
        )
    }

    fn api_url(&self, segments: &[&str]) -> Result<url::Url, FetchError> {
        let mut url = url::Url::parse(&self.endpoint).map_err(|source| FetchError::RemoteApi {
            dataset: String::new(),
            message: format!("invalid API endpoint '{}': {source}", self.endpoint),
        })?;
        url.path_segments_mut()
            .map_err(|_| FetchError::RemoteApi {
                dataset: String::new(),
                message: format!("API endpoint '{}' cannot carry a path", self.endpoint),
            })?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    fn get(
        &self,
        agent: &ureq::Agent,
        url: &url::Url,
        dataset: &DatasetRef,
    ) -> Result<ureq::http::Response<ureq::Body>, FetchError> {
        log::debug!("GET {url}");
        let mut request = agent.get(url.as_str());
        if let Some(credentials) = self.credentials()? {
            request = request.header("Authorization", &credentials.basic_auth_header());
        }
        request
            .call()
            .map_err(|source| map_http_error(dataset, source))
    }

    /// Ask the API for the latest published version number.
    fn current_version(&self, dataset: &DatasetRef) -> Result<u32, FetchError> {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(METADATA_TIMEOUT))
            .build();
        let agent: ureq::Agent = config.into();

        let url = self.api_url(&["datasets", "view", &dataset.owner, &dataset.slug])?;
        let mut response = self.get(&agent, &url, dataset)?;
        let body = response
            .body_mut()
            .read_json::<Value>()
            .map_err(|source| FetchError::RemoteApi {
                dataset: dataset.handle(),
                message: format!("unreadable dataset metadata: {source}"),
            })?;

        extract_version_number(&body).ok_or_else(|| FetchError::RemoteApi {
            dataset: dataset.handle(),
            message: "dataset metadata has no currentVersionNumber".to_string(),
        })
    }

    fn download_version(
        &self,
        dataset: &DatasetRef,
        version: u32,
        target: &Path,
    ) -> Result<(), FetchError> {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(METADATA_TIMEOUT))
            .build();
        let agent: ureq::Agent = config.into();

        let mut url = self.api_url(&["datasets", "download", &dataset.owner, &dataset.slug])?;
        url.query_pairs_mut()
            .append_pair("datasetVersionNumber", &version.to_string());

        let mut response = self.get(&agent, &url, dataset)?;
        let file_name = response
            .headers()
            .get("content-disposition")
            .and_then(|value| value.to_str().ok())
            .and_then(content_disposition_filename)
            .unwrap_or_else(|| dataset.slug.clone());

        let versions_dir = target.parent().unwrap_or(target);
        fs::create_dir_all(versions_dir)?;
        let download_path = versions_dir.join(format!("{version}.download"));
        {
            let mut out = BufWriter::new(File::create(&download_path)?);
            let mut body = response.body_mut().as_reader();
            let written = std::io::copy(&mut body, &mut out)?;
            out.flush()?;
            log::debug!("downloaded {written} bytes to {}", download_path.display());
        }

        install_download(&download_path, target, &file_name)
    }
}

impl DatasetClient for KaggleClient {
    fn provider(&self) -> Provider {
        Provider::Kaggle
    }

    fn dataset_download(&self, dataset: &DatasetRef) -> Result<PathBuf, FetchError> {
        let version = match dataset.version {
            Some(version) => version,
            None => self.current_version(dataset)?,
        };

        let target = self.version_dir(dataset, version);
        let marker = completion_marker(&target);

        if marker.is_file() && target.is_dir() && !self.force_download {
            log::debug!("cache hit for {dataset} version {version} at {}", target.display());
            return Ok(target);
        }

        log::info!("downloading {dataset} version {version}");
        if marker.exists() {
            fs::remove_file(&marker)?;
        }
        self.download_version(dataset, version, &target)?;

        Ok(target)
    }
}

/// Move a finished download into `target` and mark the version complete.
///
/// Zip archives are extracted and removed; any other body becomes a single
/// file named `file_name`. The `.complete` marker is written last.
pub fn install_download(
    download_path: &Path,
    target: &Path,
    file_name: &str,
) -> Result<(), FetchError> {
    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::create_dir_all(target)?;

    if is_zip_archive(download_path)? {
        extract_archive(download_path, target)?;
        fs::remove_file(download_path)?;
    } else {
        fs::rename(download_path, target.join(file_name))?;
    }

    File::create(completion_marker(target))?;
    Ok(())
}

/// `versions/3` -> `versions/3.complete`.
pub fn completion_marker(version_dir: &Path) -> PathBuf {
    let mut name = version_dir.as_os_str().to_owned();
    name.push(".complete");
    PathBuf::from(name)
}

fn default_cache_root() -> PathBuf {
    home_dir()
        .map(|home| home.join(".cache").join("kagglehub"))
        .unwrap_or_else(|| PathBuf::from(".kagglehub"))
}

/// Credentials from environment values first, then the first `kaggle.json`
/// found in `config_dirs`. `Ok(None)` means anonymous access.
pub fn resolve_credentials(
    username: Option<String>,
    key: Option<String>,
    config_dirs: &[PathBuf],
) -> Result<Option<KaggleCredentials>, FetchError> {
    match (username, key) {
        (Some(username), Some(key)) => return Ok(Some(KaggleCredentials { username, key })),
        (Some(_), None) => {
            return Err(FetchError::MissingCredentials {
                message: "KAGGLE_USERNAME is set but KAGGLE_KEY is not".to_string(),
            })
        }
        (None, Some(_)) => {
            return Err(FetchError::MissingCredentials {
                message: "KAGGLE_KEY is set but KAGGLE_USERNAME is not".to_string(),
            })
        }
        (None, None) => {}
    }

    for dir in config_dirs {
        let path = dir.join("kaggle.json");
        if !path.is_file() {
            continue;
        }
        let file = File::open(&path)?;
        let credentials: KaggleCredentials = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| FetchError::CredentialsParse {
                path: path.clone(),
                source,
            })?;
        log::debug!("using credentials from {}", path.display());
        return Ok(Some(credentials));
    }

    Ok(None)
}

fn extract_version_number(body: &Value) -> Option<u32> {
    body.get("currentVersionNumber")
        .and_then(Value::as_u64)
        .and_then(|value| u32::try_from(value).ok())
}

fn map_http_error(dataset: &DatasetRef, source: ureq::Error) -> FetchError {
    match source {
        ureq::Error::StatusCode(401 | 403) => FetchError::Unauthorized {
            dataset: dataset.handle(),
        },
        ureq::Error::StatusCode(404) => FetchError::DatasetNotFound {
            dataset: dataset.handle(),
        },
        other => FetchError::RemoteApi {
            dataset: dataset.handle(),
            message: other.to_string(),
        },
    }
}

fn content_disposition_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|value| value.trim_matches('"'))
        .and_then(|value| Path::new(value).file_name())
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
}

fn is_zip_archive(path: &Path) -> Result<bool, FetchError> {
    let mut magic = [0u8; 4];
    let mut file = File::open(path)?;
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(&magic == ZIP_MAGIC),
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Extract a zip archive into `into`, which must already exist.
pub fn extract_archive(archive: &Path, into: &Path) -> Result<(), FetchError> {
    let file = File::open(archive)?;
    let mut zip =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|source| FetchError::Archive {
            path: archive.to_path_buf(),
            message: source.to_string(),
        })?;
    zip.extract(into).map_err(|source| FetchError::Archive {
        path: archive.to_path_buf(),
        message: source.to_string(),
    })
}
