//! Dataset references and parsing of user-supplied dataset inputs.

use std::fmt;

use crate::error::FetchError;

/// Dataset fetched when no reference is given.
pub const DEFAULT_DATASET: &str = "adarshsng/lending-club-loan-data-csv";

/// Canonical reference to a hosted dataset (`owner/slug`, optionally pinned).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetRef {
    pub owner: String,
    pub slug: String,
    pub version: Option<u32>,
}

impl DatasetRef {
    pub fn new(owner: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            slug: slug.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// `owner/slug` without the version suffix.
    pub fn handle(&self) -> String {
        format!("{}/{}", self.owner, self.slug)
    }
}

impl Default for DatasetRef {
    fn default() -> Self {
        DatasetRef::new("adarshsng", "lending-club-loan-data-csv")
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}/{}/versions/{}", self.owner, self.slug, version),
            None => write!(f, "{}/{}", self.owner, self.slug),
        }
    }
}

/// Parse a dataset reference given as a handle or a dataset page URL.
///
/// Accepted forms:
/// - `owner/slug`
/// - `owner/slug/versions/N`
/// - `https://www.kaggle.com/datasets/owner/slug[/versions/N]`
/// - `https://huggingface.co/datasets/owner/slug`
pub fn parse_dataset_input(input: &str) -> Result<DatasetRef, FetchError> {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        parse_dataset_url(trimmed)
    } else {
        let segments: Vec<&str> = trimmed.split('/').collect();
        parse_segments(input, &segments)
    }
}

fn parse_dataset_url(input: &str) -> Result<DatasetRef, FetchError> {
    let url = url::Url::parse(input)
        .map_err(|source| invalid(input, format!("invalid URL: {source}")))?;

    let host = url
        .host_str()
        .ok_or_else(|| invalid(input, "URL is missing a host"))?
        .to_ascii_lowercase();

    if !matches!(host.as_str(), "kaggle.com" | "www.kaggle.com" | "huggingface.co") {
        return Err(invalid(
            input,
            format!("expected host 'www.kaggle.com' or 'huggingface.co', found '{host}'"),
        ));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|iter| iter.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if segments.first() != Some(&"datasets") {
        return Err(invalid(
            input,
            "expected dataset URL like https://www.kaggle.com/datasets/<owner>/<dataset>",
        ));
    }

    // Hugging Face URLs may carry `/tree/<rev>` or `/blob/...`; only the repo id matters here.
    let rest = &segments[1..];
    if host == "huggingface.co" && rest.len() > 2 {
        return parse_segments(input, &rest[..2]);
    }

    parse_segments(input, rest)
}

fn parse_segments(input: &str, segments: &[&str]) -> Result<DatasetRef, FetchError> {
    let (owner, slug, version) = match segments {
        [owner, slug] => (*owner, *slug, None),
        [owner, slug, "versions", version] => (*owner, *slug, Some(*version)),
        _ => {
            return Err(invalid(
                input,
                "expected '<owner>/<dataset>' or '<owner>/<dataset>/versions/<n>'",
            ))
        }
    };

    if owner.is_empty() || slug.is_empty() {
        return Err(invalid(input, "owner and dataset name must not be empty"));
    }
    if [owner, slug].iter().any(|seg| matches!(*seg, "." | "..")) {
        return Err(invalid(input, "owner and dataset name must not be '.' or '..'"));
    }

    let mut reference = DatasetRef::new(owner, slug);
    if let Some(version) = version {
        let number = version
            .parse::<u32>()
            .map_err(|_| invalid(input, format!("version '{version}' is not a number")))?;
        reference = reference.with_version(number);
    }

    Ok(reference)
}

fn invalid(input: &str, message: impl Into<String>) -> FetchError {
    FetchError::InvalidDatasetRef {
        input: input.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_handle() {
        let parsed = parse_dataset_input("adarshsng/lending-club-loan-data-csv").expect("parse");
        assert_eq!(parsed, DatasetRef::default());
        assert_eq!(parsed.to_string(), DEFAULT_DATASET);
    }

    #[test]
    fn parse_pinned_version() {
        let parsed = parse_dataset_input("owner/data/versions/3").expect("parse");
        assert_eq!(parsed.version, Some(3));
        assert_eq!(parsed.handle(), "owner/data");
        assert_eq!(parsed.to_string(), "owner/data/versions/3");
    }

    #[test]
    fn parse_kaggle_url() {
        let parsed = parse_dataset_input(
            "https://www.kaggle.com/datasets/adarshsng/lending-club-loan-data-csv",
        )
        .expect("parse");
        assert_eq!(parsed, DatasetRef::default());
    }

    #[test]
    fn parse_kaggle_url_with_version() {
        let parsed =
            parse_dataset_input("https://www.kaggle.com/datasets/owner/data/versions/7/")
                .expect("parse");
        assert_eq!(parsed.version, Some(7));
    }

    #[test]
    fn parse_hf_url_ignores_tree_suffix() {
        let parsed =
            parse_dataset_input("https://huggingface.co/datasets/org/loans/tree/main")
                .expect("parse");
        assert_eq!(parsed, DatasetRef::new("org", "loans"));
    }

    #[test]
    fn rejects_malformed_inputs() {
        for input in [
            "",
            "justone",
            "a/b/c",
            "/slug",
            "owner/",
            "owner/slug/versions/latest",
            "../slug",
            "owner/..",
            "./.",
            "../../versions/1",
            "https://example.com/datasets/a/b",
            "https://www.kaggle.com/code/a/b",
        ] {
            let err = parse_dataset_input(input).expect_err(input);
            assert!(
                matches!(err, FetchError::InvalidDatasetRef { .. }),
                "unexpected error for {input:?}: {err:?}"
            );
        }
    }
}
