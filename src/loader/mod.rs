use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::dataset::Dataset;

pub const DEFAULT_SOURCE: &str = "./data/graders.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// `http://` and `https://` locations are fetched, anything else is a path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(raw.to_string())
        } else {
            Source::File(crate::config::expand_tilde(raw))
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::File(PathBuf::from(DEFAULT_SOURCE))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoadOptions {
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            proxy: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read dataset file: {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A dataset together with the freshness metadata of the transport.
#[derive(Clone, Debug)]
pub struct Loaded {
    pub source: Source,
    pub dataset: Dataset,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct Loader {
    client: reqwest::Client,
}

impl Loader {
    pub fn new(options: &LoadOptions) -> Result<Self, LoadError> {
        Ok(Self {
            client: build_client(options.proxy.as_deref(), options.timeout_seconds)?,
        })
    }

    pub async fn load(&self, source: &Source) -> Result<Loaded, LoadError> {
        let (bytes, last_modified) = match source {
            Source::Url(url) => self.fetch(url).await?,
            Source::File(path) => read_file(path).await?,
        };
        let dataset = Dataset::from_slice(&bytes).map_err(|e| LoadError::Parse {
            origin: source.to_string(),
            source: e,
        })?;
        info!(
            "loaded {} records from {} (last modified: {})",
            dataset.len(),
            source,
            last_modified
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string())
        );
        Ok(Loaded {
            source: source.clone(),
            dataset,
            last_modified,
        })
    }

    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, Option<DateTime<Utc>>), LoadError> {
        debug!("fetching {url}");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::Request {
                url: url.to_string(),
                source: e,
            })?;
        if !resp.status().is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        let last_modified = resp
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| {
                let parsed = parse_http_date(v);
                if parsed.is_none() {
                    debug!("ignoring unparseable Last-Modified header: {v}");
                }
                parsed
            });
        let body = resp.bytes().await.map_err(|e| LoadError::Body {
            url: url.to_string(),
            source: e,
        })?;
        Ok((body.to_vec(), last_modified))
    }
}

async fn read_file(path: &PathBuf) -> Result<(Vec<u8>, Option<DateTime<Utc>>), LoadError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LoadError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;
    let last_modified = tokio::fs::metadata(path)
        .await
        .ok()
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from);
    Ok((bytes, last_modified))
}

fn build_client(proxy: Option<&str>, timeout_seconds: usize) -> Result<reqwest::Client, LoadError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!(
            "graderboard/",
            env!("CARGO_PKG_VERSION")
        )),
    );

    let timeout = Duration::from_secs(timeout_seconds.try_into().unwrap_or(10));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(timeout);

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| LoadError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| LoadError::HttpClientBuild { source: e })
}

/// Parses an HTTP-date (IMF-fixdate, or the obsolete asctime form).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%a %b %e %H:%M:%S %Y")
        .ok()
        .map(|naive| naive.and_utc())
}
