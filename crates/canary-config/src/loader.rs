//! Loading validator manifests from a local file or a URL.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use canary_types::{CanaryError, Result, ValidatorSpec};
use tracing::debug;

/// Where a validator manifest lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecLocation {
    Path(PathBuf),
    Url(String),
}

impl SpecLocation {
    /// Anything containing `://` is treated as a URL.
    pub fn parse(location: &str) -> Self {
        if location.contains("://") {
            SpecLocation::Url(location.to_string())
        } else {
            SpecLocation::Path(PathBuf::from(location))
        }
    }
}

impl std::fmt::Display for SpecLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecLocation::Path(p) => write!(f, "{}", p.display()),
            SpecLocation::Url(u) => f.write_str(u),
        }
    }
}

/// Anything that can produce a validator for a session.
#[async_trait]
pub trait ValidatorSource: Send + Sync {
    async fn load(&self) -> Result<ValidatorSpec>;
}

#[async_trait]
impl ValidatorSource for SpecLocation {
    async fn load(&self) -> Result<ValidatorSpec> {
        load_validator(self).await
    }
}

/// An already-loaded validator, used as-is.
#[async_trait]
impl ValidatorSource for ValidatorSpec {
    async fn load(&self) -> Result<ValidatorSpec> {
        Ok(self.clone())
    }
}

/// Load a validator manifest.
pub async fn load_validator(location: &SpecLocation) -> Result<ValidatorSpec> {
    let bytes = match location {
        SpecLocation::Path(path) => read_file(path).await?,
        SpecLocation::Url(url) => fetch_url(url).await?,
    };
    debug!(%location, bytes = bytes.len(), "Validator manifest read");
    load_validator_from_bytes(&bytes)
}

/// Parse a YAML manifest.
pub fn load_validator_from_bytes(bytes: &[u8]) -> Result<ValidatorSpec> {
    serde_yaml::from_slice(bytes)
        .map_err(|e| CanaryError::Config(format!("invalid validator manifest: {e}")))
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    let filename = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    match tokio::fs::read(&filename).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CanaryError::Config(format!(
            "no such file {}",
            filename.display()
        ))),
        Err(e) => Err(e.into()),
    }
}

async fn fetch_url(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::get(url)
        .await
        .map_err(|e| CanaryError::Config(format!("failed to fetch {url}: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(CanaryError::Config(format!(
            "failed to fetch {url}: HTTP {status}"
        )));
    }

    let body = resp
        .bytes()
        .await
        .map_err(|e| CanaryError::Config(format!("failed to read body from {url}: {e}")))?;
    Ok(body.to_vec())
}
