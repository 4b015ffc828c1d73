use thiserror::Error;

/// Top-level error type for Container Canary.
#[derive(Error, Debug)]
pub enum CanaryError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The runtime binary is missing or the daemon cannot be reached.
    #[error("Container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("no such image: {0}")]
    ImageNotFound(String),

    #[error("{0}")]
    ContainerStart(String),

    #[error("container failed to start after {0} seconds")]
    StartTimeout(u64),

    #[error("no such container: {0}")]
    ContainerNotFound(String),

    #[error("Container error: {0}")]
    Container(String),

    #[error("check '{name}' errored: {source}")]
    Check {
        name: String,
        #[source]
        source: CheckError,
    },

    /// Broken invariant, e.g. inspect returning other than one record.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CanaryError {
    /// Whether the error happened before any check could run.
    pub fn is_setup_failure(&self) -> bool {
        !matches!(self, CanaryError::Check { .. })
    }
}

/// Convenience type alias.
pub type Result<T> = std::result::Result<T, CanaryError>;

/// Error attached to a single check result.
///
/// Cloneable so it can travel on the results stream and into reporter events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("check '{0}' has no known probes")]
    NoProbe(String),

    #[error("check '{name}' has more than one probe: {kinds}")]
    MultipleProbes { name: String, kinds: String },

    #[error("check timed out after {0} seconds")]
    Timeout(u64),

    #[error("{0}")]
    Evaluation(String),
}

impl CheckError {
    /// Fatal errors abort the whole session; a timeout only fails its check.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CheckError::Timeout(_))
    }
}
