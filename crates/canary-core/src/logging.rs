use std::path::Path;

use canary_types::{CanaryError, Result};
use tracing_appender::rolling;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the tracing/logging system.
///
/// Console output goes to stderr so it never interleaves with progress on
/// stdout. `RUST_LOG` takes precedence over `log_level`. A `log_file` adds a
/// daily rolling file layer without ANSI colors.
pub fn init_logging(log_level: &str, log_file: Option<&Path>, structured: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console: BoxedLayer = if structured {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_ansi(true)
            .boxed()
    };

    let mut layers = vec![console];
    if let Some(path) = log_file {
        layers.push(file_layer(path, structured));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| CanaryError::Internal(format!("logging already initialized: {e}")))
}

fn file_layer(log_path: &Path, structured: bool) -> BoxedLayer {
    let dir = log_path.parent().unwrap_or(Path::new("."));
    let filename = log_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "canary.log".to_string());

    let appender = rolling::daily(dir, &filename);
    if structured {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(appender)
            .with_target(true)
            .with_ansi(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(appender)
            .with_target(true)
            .with_ansi(false)
            .boxed()
    }
}
