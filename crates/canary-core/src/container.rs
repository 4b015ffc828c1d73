use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use canary_config::Config;
use canary_types::{
    CanaryError, ContainerInfo, EnvVar, ExecOutput, PortMapping, Result, ValidatorSpec, Volume,
};
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// One container under validation.
///
/// `exec`, `status` and `logs` take `&self` and may be called concurrently
/// from many check tasks; each call is an independent runtime invocation.
#[async_trait]
pub trait ContainerHandle: Send + Sync {
    fn name(&self) -> &str;

    fn image(&self) -> &str;

    /// The launch command line, once started.
    fn run_command(&self) -> Option<&str> {
        None
    }

    /// Fail early when the runtime is missing or unreachable.
    async fn check_runtime(&self) -> Result<()>;

    /// Whether the image is available to the runtime without pulling.
    async fn image_present(&self) -> Result<bool>;

    /// Pull the image; fails with [`CanaryError::ImageNotFound`].
    async fn pull_image(&self) -> Result<()>;

    /// Launch the container and wait until it is running.
    ///
    /// Not idempotent: every call creates a new runtime object.
    async fn start(&mut self, startup_timeout: Duration) -> Result<()>;

    async fn status(&self) -> Result<ContainerInfo>;

    /// Run a command inside the container. A non-zero exit is reported
    /// through [`ExecOutput::exit_code`], not as an error.
    async fn exec(&self, command: &[String]) -> Result<ExecOutput>;

    /// Force-remove the container. Safe after a partial start.
    async fn remove(&self) -> Result<()>;

    async fn logs(&self) -> Result<String>;
}

/// Creates the container handle for a session.
pub trait ContainerFactory: Send + Sync {
    fn create(&self, image: &str, spec: &ValidatorSpec) -> Box<dyn ContainerHandle>;
}

/// Builds [`DockerContainer`]s from the runtime settings in [`Config`].
#[derive(Debug, Clone)]
pub struct DockerFactory {
    runtime: String,
    prefix: String,
    poll_interval: Duration,
}

impl DockerFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            runtime: config.runtime.clone(),
            prefix: config.container_prefix.clone(),
            poll_interval: config.poll_interval(),
        }
    }
}

impl ContainerFactory for DockerFactory {
    fn create(&self, image: &str, spec: &ValidatorSpec) -> Box<dyn ContainerHandle> {
        let mut container = DockerContainer::new(&self.runtime, &self.prefix, image, spec);
        container.poll_interval = self.poll_interval;
        Box::new(container)
    }
}

/// A container driven through a docker-compatible CLI.
#[derive(Debug, Clone)]
pub struct DockerContainer {
    pub name: String,
    pub image: String,
    pub runtime: String,
    pub env: Vec<EnvVar>,
    pub ports: Vec<PortMapping>,
    pub volumes: Vec<Volume>,
    pub command: Vec<String>,
    pub run_options: Vec<String>,
    pub poll_interval: Duration,
    run_command: Option<String>,
}

impl DockerContainer {
    /// Create a handle (does not start the container).
    pub fn new(runtime: &str, prefix: &str, image: &str, spec: &ValidatorSpec) -> Self {
        let name = format!(
            "{}{}",
            prefix,
            uuid::Uuid::new_v4()
                .to_string()
                .split('-')
                .next()
                .unwrap_or("0000")
        );

        Self {
            name,
            image: image.to_string(),
            runtime: runtime.to_string(),
            env: spec.env.clone(),
            ports: spec.ports.clone(),
            volumes: spec.volumes.clone(),
            command: spec.command.clone(),
            run_options: spec.docker_run_options.clone(),
            poll_interval: Duration::from_secs(1),
            run_command: None,
        }
    }

    /// Build `run` arguments (without the runtime binary itself).
    pub fn build_run_args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            self.name.clone(),
        ];

        for e in &self.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", e.name, e.value));
        }

        for p in &self.ports {
            args.push("-p".to_string());
            args.push(format!(
                "{}:{}/{}",
                p.port,
                p.port,
                p.protocol.to_lowercase()
            ));
        }

        for v in &self.volumes {
            args.push("-v".to_string());
            match &v.path {
                Some(host) if !host.is_empty() => args.push(format!("{host}:{}", v.mount_path)),
                _ => args.push(v.mount_path.clone()),
            }
        }

        args.extend(self.run_options.iter().cloned());
        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());

        args
    }

    async fn runtime_output<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        Command::new(&self.runtime)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_error(&self.runtime, e))
    }

    /// Poll `inspect` until the container runs, exits or the timeout passes.
    async fn wait_until_running(&self, startup_timeout: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            let info = self.status().await?;
            if info.has_exited() {
                warn!(container = %self.name, exit_code = info.exit_code, "Container exited during startup");
                self.log_start_diagnostics().await;
                return Err(CanaryError::ContainerStart(
                    "container failed to start".to_string(),
                ));
            }
            if info.running {
                info!(container = %self.name, id = %info.id, "Container running");
                return Ok(());
            }
            if started.elapsed() > startup_timeout {
                warn!(container = %self.name, status = %info.status, "Container startup timed out");
                self.log_start_diagnostics().await;
                return Err(CanaryError::StartTimeout(startup_timeout.as_secs()));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn log_start_diagnostics(&self) {
        match self.logs().await {
            Ok(logs) => debug!(container = %self.name, logs = %logs, "Container logs"),
            Err(e) => warn!(container = %self.name, error = %e, "Could not read container logs"),
        }
    }
}

#[async_trait]
impl ContainerHandle for DockerContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn image(&self) -> &str {
        &self.image
    }

    fn run_command(&self) -> Option<&str> {
        self.run_command.as_deref()
    }

    async fn check_runtime(&self) -> Result<()> {
        check_runtime_available(&self.runtime).await
    }

    async fn image_present(&self) -> Result<bool> {
        let output = self
            .runtime_output(["image", "inspect", self.image.as_str()])
            .await?;
        Ok(output.status.success())
    }

    async fn pull_image(&self) -> Result<()> {
        info!(image = %self.image, "Pulling image");
        let output = self.runtime_output(["pull", self.image.as_str()]).await?;
        if output.status.success() {
            Ok(())
        } else {
            warn!(
                image = %self.image,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Image pull failed"
            );
            Err(CanaryError::ImageNotFound(self.image.clone()))
        }
    }

    async fn start(&mut self, startup_timeout: Duration) -> Result<()> {
        let args = self.build_run_args();
        self.run_command = Some(format!("{} {}", self.runtime, args.join(" ")));
        debug!(container = %self.name, args = ?args, "Launching container");

        let output = self.runtime_output(&args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            // The run may have created the container before failing
            if let Err(e) = self.remove().await {
                warn!(container = %self.name, error = %e, "Cleanup after failed run");
            }
            return Err(CanaryError::ContainerStart(format!(
                "container failed to start: {stderr}"
            )));
        }

        let result = self.wait_until_running(startup_timeout).await;
        if result.is_err() {
            if let Err(e) = self.remove().await {
                warn!(container = %self.name, error = %e, "Cleanup after failed start");
            }
        }
        result
    }

    async fn status(&self) -> Result<ContainerInfo> {
        let output = self.runtime_output(["inspect", self.name.as_str()]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("No such") || stderr.contains("no such") {
                return Err(CanaryError::ContainerNotFound(self.name.clone()));
            }
            return Err(CanaryError::Container(format!(
                "Failed to inspect container: {}",
                stderr.trim()
            )));
        }

        let mut info = parse_inspect_output(&String::from_utf8_lossy(&output.stdout))?;
        info.run_command = self.run_command.clone();
        Ok(info)
    }

    async fn exec(&self, command: &[String]) -> Result<ExecOutput> {
        let output = self
            .runtime_output(
                ["exec", self.name.as_str()]
                    .into_iter()
                    .map(str::to_string)
                    .chain(command.iter().cloned()),
            )
            .await?;

        Ok(ExecOutput {
            // None means the process was killed by a signal
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn remove(&self) -> Result<()> {
        let output = self.runtime_output(["rm", "-f", self.name.as_str()]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Ignore "no such container" errors
            if !stderr.contains("No such container") {
                return Err(CanaryError::Container(format!(
                    "Failed to remove container {}: {}",
                    self.name,
                    stderr.trim()
                )));
            }
        }

        debug!(container = %self.name, "Container removed");
        Ok(())
    }

    async fn logs(&self) -> Result<String> {
        let output = self.runtime_output(["logs", self.name.as_str()]).await?;
        let mut logs = String::from_utf8_lossy(&output.stdout).to_string();
        logs.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(logs)
    }
}

/// Check that the runtime binary exists and can talk to its daemon.
pub async fn check_runtime_available(runtime: &str) -> Result<()> {
    let output = Command::new(runtime)
        .arg("ps")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| spawn_error(runtime, e))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(CanaryError::RuntimeUnavailable(format!(
            "{runtime} requires root privileges or a running daemon: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

fn spawn_error(runtime: &str, e: std::io::Error) -> CanaryError {
    if e.kind() == std::io::ErrorKind::NotFound {
        CanaryError::RuntimeUnavailable(format!("{runtime} is missing"))
    } else {
        CanaryError::Container(format!("Failed to run {runtime}: {e}"))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectRecord {
    #[serde(default)]
    id: String,
    state: InspectState,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectState {
    #[serde(default)]
    status: String,
    #[serde(default)]
    running: bool,
    #[serde(default)]
    exit_code: i64,
}

/// Parse `inspect` JSON, which must describe exactly one container.
pub fn parse_inspect_output(stdout: &str) -> Result<ContainerInfo> {
    let records: Vec<InspectRecord> = serde_json::from_str(stdout.trim())?;
    if records.len() != 1 {
        return Err(CanaryError::Internal(format!(
            "expected 1 container, got {}",
            records.len()
        )));
    }

    let record = records.into_iter().next().ok_or_else(|| {
        CanaryError::Internal("inspect output vanished while parsing".to_string())
    })?;
    Ok(ContainerInfo {
        id: record.id,
        running: record.state.running,
        status: record.state.status,
        exit_code: record.state.exit_code,
        run_command: None,
    })
}
