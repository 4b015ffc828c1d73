use async_trait::async_trait;
use canary_types::CheckError;

use super::{Attempt, Prober};
use crate::container::ContainerHandle;

/// Runs a command inside the container; passes on exit code 0.
pub struct ExecProber {
    command: Vec<String>,
}

impl ExecProber {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Prober for ExecProber {
    async fn probe(&self, container: &dyn ContainerHandle) -> Result<Attempt, CheckError> {
        if self.command.is_empty() {
            return Err(CheckError::Evaluation(
                "exec probe command cannot be empty".to_string(),
            ));
        }

        let output = container
            .exec(&self.command)
            .await
            .map_err(|e| CheckError::Evaluation(format!("exec failed: {e}")))?;

        Ok(Attempt::new(output.success())
            .with("exitCode", output.exit_code)
            .with("stdout", output.stdout)
            .with("stderr", output.stderr))
    }

    fn kind(&self) -> &'static str {
        "exec"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeContainer;

    fn prober() -> ExecProber {
        ExecProber::new(vec!["sh".to_string(), "-c".to_string(), "id -u".to_string()])
    }

    #[tokio::test]
    async fn zero_exit_passes() {
        let container = FakeContainer::exiting(&[0]);
        let attempt = prober().probe(&container).await.unwrap();
        assert!(attempt.passed);
        assert_eq!(attempt.diagnostics["exitCode"], 0);
        assert_eq!(attempt.diagnostics["stdout"], "exit 0");
    }

    #[tokio::test]
    async fn nonzero_exit_fails_without_error() {
        let container = FakeContainer::exiting(&[1]);
        let attempt = prober().probe(&container).await.unwrap();
        assert!(!attempt.passed);
        assert_eq!(attempt.diagnostics["exitCode"], 1);
    }

    #[tokio::test]
    async fn exec_call_failure_is_evaluation_error() {
        let container = FakeContainer::failing_exec("container is not running");
        let err = prober().probe(&container).await.unwrap_err();
        assert!(matches!(err, CheckError::Evaluation(_)));
        assert!(err.to_string().contains("container is not running"));
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let container = FakeContainer::exiting(&[0]);
        let err = ExecProber::new(vec![]).probe(&container).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
