use serde::{Deserialize, Serialize};

/// Snapshot of a container as reported by the runtime's inspect call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub id: String,
    pub running: bool,
    /// Lifecycle status string, e.g. `created`, `running`, `exited`.
    pub status: String,
    pub exit_code: i64,
    /// Full command line used to launch the container, if it was started by us.
    #[serde(default)]
    pub run_command: Option<String>,
}

impl ContainerInfo {
    pub fn has_exited(&self) -> bool {
        self.status == "exited" || self.status == "dead"
    }
}

/// Output of a command run inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutput {
    pub exit_code: i32,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exited_and_dead_count_as_exited() {
        let mut info = ContainerInfo {
            id: "abc".to_string(),
            running: false,
            status: "exited".to_string(),
            exit_code: 1,
            run_command: None,
        };
        assert!(info.has_exited());
        info.status = "dead".to_string();
        assert!(info.has_exited());
        info.status = "created".to_string();
        assert!(!info.has_exited());
    }

    #[test]
    fn exec_output_success_is_zero_exit() {
        let ok = ExecOutput {
            exit_code: 0,
            stdout: "jovyan\n".to_string(),
            stderr: String::new(),
        };
        let failed = ExecOutput {
            exit_code: 127,
            ..ok.clone()
        };
        assert!(ok.success());
        assert!(!failed.success());
    }
}
