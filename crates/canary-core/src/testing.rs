//! In-memory container used by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use canary_types::{CanaryError, ContainerInfo, ExecOutput, Result};

use crate::container::ContainerHandle;

/// Replays scripted exec results; once the script runs out the last entry repeats.
pub struct FakeContainer {
    script: Mutex<VecDeque<Result<ExecOutput>>>,
    last: Mutex<Option<ExecOutput>>,
    pub execs: AtomicUsize,
    pub removals: AtomicUsize,
}

impl FakeContainer {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            execs: AtomicUsize::new(0),
            removals: AtomicUsize::new(0),
        }
    }

    pub fn exiting(codes: &[i32]) -> Self {
        let fake = Self::new();
        {
            let mut script = fake.script.lock().unwrap();
            for &code in codes {
                script.push_back(Ok(ExecOutput {
                    exit_code: code,
                    stdout: format!("exit {code}"),
                    stderr: String::new(),
                }));
            }
        }
        fake
    }

    pub fn failing_exec(message: &str) -> Self {
        let fake = Self::new();
        fake.script
            .lock()
            .unwrap()
            .push_back(Err(CanaryError::Container(message.to_string())));
        fake
    }
}

#[async_trait]
impl ContainerHandle for FakeContainer {
    fn name(&self) -> &str {
        "fake"
    }

    fn image(&self) -> &str {
        "fake:latest"
    }

    async fn check_runtime(&self) -> Result<()> {
        Ok(())
    }

    async fn image_present(&self) -> Result<bool> {
        Ok(true)
    }

    async fn pull_image(&self) -> Result<()> {
        Ok(())
    }

    async fn start(&mut self, _startup_timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn status(&self) -> Result<ContainerInfo> {
        Ok(ContainerInfo {
            id: "fake".to_string(),
            running: true,
            status: "running".to_string(),
            exit_code: 0,
            run_command: None,
        })
    }

    async fn exec(&self, _command: &[String]) -> Result<ExecOutput> {
        self.execs.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(out)) => {
                *self.last.lock().unwrap() = Some(out.clone());
                Ok(out)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| CanaryError::Container("no scripted exec".to_string())),
        }
    }

    async fn remove(&self) -> Result<()> {
        self.removals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn logs(&self) -> Result<String> {
        Ok(String::new())
    }
}
