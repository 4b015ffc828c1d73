use chrono::{DateTime, Utc};

use crate::error::CheckError;

/// Final outcome of one check; produced exactly once per check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub name: String,
    pub description: String,
    pub passed: bool,
    pub error: Option<CheckError>,
    pub completed_at: DateTime<Utc>,
}

impl CheckResult {
    pub fn new(name: &str, description: &str, outcome: Result<bool, CheckError>) -> Self {
        let (passed, error) = match outcome {
            Ok(passed) => (passed, None),
            Err(e) => (false, Some(e)),
        };
        Self {
            name: name.to_string(),
            description: description.to_string(),
            passed,
            error,
            completed_at: Utc::now(),
        }
    }

    /// The error, if it must abort the session.
    pub fn fatal_error(&self) -> Option<&CheckError> {
        self.error.as_ref().filter(|e| e.is_fatal())
    }

    /// Short status label: `passed`, `failed` or `error - <message>`.
    pub fn status_label(&self) -> String {
        match &self.error {
            Some(e) => format!("error - {e}"),
            None if self.passed => "passed".to_string(),
            None => "failed".to_string(),
        }
    }
}
