//! Probe executors.
//!
//! A [`Prober`] performs one attempt against a running container and reports
//! whether it passed together with diagnostics. Timing and thresholds are
//! applied by [`crate::engine::execute_check`].

pub mod exec;
pub mod http_get;
pub mod tcp;

use std::time::Duration;

use async_trait::async_trait;
use canary_config::Config;
use canary_types::{CheckError, Probe, ProbeHandler};
use serde_json::{Map, Value};

use crate::container::ContainerHandle;

pub use exec::ExecProber;
pub use http_get::HttpGetProber;
pub use tcp::TcpSocketProber;

/// Outcome of a single probe attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attempt {
    pub passed: bool,
    pub diagnostics: Map<String, Value>,
}

impl Attempt {
    pub fn new(passed: bool) -> Self {
        Self {
            passed,
            diagnostics: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.diagnostics.insert(key.to_string(), value.into());
        self
    }
}

/// One probing mechanism.
///
/// `Ok` with `passed = false` is a normal failed attempt and gets retried.
/// `Err` ends the check immediately.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, container: &dyn ContainerHandle) -> Result<Attempt, CheckError>;

    fn kind(&self) -> &'static str;
}

/// Network settings shared by the HTTP and TCP probers.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub host: String,
    pub tcp_connect_timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            tcp_connect_timeout: Duration::from_secs(1),
        }
    }
}

impl From<&Config> for ProbeSettings {
    fn from(config: &Config) -> Self {
        Self {
            host: config.probe_host.clone(),
            tcp_connect_timeout: config.tcp_connect_timeout(),
        }
    }
}

/// Build the prober for a resolved probe action.
pub fn prober_for(
    handler: ProbeHandler<'_>,
    probe: &Probe,
    settings: &ProbeSettings,
) -> Result<Box<dyn Prober>, CheckError> {
    let prober: Box<dyn Prober> = match handler {
        ProbeHandler::Exec(action) => Box::new(ExecProber::new(action.command.clone())),
        ProbeHandler::HttpGet(action) => Box::new(HttpGetProber::new(
            action,
            &settings.host,
            Duration::from_secs(probe.timeout_seconds.max(1)),
        )?),
        ProbeHandler::TcpSocket(action) => Box::new(TcpSocketProber::new(
            &settings.host,
            action.port,
            settings.tcp_connect_timeout,
        )),
    };
    Ok(prober)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canary_types::{Check, ExecAction, HttpGetAction, Scheme, TcpSocketAction};

    fn check_with(probe: Probe) -> Check {
        Check {
            name: "c".to_string(),
            description: String::new(),
            probe,
        }
    }

    #[test]
    fn prober_for_each_kind() {
        let settings = ProbeSettings::default();

        let exec = check_with(Probe {
            exec: Some(ExecAction {
                command: vec!["true".to_string()],
            }),
            ..Probe::default()
        });
        let p = prober_for(exec.handler().unwrap(), &exec.probe, &settings).unwrap();
        assert_eq!(p.kind(), "exec");

        let http = check_with(Probe {
            http_get: Some(HttpGetAction {
                path: "/".to_string(),
                port: 8888,
                scheme: Scheme::Http,
                http_headers: vec![],
                response_http_headers: vec![],
            }),
            ..Probe::default()
        });
        let p = prober_for(http.handler().unwrap(), &http.probe, &settings).unwrap();
        assert_eq!(p.kind(), "httpGet");

        let tcp = check_with(Probe {
            tcp_socket: Some(TcpSocketAction { port: 8888 }),
            ..Probe::default()
        });
        let p = prober_for(tcp.handler().unwrap(), &tcp.probe, &settings).unwrap();
        assert_eq!(p.kind(), "tcpSocket");
    }

    #[test]
    fn settings_from_config() {
        let cfg = Config {
            probe_host: "127.0.0.1".to_string(),
            tcp_connect_timeout_ms: 200,
            ..Config::default()
        };
        let settings = ProbeSettings::from(&cfg);
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.tcp_connect_timeout, Duration::from_millis(200));
    }

    #[test]
    fn attempt_builder_collects_diagnostics() {
        let a = Attempt::new(true).with("exitCode", 0).with("stdout", "ok");
        assert!(a.passed);
        assert_eq!(a.diagnostics["exitCode"], 0);
        assert_eq!(a.diagnostics["stdout"], "ok");
    }
}
