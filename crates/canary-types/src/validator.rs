//! In-memory validator model.
//!
//! Field names follow the YAML manifests (`initialDelaySeconds`, `httpGet`,
//! `dockerRunOptions`, ...). Timing fields fall back to Kubernetes-style
//! defaults when absent.

use serde::{Deserialize, Serialize};

use crate::error::CheckError;

/// A platform contract: launch parameters plus the checks to run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Link to where the requirements are documented.
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    /// Overrides the image command when non-empty.
    #[serde(default)]
    pub command: Vec<String>,
    /// Extra flags passed verbatim to the runtime `run` invocation.
    #[serde(default)]
    pub docker_run_options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "TCP".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Path inside the container.
    pub mount_path: String,
    /// Host path; an anonymous volume is used when omitted.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub probe: Probe,
}

impl Check {
    /// Resolve the single configured probe action.
    pub fn handler(&self) -> Result<ProbeHandler<'_>, CheckError> {
        let mut found = Vec::with_capacity(3);
        if let Some(action) = &self.probe.exec {
            found.push(ProbeHandler::Exec(action));
        }
        if let Some(action) = &self.probe.http_get {
            found.push(ProbeHandler::HttpGet(action));
        }
        if let Some(action) = &self.probe.tcp_socket {
            found.push(ProbeHandler::TcpSocket(action));
        }

        match found.len() {
            0 => Err(CheckError::NoProbe(self.name.clone())),
            1 => Ok(found.remove(0)),
            _ => Err(CheckError::MultipleProbes {
                name: self.name.clone(),
                kinds: found
                    .iter()
                    .map(ProbeHandler::kind)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

/// Probe timing plus exactly one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    #[serde(default)]
    pub initial_delay_seconds: u64,
    #[serde(default = "default_period")]
    pub period_seconds: u64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_threshold")]
    pub success_threshold: u32,
    #[serde(default = "default_threshold")]
    pub failure_threshold: u32,
    /// Accepted for manifest compatibility; not used by teardown.
    #[serde(default = "default_grace_period")]
    pub termination_grace_period_seconds: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_get: Option<HttpGetAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_socket: Option<TcpSocketAction>,
}

fn default_period() -> u64 {
    1
}

fn default_timeout() -> u64 {
    30
}

fn default_threshold() -> u32 {
    1
}

fn default_grace_period() -> u64 {
    30
}

impl Default for Probe {
    fn default() -> Self {
        Self {
            initial_delay_seconds: 0,
            period_seconds: default_period(),
            timeout_seconds: default_timeout(),
            success_threshold: default_threshold(),
            failure_threshold: default_threshold(),
            termination_grace_period_seconds: default_grace_period(),
            exec: None,
            http_get: None,
            tcp_socket: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecAction {
    #[serde(default)]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpGetAction {
    #[serde(default)]
    pub path: String,
    pub port: u16,
    #[serde(default)]
    pub scheme: Scheme,
    /// Headers sent with the request.
    #[serde(default)]
    pub http_headers: Vec<HttpHeader>,
    /// Headers that must be present in the response with these exact values.
    #[serde(default)]
    pub response_http_headers: Vec<HttpHeader>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheme {
    #[default]
    #[serde(rename = "HTTP", alias = "http")]
    Http,
    #[serde(rename = "HTTPS", alias = "https")]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpSocketAction {
    pub port: u16,
}

/// The one active probe action of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeHandler<'a> {
    Exec(&'a ExecAction),
    HttpGet(&'a HttpGetAction),
    TcpSocket(&'a TcpSocketAction),
}

impl ProbeHandler<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeHandler::Exec(_) => "exec",
            ProbeHandler::HttpGet(_) => "httpGet",
            ProbeHandler::TcpSocket(_) => "tcpSocket",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_defaults_apply_when_fields_absent() {
        let probe: Probe = serde_yaml::from_str("exec:\n  command: [\"true\"]\n").unwrap();
        assert_eq!(probe.initial_delay_seconds, 0);
        assert_eq!(probe.period_seconds, 1);
        assert_eq!(probe.timeout_seconds, 30);
        assert_eq!(probe.success_threshold, 1);
        assert_eq!(probe.failure_threshold, 1);
        assert_eq!(probe.termination_grace_period_seconds, 30);
        assert_eq!(probe, Probe { exec: probe.exec.clone(), ..Probe::default() });
    }

    #[test]
    fn validator_parses_manifest_fields() {
        let yaml = r#"
name: kubeflow
description: Kubeflow notebooks
documentation: https://www.kubeflow.org/docs/components/notebooks/container-images/
env:
  - name: NB_PREFIX
    value: /hub/jovyan
ports:
  - port: 8888
    protocol: TCP
volumes:
  - mountPath: /home/jovyan
  - mountPath: /data
    path: /tmp/data
command: ["jupyter", "lab"]
dockerRunOptions: ["--user", "1000"]
checks:
  - name: user
    description: User is jovyan
    probe:
      exec:
        command: ["/bin/sh", "-c", "[ $(whoami) = jovyan ]"]
  - name: http
    description: Exposes an HTTP interface on port 8888
    probe:
      httpGet:
        path: /hub/jovyan/api
        port: 8888
        httpHeaders:
          - name: User-Agent
            value: canary
        responseHttpHeaders:
          - name: Access-Control-Allow-Origin
            value: "*"
      initialDelaySeconds: 10
      periodSeconds: 2
      failureThreshold: 4
"#;
        let spec: ValidatorSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.name, "kubeflow");
        assert_eq!(spec.env[0].name, "NB_PREFIX");
        assert_eq!(spec.ports[0].port, 8888);
        assert_eq!(spec.volumes[0].path, None);
        assert_eq!(spec.volumes[1].path.as_deref(), Some("/tmp/data"));
        assert_eq!(spec.command, vec!["jupyter", "lab"]);
        assert_eq!(spec.docker_run_options, vec!["--user", "1000"]);
        assert_eq!(spec.checks.len(), 2);

        let http = &spec.checks[1];
        assert_eq!(http.probe.initial_delay_seconds, 10);
        assert_eq!(http.probe.period_seconds, 2);
        assert_eq!(http.probe.failure_threshold, 4);
        assert_eq!(http.probe.success_threshold, 1);
        match http.handler().unwrap() {
            ProbeHandler::HttpGet(action) => {
                assert_eq!(action.scheme, Scheme::Http);
                assert_eq!(action.response_http_headers[0].value, "*");
            }
            other => panic!("unexpected handler {}", other.kind()),
        }
    }

    #[test]
    fn port_protocol_defaults_to_tcp() {
        let port: PortMapping = serde_yaml::from_str("port: 80").unwrap();
        assert_eq!(port.protocol, "TCP");
    }

    #[test]
    fn handler_rejects_missing_probe() {
        let check = Check {
            name: "empty".to_string(),
            description: "nothing".to_string(),
            probe: Probe::default(),
        };
        assert_eq!(
            check.handler().unwrap_err(),
            CheckError::NoProbe("empty".to_string())
        );
    }

    #[test]
    fn handler_rejects_multiple_probes() {
        let check = Check {
            name: "double".to_string(),
            description: String::new(),
            probe: Probe {
                exec: Some(ExecAction {
                    command: vec!["true".to_string()],
                }),
                tcp_socket: Some(TcpSocketAction { port: 80 }),
                ..Probe::default()
            },
        };
        let err = check.handler().unwrap_err();
        assert_eq!(
            err.to_string(),
            "check 'double' has more than one probe: exec, tcpSocket"
        );
    }

    #[test]
    fn https_scheme_accepts_either_case() {
        let a: HttpGetAction = serde_yaml::from_str("port: 443\nscheme: HTTPS").unwrap();
        let b: HttpGetAction = serde_yaml::from_str("port: 443\nscheme: https").unwrap();
        assert_eq!(a.scheme, Scheme::Https);
        assert_eq!(b.scheme.as_str(), "https");
    }
}
