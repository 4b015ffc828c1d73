pub mod check;
pub mod container;
pub mod error;
pub mod validator;

// Re-exports for convenience
pub use check::CheckResult;
pub use container::{ContainerInfo, ExecOutput};
pub use error::{CanaryError, CheckError, Result};
pub use validator::{
    Check, EnvVar, ExecAction, HttpGetAction, HttpHeader, PortMapping, Probe, ProbeHandler,
    Scheme, TcpSocketAction, ValidatorSpec, Volume,
};
