pub mod container;
pub mod engine;
pub mod logging;
pub mod probe;
pub mod reporter;
pub mod scheduler;
pub mod session;
pub mod utils;

#[cfg(test)]
mod testing;

pub use container::{
    check_runtime_available, parse_inspect_output, ContainerFactory, ContainerHandle,
    DockerContainer, DockerFactory,
};
pub use engine::{execute_check, ProbeTiming};
pub use logging::init_logging;
pub use probe::{
    prober_for, Attempt, ExecProber, HttpGetProber, ProbeSettings, Prober, TcpSocketProber,
};
pub use reporter::{NoopReporter, RecordingReporter, Reporter, SessionEvent};
pub use scheduler::CheckScheduler;
pub use session::{KeepAlive, SessionOptions, SessionOutcome, SessionState, ValidationSession};
pub use utils::GracefulShutdown;
