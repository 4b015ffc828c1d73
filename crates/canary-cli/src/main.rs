use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use canary_config::{Config, SpecLocation};
use canary_core::{
    init_logging, DockerFactory, GracefulShutdown, KeepAlive, Reporter, SessionOptions,
    ValidationSession,
};
use canary_tui::{stdout_is_tty, HeadlessReporter, InteractiveReporter, ReportOptions, Theme, ThemeName};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info, warn};

/// Failed validation.
const EXIT_FAILED: u8 = 1;
/// The validation could not run: bad manifest, runtime or image problem.
const EXIT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(
    name = "canary",
    about = "Container Canary - validate container images against platform requirements",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an image against a validator manifest
    Validate {
        /// Image to validate
        image: String,

        /// Validator manifest, a local path or a URL
        #[arg(short, long)]
        file: String,

        /// Keep the container running if validation fails
        #[arg(long)]
        debug: bool,

        /// Seconds to wait for the container to start (overrides CANARY_STARTUP_TIMEOUT)
        #[arg(long)]
        startup_timeout: Option<u64>,

        /// Color theme for the interactive display: ansi or plain
        #[arg(long, default_value = "ansi")]
        theme: String,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Validate {
            image,
            file,
            debug,
            startup_timeout,
            theme,
        } => validate(image, file, debug, startup_timeout, theme).await,
        Commands::Version => {
            print_version();
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn print_version() {
    println!("Container Canary");
    println!(" Version:         {}", env!("CARGO_PKG_VERSION"));
    println!(
        " OS/Arch:         {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

async fn validate(
    image: String,
    file: String,
    debug: bool,
    startup_timeout: Option<u64>,
    theme: String,
) -> anyhow::Result<ExitCode> {
    // 1. Config and logging
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(secs) = startup_timeout {
        config.startup_timeout = secs;
    }
    init_logging(
        &config.log_level,
        config.log_file.as_deref(),
        config.structured_logs(),
    )
    .context("Failed to initialize logging")?;
    let theme_name = ThemeName::parse(&theme)
        .with_context(|| format!("unknown theme '{theme}', expected 'ansi' or 'plain'"))?;
    debug!(runtime = %config.runtime, startup_timeout = config.startup_timeout, "Configuration loaded");

    // 2. Interrupts
    let shutdown = Arc::new(GracefulShutdown::new());
    let signal_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = shutdown.wait_for_signal().await {
                warn!(error = %e, "Could not install signal handlers");
            }
        })
    };

    // 3. Reporter: live display on a terminal, plain lines otherwise
    let tty = stdout_is_tty();
    let report_options = ReportOptions {
        interactive: tty,
        debug,
        runtime: config.runtime.clone(),
    };
    let reporter: Box<dyn Reporter> = if tty {
        match InteractiveReporter::stdout(report_options.clone(), Theme::from_name(theme_name)) {
            Ok(r) => Box::new(r),
            Err(e) => {
                warn!(error = %e, "Interactive display unavailable, using plain output");
                Box::new(HeadlessReporter::stdout(report_options))
            }
        }
    } else {
        Box::new(HeadlessReporter::stdout(report_options))
    };

    // 4. Session
    let mut options = SessionOptions::new(&image, &config);
    options.debug = debug;
    options.keep_alive = if tty {
        KeepAlive::Block
    } else {
        KeepAlive::Detach
    };

    let factory = Arc::new(DockerFactory::new(&config));
    let location = SpecLocation::parse(&file);
    info!(%image, validator = %location, "Starting validation");

    let mut session = ValidationSession::new(options, factory, reporter);
    let outcome = session.run(&location, &shutdown).await;
    signal_task.abort();

    // Errors were already shown by the reporter
    match outcome {
        Ok(outcome) if outcome.passed => Ok(ExitCode::SUCCESS),
        Ok(outcome) => {
            info!(
                interrupted = outcome.interrupted,
                kept_alive = outcome.kept_alive,
                container = %outcome.container_name,
                "Validation failed"
            );
            Ok(ExitCode::from(EXIT_FAILED))
        }
        Err(e) => {
            error!(error = %e, setup = e.is_setup_failure(), "Validation errored");
            Ok(ExitCode::from(EXIT_ERROR))
        }
    }
}
