//! Log subscriber setup.
//!
//! ERROR events go to stderr, everything else to stdout. Production emits
//! JSON lines; development emits human-readable lines.

use anyhow::Context;
use bko_server::Environment;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::Cli;

/// Crates whose debug output drowns out ours.
const QUIET_DIRECTIVES: &str = "hyper=info,h2=info";

pub fn init(cli: &Cli, environment: Environment) -> anyhow::Result<()> {
    let filter = env_filter(cli.verbose, cli.log_level, environment)?;
    let writer = std::io::stderr
        .with_max_level(Level::ERROR)
        .or_else(std::io::stdout);
    let registry = tracing_subscriber::registry().with(filter);

    if environment.is_production() {
        registry
            .with(fmt::layer().json().with_current_span(true).with_writer(writer))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(writer))
            .try_init()?;
    }
    Ok(())
}

/// `-v` wins, then `RUST_LOG`, then `--log-level`/`LOG_LEVEL`, then the
/// environment default.
fn env_filter(
    verbose: bool,
    log_level: Option<LevelFilter>,
    environment: Environment,
) -> anyhow::Result<EnvFilter> {
    if !verbose {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
    }
    let directives = format!("{},{QUIET_DIRECTIVES}", base_level(verbose, log_level, environment));
    EnvFilter::try_new(&directives).with_context(|| format!("invalid log level: {directives}"))
}

fn base_level(
    verbose: bool,
    log_level: Option<LevelFilter>,
    environment: Environment,
) -> LevelFilter {
    match (verbose, log_level) {
        (true, _) => LevelFilter::DEBUG,
        (false, Some(level)) => level,
        (false, None) if environment.is_production() => LevelFilter::INFO,
        (false, None) => LevelFilter::DEBUG,
    }
}
