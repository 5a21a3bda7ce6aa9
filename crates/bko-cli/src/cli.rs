use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use bko_server::{Environment, ServerConfig};
use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "bko",
    about = "Bucket organizer: object membership registry over HTTP",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Force debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Log level (off, trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL")]
    pub log_level: Option<LevelFilter>,

    #[command(flatten)]
    pub overrides: ConfigArgs,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve,
    /// Print the resolved configuration
    Config,
}

/// Configuration sources layered over the defaults: TOML file first, then
/// flags or their environment variables.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// TOML config file
    #[arg(long, global = true, env = "BKO_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, env = "SERVICE_NAME")]
    pub service_name: Option<String>,

    /// Deployment environment (`prod`/`production`, anything else is development)
    #[arg(long, global = true, env = "ENV")]
    pub environment: Option<Environment>,

    #[arg(long, global = true, env = "SERVER_HOST")]
    pub host: Option<IpAddr>,

    #[arg(long, global = true, env = "SERVER_PORT")]
    pub port: Option<u16>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "SERVER_TIMEOUT_REQUEST", value_name = "SECS")]
    pub request_timeout: Option<u64>,

    /// Graceful shutdown timeout in seconds
    #[arg(long, global = true, env = "SERVER_TIMEOUT_SHUTDOWN", value_name = "SECS")]
    pub shutdown_timeout: Option<u64>,
}

impl ConfigArgs {
    pub fn resolve(&self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ServerConfig::default(),
        };

        if let Some(name) = &self.service_name {
            config.service_name = name.clone();
        }
        if let Some(environment) = self.environment {
            config.environment = environment;
        }
        if let Some(host) = self.host {
            config.bind_addr.set_ip(host);
        }
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        if let Some(secs) = self.request_timeout {
            config.timeouts.request_secs = secs;
        }
        if let Some(secs) = self.shutdown_timeout {
            config.timeouts.shutdown_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Cli {
    pub fn resolve_config(&self) -> anyhow::Result<ServerConfig> {
        self.overrides.resolve()
    }
}
