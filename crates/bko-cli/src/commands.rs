use std::sync::Arc;

use bko_server::{BucketServer, ServerConfig};
use bko_store::InMemoryRegistry;
use colored::Colorize;
use tracing::{debug, info};

use crate::cli::*;

pub async fn run_command(cli: Cli, config: ServerConfig) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve => cmd_serve(config).await,
        Command::Config => {
            print!("{}", render_config(&config, &cli.format)?);
            Ok(())
        }
    }
}

async fn cmd_serve(config: ServerConfig) -> anyhow::Result<()> {
    debug!(?config, "configuration");
    let registry = Arc::new(InMemoryRegistry::new());
    BucketServer::new(config, registry).serve().await?;
    info!("server stopped");
    Ok(())
}

fn render_config(config: &ServerConfig, format: &OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)? + "\n"),
        OutputFormat::Text => {
            let rows = [
                ("service_name", config.service_name.clone()),
                ("environment", config.environment.to_string()),
                ("bind_addr", config.bind_addr.to_string()),
                ("request_timeout", format!("{}s", config.timeouts.request_secs)),
                ("shutdown_timeout", format!("{}s", config.timeouts.shutdown_secs)),
            ];
            Ok(rows
                .iter()
                .map(|(key, value)| format!("{:<18}{}\n", key.bold(), value.cyan()))
                .collect())
        }
    }
}
