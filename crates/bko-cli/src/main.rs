use clap::Parser;

mod cli;
mod commands;
mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = cli.resolve_config()?;
    telemetry::init(&cli, config.environment)?;
    commands::run_command(cli, config).await
}
