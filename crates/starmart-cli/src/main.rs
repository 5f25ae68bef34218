use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "starmart", version, about = "Star-schema warehouse service")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "starmart.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API server.
    Serve,

    /// Run the MCP tool server on stdio.
    Mcp,

    /// Create the warehouse tables and load sample data.
    Seed,

    /// Validate a query offline and print the verdict.
    Check {
        /// The SQL text to validate.
        sql: String,

        /// Requested row limit.
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = starmart_core::config::StarmartConfig::load_or_default(&cli.config)?;

    match cli.cmd {
        Command::Serve => commands::serve::run(config).await,
        Command::Mcp => commands::mcp::run(config).await,
        Command::Seed => commands::seed::run(config).await,
        Command::Check { sql, limit } => commands::check::run(config, &sql, limit),
    }
}
