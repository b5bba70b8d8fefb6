mod cli;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use neurovault::config::NeuroVaultConfig;
use neurovault::server;

#[derive(Parser)]
#[command(name = "neurovault", version, about = "Memory validation and similarity server for AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the server (transport from config: http or stdio)
    Serve,
    /// Run the polling validator against a backend
    Worker {
        /// Run one cycle and exit
        #[arg(long)]
        once: bool,
        /// Poll interval in seconds
        #[arg(long)]
        interval: Option<u64>,
        /// Never submit, only log intended verdicts
        #[arg(long)]
        dry: bool,
        /// Backend base URL
        #[arg(long)]
        backend: Option<String>,
    },
    /// Score one memory in the local database
    Validate {
        id: i64,
        /// Use the external 0–1000 heuristic instead of the internal one
        #[arg(long)]
        external: bool,
        /// Validator name recorded with the verdict
        #[arg(long)]
        validator: Option<String>,
    },
    /// Find memories similar to a query
    Similar {
        query: String,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Show a memory and its validation history
    Inspect { id: i64 },
    /// Show store statistics
    Stats {
        /// Report one agent's activity instead
        #[arg(long)]
        agent: Option<String>,
    },
    /// Run database diagnostics
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = NeuroVaultConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => match config.server.transport.as_str() {
            "http" => server::serve_http(config).await?,
            "stdio" => server::serve_stdio(config).await?,
            other => bail!("unknown transport '{other}' (expected http or stdio)"),
        },
        Command::Worker {
            once,
            interval,
            dry,
            backend,
        } => {
            let args = cli::worker::WorkerArgs {
                once,
                interval,
                dry,
                backend,
            };
            cli::worker::worker(&config, args).await?;
        }
        Command::Validate {
            id,
            external,
            validator,
        } => cli::validate::validate(&config, id, external, validator.as_deref())?,
        Command::Similar { query, limit } => cli::similar::similar(&config, &query, limit)?,
        Command::Inspect { id } => cli::inspect::inspect(&config, id)?,
        Command::Stats { agent } => cli::stats::stats(&config, agent.as_deref())?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
