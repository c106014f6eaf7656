use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use inquiry_board::config::BoardToml;

mod cmd;

#[derive(Parser)]
#[command(name = "inquiry-board")]
#[command(version, about = "Kanban board for event inquiries")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to board.toml. Defaults to ./board.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the inquiry API backed by an in-memory store
    Serve {
        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,

        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Simulated latency per store operation, in milliseconds
        #[arg(long)]
        latency_ms: Option<u64>,

        /// JSON file of inquiries to serve instead of the bundled data
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Enable dev mode (permissive CORS, bind all interfaces)
        #[arg(long)]
        dev: bool,
    },
    /// Print the board grouped by phase
    Board {
        /// Board API base URL
        #[arg(long)]
        server: Option<String>,

        /// Search by client name
        #[arg(long)]
        q: Option<String>,

        /// Earliest event date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest event date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Minimum potential value in CHF
        #[arg(long)]
        min: Option<f64>,
    },
    /// Move an inquiry to another phase
    Move {
        /// Inquiry id
        id: String,

        /// Target phase: new, sent_to_hotels, offers_received, completed
        phase: String,

        /// Board API base URL
        #[arg(long)]
        server: Option<String>,
    },
}

fn init_tracing(verbose: bool, log_json: bool) {
    let default = if verbose {
        "inquiry_board=debug"
    } else {
        "inquiry_board=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<BoardToml> {
    let mut config = match &cli.config {
        Some(path) => BoardToml::load(path)?,
        None => {
            let dir = std::env::current_dir().context("Failed to get current directory")?;
            BoardToml::load_or_default(&dir)?
        }
    };
    config
        .apply_process_env()
        .context("Invalid environment override")?;
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Serve {
            port,
            host,
            latency_ms,
            seed,
            dev,
        } => {
            let mut server = config.server_config();
            if let Some(port) = port {
                server.port = *port;
            }
            if let Some(host) = host {
                server.host = host.clone();
            }
            if let Some(ms) = latency_ms {
                server.latency = std::time::Duration::from_millis(*ms);
            }
            server.seed_path = seed.clone();
            server.dev_mode = *dev;
            cmd::cmd_serve(server).await?;
        }
        Commands::Board {
            server,
            q,
            from,
            to,
            min,
        } => {
            let base_url = server.clone().unwrap_or_else(|| config.source.base_url.clone());
            let query = cmd::BoardQuery {
                search: q.clone(),
                date_from: from.clone(),
                date_to: to.clone(),
                min_value: *min,
            };
            cmd::cmd_board(&base_url, query, config.timing()).await?;
        }
        Commands::Move { id, phase, server } => {
            let base_url = server.clone().unwrap_or_else(|| config.source.base_url.clone());
            cmd::cmd_move(&base_url, id, phase).await?;
        }
    }

    Ok(())
}
