use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use clawmem_cli::commands::{config, doc, health, index, maintenance, search};
use clawmem_cli::commands::search::SearchMode;
use clawmem_cli::context::AppContext;
use clawmem_cli::output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "clawmem")]
#[command(about = "Personal agent-memory engine: content-addressable store, retrieval, and A-MEM enrichment")]
#[command(version)]
struct Cli {
    /// Index configuration file (defaults to ~/.config/clawmem/index.yml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the database path (same effect as INDEX_PATH)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index configured collections
    Index {
        /// Only index this collection
        #[arg(long)]
        collection: Option<String>,
    },
    /// Search the index
    Search {
        query: String,
        #[arg(long, value_enum, default_value_t = SearchMode::Hybrid)]
        mode: SearchMode,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Restrict results to a single configured collection
        #[arg(long)]
        collection: Option<String>,
    },
    /// Look up a single document
    Doc {
        /// Virtual path, `#`-docid, or fuzzy file path
        reference: String,
    },
    /// Show resolved configuration
    Config,
    /// Store and gateway diagnostics
    Health,
    /// Reclaim space: remove orphaned rows then VACUUM the database
    Vacuum,
    /// Run one consolidation batch (§4.10)
    Consolidate,
    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let ctx = AppContext::open(cli.config.as_ref(), cli.db.as_ref()).await?;
    let stdout = io::stdout();

    match cli.command {
        Commands::Index { collection } => index::run(&ctx, collection.as_deref()).await?.write(stdout, cli.format)?,
        Commands::Search { query, mode, limit, collection } => {
            search::run(&ctx, &query, mode, limit, collection.as_deref()).await?.write(stdout, cli.format)?
        }
        Commands::Doc { reference } => doc::run(&ctx, &reference).await?.write(stdout, cli.format)?,
        Commands::Config => config::run(&ctx).write(stdout, cli.format)?,
        Commands::Health => health::run(&ctx).await?.write(stdout, cli.format)?,
        Commands::Vacuum => maintenance::run_vacuum(&ctx).await?.write(stdout, cli.format)?,
        Commands::Consolidate => maintenance::run_consolidate(&ctx).await?.write(stdout, cli.format)?,
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
