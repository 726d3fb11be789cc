//! CLI application for invoice digitization.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::{batch, check, config, init_db, list, process, serve};

/// SmartBooks - digitize invoice scans into a searchable database
#[derive(Parser)]
#[command(name = "smartbooks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web interface
    Serve(serve::ServeArgs),

    /// Process a single invoice file
    Process(process::ProcessArgs),

    /// Digitize and store multiple invoice files
    Batch(batch::BatchArgs),

    /// List stored invoices
    List(list::ListArgs),

    /// Create the database tables
    InitDb,

    /// Check that external OCR tools are installed
    Check,

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let builder = FmtSubscriber::builder()
        .with_target(false)
        .with_writer(std::io::stderr);

    // RUST_LOG takes precedence over -v
    if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = builder.with_env_filter(EnvFilter::from_default_env()).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let level = match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        tracing::subscriber::set_global_default(builder.with_max_level(level).finish())?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve(args) => serve::run(args, config_path).await,
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::List(args) => list::run(args, config_path).await,
        Commands::InitDb => init_db::run(config_path).await,
        Commands::Check => check::run(config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
