//! Point d'entrée CLI pour flood-screen

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use flood_screen::ScreenConfig;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// `.env` du répertoire courant, à défaut celui placé à côté de l'exécutable
fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(".env")));
    if let Some(path) = beside_exe {
        let _ = dotenvy::from_path(path);
    }
}

mod cli;

use cli::Commands;

/// Screening du risque inondation d'adresses (Brisbane City Council)
#[derive(Parser)]
#[command(name = "flood-screen")]
#[command(author, version)]
#[command(about = "Screen property addresses for flood risk using BCC flood datasets")]
#[command(long_about = "Résout le risque inondation d'une adresse par niveaux : métriques BCC par parcelle \
(avec repli au niveau du plan), puis recherche des emprises inondables autour du point géocodé.\n\n\
La configuration vient d'un fichier JSON (--config) ou des variables d'environnement (FLOOD_DATA_ROOT, GEOCODING_PROVIDER, ...).")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Fichier de configuration JSON (défaut : variables d'environnement)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let config = ScreenConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Lookup { addresses, json } => {
            info!(addresses = addresses.len(), "Flood lookup");
            cli::cmd_lookup(&config, &addresses, json).await?;
        }
        Commands::Batch {
            input,
            output,
            report,
            jobs,
        } => {
            info!(input = %input.display(), "Batch screening");
            cli::cmd_batch(&config, &input, output.as_deref(), report.as_deref(), jobs).await?;
        }
        Commands::Zone { lat, lon, buffer } => {
            cli::cmd_zone(&config, lat, lon, buffer)?;
        }
        Commands::ParseLotplan { id } => {
            cli::cmd_parse_lotplan(&config, &id)?;
        }
    }

    Ok(())
}

/// `-q` : warnings seulement, `-v` : debug, `-vv` : trace
fn log_level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::WARN;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// `RUST_LOG` affine ensuite par module
fn init_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::from_default_env().add_directive(log_level(verbose, quiet).into());

    fmt()
        .with_env_filter(filter)
        .with_target(verbose > 0)
        .with_file(false)
        .with_line_number(false)
        .init();
}
