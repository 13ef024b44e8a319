use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use world_map_drawer::config::{self, AppConfig, FileConfig, Overrides};
use world_map_drawer::server;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an HTML map with color-coded population volume and marked
    /// locations of capitals
    Generate(GenerateArgs),
    /// Serve generated maps over HTTP
    Serve(ServeArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Output filepath
    #[arg(value_name = "OUTPUT_PATH")]
    output: PathBuf,

    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "FILE", env = config::CAPITALS_ENV)]
    capitals: Option<PathBuf>,

    #[arg(long, value_name = "FILE", env = config::POPULATION_ENV)]
    population: Option<PathBuf>,

    #[arg(long, allow_negative_numbers = true, env = config::LATITUDE_ENV)]
    latitude: Option<f64>,

    #[arg(long, allow_negative_numbers = true, env = config::LONGITUDE_ENV)]
    longitude: Option<f64>,

    #[arg(long, env = config::LOG_LEVEL_ENV)]
    log_level: Option<String>,
}

#[derive(Args)]
struct ServeArgs {
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding the generated maps
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    #[arg(short, long)]
    port: Option<u16>,

    #[arg(long, env = config::LOG_LEVEL_ENV)]
    log_level: Option<String>,
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = config::level_filter(level).context("Invalid log level setting")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter.to_string()))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Values from `.env` must be in place before clap reads its env fallbacks.
    config::load_env_file(None)?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => {
            let file = FileConfig::load(args.config.as_deref())?;
            let overrides = Overrides {
                capitals: args.capitals,
                population: args.population,
                latitude: args.latitude,
                longitude: args.longitude,
                log_level: args.log_level,
            };
            let app_config = AppConfig::resolve(file, overrides, args.output)?;

            init_logging(&app_config.log_level)?;
            debug!("Configuration OK");

            world_map_drawer::generate(&app_config).context("Map generation failed")?;
        }
        Commands::Serve(args) => {
            let file = FileConfig::load(args.config.as_deref())?;
            let level = args
                .log_level
                .as_deref()
                .or(file.logging.level.as_deref())
                .unwrap_or("info");
            init_logging(level)?;

            let dir = args
                .dir
                .or(file.server.dir)
                .unwrap_or_else(|| PathBuf::from("."));
            let port = args.port.unwrap_or(file.server.port);

            server::start_server(dir, port).await?;
        }
    }

    Ok(())
}
