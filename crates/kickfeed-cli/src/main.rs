use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use kickfeed::output::{self, OutputPaths};
use kickfeed::{DataTable, FetchMeta, fantasy, valuations};

#[derive(Parser)]
#[command(name = "kickfeed")]
#[command(about = "Premier League data feed scraper and publisher", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
struct PublishArgs {
    #[arg(
        long,
        value_name = "DIR",
        default_value = "data_stage",
        help = "Directory for the staged full-fidelity CSV"
    )]
    stage_dir: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        default_value = "public",
        help = "Directory for the public JSON and metadata files"
    )]
    public_dir: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value = "text",
        help = "What to print after publishing"
    )]
    format: OutputFormat,
}

impl PublishArgs {
    fn paths(&self) -> OutputPaths {
        OutputPaths::new(&self.stage_dir, &self.public_dir)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape current Premier League club valuations and publish the feed
    ClubValues {
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Fetch the fantasy bootstrap API and publish the full player table
    Fantasy {
        #[command(flatten)]
        publish: PublishArgs,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn report(args: &PublishArgs, table: &DataTable, meta: &FetchMeta, unit: &str) {
    match args.format {
        OutputFormat::Json => serialize_json(&table.to_records()),
        OutputFormat::Text => println!("Update complete: {} {}", meta.row_count, unit),
    }
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::ClubValues { publish } => {
            let scraper = valuations::WebScraper::new().unwrap_or_else(|e| {
                log::error!("Error creating scraper: {}", e);
                process::exit(1);
            });

            let (table, meta) = scraper.fetch_club_values().unwrap_or_else(|e| {
                log::error!("Error fetching club values: {}", e);
                process::exit(1);
            });

            output::publish(&publish.paths(), &valuations::FILES, &table, &meta).unwrap_or_else(
                |e| {
                    log::error!("Error publishing club values: {}", e);
                    process::exit(1);
                },
            );

            report(&publish, &table, &meta, "clubs");
        }

        Commands::Fantasy { publish } => {
            let scraper = fantasy::WebScraper::new().unwrap_or_else(|e| {
                log::error!("Error creating scraper: {}", e);
                process::exit(1);
            });

            let (table, meta) = scraper.fetch_elements().unwrap_or_else(|e| {
                log::error!("Error fetching bootstrap data: {}", e);
                process::exit(1);
            });

            output::publish(&publish.paths(), &fantasy::FILES, &table, &meta).unwrap_or_else(
                |e| {
                    log::error!("Error publishing bootstrap data: {}", e);
                    process::exit(1);
                },
            );

            report(&publish, &table, &meta, "players");
        }
    }
}
