use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};
use structured_logger::json::new_writer;
use structured_logger::Builder;

use landmarks::bundle::ResourceBundle;
use landmarks::config::AppConfig;
use landmarks::data::landmark::LandmarkId;
use landmarks::data::{LandmarkRecord, LandmarkStore};
use landmarks::detail::LandmarkDetail;
use landmarks::dispatch::Dispatcher;
use landmarks::render::MapRenderer;
use landmarks::{Error, Result};

#[derive(Parser)]
#[command(name = "landmarks")]
#[command(about = "Browse landmarks and render their park outlines", long_about = None)]
struct Args {
    /// Path of the JSON configuration file
    #[arg(long, default_value = "landmarks.json")]
    config: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one row per landmark
    List,
    /// Render the map overlay for one landmark
    Show {
        /// Landmark id
        id: LandmarkId,
    },
    /// Render the map overlay for every landmark
    ShowAll,
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn print_row(record: &LandmarkRecord) {
    println!("{:>6}  {:<28} {:<40} {}", record.id, record.name, record.park, record.state);
}

fn show(record: &LandmarkRecord, config: &AppConfig, bundle: &ResourceBundle, dispatcher: &Dispatcher) -> Result<()> {
    let detail = LandmarkDetail::open(record, &config.map_options(), bundle, dispatcher)?;
    let renderer = MapRenderer::new(config.background_color);
    let image_path = detail.export(&renderer, &config.output_path)?;
    println!("{}  {}", record.name, image_path.display());
    detail.close()
}

fn run(args: &Args) -> Result<()> {
    let config = AppConfig::load(&args.config)?;
    let bundle = ResourceBundle::open(&config.bundle_path)?;
    let store = LandmarkStore::load(&bundle)?;

    match &args.command {
        Command::List => {
            for record in store.all() {
                print_row(record);
            }
        },
        Command::Show { id } => {
            let record = store
                .get(*id)
                .ok_or_else(|| Error::resource_not_found(format!("no landmark with id {}", id)))?;
            let dispatcher = Dispatcher::new(config.worker_threads)?;
            show(record, &config, &bundle, &dispatcher)?;
        },
        Command::ShowAll => {
            let dispatcher = Dispatcher::new(config.worker_threads)?;
            for record in store.all() {
                show(record, &config, &bundle, &dispatcher)?;
            }
        },
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(&args.log_level);

    match run(&args) {
        Ok(()) => {
            info!("Done");
            ExitCode::SUCCESS
        },
        Err(err) => {
            let kind = err.kind.to_string();
            error!(kind = kind.as_str(), err = err.message.as_str(); "Run failed with error");
            eprintln!("{}", err);
            ExitCode::FAILURE
        },
    }
}
