//! Command-line front end for ocrlabel projects.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ocrlabel::config::{AppConfig, LogLevel};
use ocrlabel::export::ExportOptions;
use ocrlabel::session::{Session, SessionError};

#[derive(Parser, Debug)]
#[command(name = "ocrlabel", version, about = "OCR annotation project tool")]
struct Cli {
    /// Log verbosity (overrides the config file; RUST_LOG overrides both)
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the confirmed images of a project as training datasets
    Export {
        /// Project directory containing Label.txt and the images
        dir: PathBuf,

        /// Exporter ids (det, det-mm, rec, rec-mm, kie); defaults to the
        /// configured detection and recognition dialects plus kie in KIE mode
        #[arg(short, long = "format")]
        formats: Vec<String>,

        /// Output directory (defaults to the project directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show label counts of a project
    Status {
        /// Project directory
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_or_default(path),
        None => AppConfig::load_from_default_path(),
    };
    let level = cli.log_level.unwrap_or(config.preferences.log_level);
    env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .init();

    match run(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: AppConfig) -> Result<(), SessionError> {
    match command {
        Command::Export {
            dir,
            formats,
            output,
        } => {
            let formats = if formats.is_empty() {
                default_formats(&config)
            } else {
                formats
            };
            let session = Session::open(dir, config)?;
            let mut options = ExportOptions::new();
            if let Some(output) = output {
                options = options.output_dir(output);
            }

            for id in &formats {
                let result = session.export(id, &options)?;
                println!(
                    "{}: {} images, {} annotations, {} files",
                    id,
                    result.images_exported,
                    result.annotations_exported,
                    result.files_created.len()
                );
                for warning in &result.warnings {
                    println!("  warning: {}", warning);
                }
            }
            Ok(())
        }
        Command::Status { dir } => {
            let session = Session::open(&dir, config)?;
            let status = session.status();
            println!("{}", dir.display());
            println!("  images:    {}", status.images);
            println!("  completed: {}", status.completed);
            println!("  manual:    {}", status.manual);
            println!("  cached:    {}", status.cached);
            Ok(())
        }
    }
}

fn default_formats(config: &AppConfig) -> Vec<String> {
    let prefs = &config.preferences;
    let mut formats = vec![
        prefs.det_dialect.det_exporter().to_string(),
        prefs.rec_dialect.rec_exporter().to_string(),
    ];
    if prefs.kie_mode {
        formats.push("kie".to_string());
    }
    formats
}
