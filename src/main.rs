use anyhow::Result;
use std::path::PathBuf;
use std::sync::mpsc;

use screenshelf::config::Config;
use screenshelf::db::Database;
use screenshelf::gallery::Gallery;
use screenshelf::ingest::IngestProgress;
use screenshelf::logging;

enum Command {
    Scan,
    Add(String),
    Page(Option<String>),
}

fn parse_args() -> (Option<PathBuf>, Command) {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut command = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("screenshelf {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "scan" => command = Some(Command::Scan),
            "add" => {
                if i + 1 < args.len() {
                    command = Some(Command::Add(args[i + 1].clone()));
                    i += 1;
                } else {
                    eprintln!("Error: add requires a filename argument");
                    std::process::exit(1);
                }
            }
            "page" => {
                let cursor = args.get(i + 1).filter(|a| !a.starts_with('-')).cloned();
                if cursor.is_some() {
                    i += 1;
                }
                command = Some(Command::Page(cursor));
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let command = command.unwrap_or_else(|| {
        print_help();
        std::process::exit(1);
    });
    (config_path, command)
}

fn print_help() {
    println!(
        r#"screenshelf - screenshot library indexer and gallery browser

USAGE:
    screenshelf [OPTIONS] <COMMAND>

COMMANDS:
    scan                Ingest the whole library (skips known files)
    add FILENAME        Ingest one file from the current month bucket
    page [CURSOR]       Print a page of day groups as JSON, optionally
                        starting at CURSOR (YYYY-MM-DD)

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    SCREENSHELF_LOG     Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/screenshelf/config.toml"#
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config_path, command) = parse_args();

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = logging::init(Some(Config::config_dir().join("logs")));

    // Load configuration
    let config = match config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    // Initialize database
    let db = Database::open(&config.db_path)?;
    db.initialize()?;

    let gallery = Gallery::new(&config, db);

    match command {
        Command::Scan => {
            let (tx, rx) = mpsc::channel();
            let printer = std::thread::spawn(move || {
                for message in rx {
                    match message {
                        IngestProgress::Started { total_files } => {
                            println!("scanning {total_files} files");
                        }
                        IngestProgress::Processed { current, total, path } => {
                            println!("{current}/{total} ingested {path}");
                        }
                        IngestProgress::Skipped { current, total, path } => {
                            println!("{current}/{total} skipped {path}");
                        }
                        IngestProgress::Failed { current, total, path, reason } => {
                            eprintln!("{current}/{total} failed {path}: {reason}");
                        }
                        IngestProgress::Completed { .. } => {}
                    }
                }
            });

            let report =
                tokio::task::spawn_blocking(move || gallery.ingest_library(Some(tx))).await??;
            let _ = printer.join();
            println!(
                "done: {} ingested, {} failed, {} skipped ({} total)",
                report.succeeded, report.failed, report.skipped, report.total
            );
        }
        Command::Add(filename) => {
            let id = gallery.add_image(&filename)?;
            println!("ingested {filename} as image {id}");
        }
        Command::Page(cursor) => {
            let page = gallery.fetch_page(cursor.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
    }

    Ok(())
}
