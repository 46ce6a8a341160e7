//! termwatch - activity classification and transcripts for terminal sessions.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use termwatch_cli::commands::{self, ContextKind};
use termwatch_cli::config::Config;
use termwatch_cli::logging::{self, LogConfig, LogFormat, LogPreset, TargetLevel};
use termwatch_cli::watch::{self, WatchOptions};

/// Watch a terminal session's output and keep a clean transcript.
#[derive(Parser, Debug)]
#[command(name = "termwatch")]
#[command(about = "Classify terminal session activity and record transcripts")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (INFO level for most targets)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable trace logging (includes debounce and dedup decisions)
    #[arg(long, global = true)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "activity=debug").
    /// Targets are prefixed with "termwatch::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL", value_delimiter = ',', global = true)]
    log_overrides: Vec<TargetLevel>,

    /// Log output format
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Monitor session output piped on stdin until EOF
    Watch {
        /// Session name used in logs
        #[arg(long, default_value = "stdin")]
        name: String,
        /// Append transcript batches to this JSONL file
        #[arg(long, value_name = "FILE")]
        transcript: Option<PathBuf>,
        /// File or FIFO carrying the session's keystrokes
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Pass output through to stdout
        #[arg(long)]
        tee: bool,
    },
    /// Print the text of a stored transcript
    Show {
        file: PathBuf,
    },
    /// Find a phrase across stored transcripts
    Search {
        query: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the bounded context a summarizer would receive
    Context {
        file: PathBuf,
        #[arg(long, value_enum, default_value = "title")]
        kind: ContextKind,
    },
    /// Print prior learnings as context for a new session
    Insights {
        /// Learnings files, one learning per line, oldest first
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogConfig {
        preset: LogPreset::from_flags(cli.verbose, cli.debug, cli.trace, cli.quiet),
        overrides: cli.log_overrides,
        format: cli.log_format,
    });

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::debug!(target: "termwatch::cli", ?config, "Loaded configuration");

    match cli.command {
        Command::Watch {
            name,
            transcript,
            input,
            tee,
        } => {
            let opts = WatchOptions {
                name,
                transcript,
                input,
                tee,
            };
            watch::run(&config, opts).await?;
        }
        Command::Show { file } => {
            print!("{}", commands::show(&file)?);
        }
        Command::Search { query, files } => {
            for hit in commands::search(&query, &files)? {
                println!("{}", commands::format_match(&hit));
            }
        }
        Command::Context { file, kind } => {
            match commands::context(&file, kind, &config.summary_config())? {
                Some(text) => println!("{}", text),
                None => tracing::warn!(
                    target: "termwatch::cli",
                    "Transcript too short to build {:?} context",
                    kind
                ),
            }
        }
        Command::Insights { files } => {
            match commands::insights(&files, &config.summary_config())? {
                Some(text) => print!("{}", text),
                None => tracing::warn!(target: "termwatch::cli", "No learnings found"),
            }
        }
    }

    Ok(())
}
