//! Logging setup for the `termwatch` binary.
//!
//! Logs always go to stderr so `watch --tee` can pass session output through
//! stdout untouched. `RUST_LOG`, when set, replaces the preset and overrides.

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

const TARGET_PREFIX: &str = "termwatch";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Baseline verbosity, chosen from the `-q/-v/-d/--trace` flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Session lifecycle and status changes only
    #[default]
    Production,
    /// Adds idle detection and flush activity
    Verbose,
    Debug,
    /// Includes debounce drops and dedup decisions
    Trace,
    Quiet,
}

impl LogPreset {
    /// Pick a preset from CLI flags. Quiet wins, then the most detailed level.
    pub fn from_flags(verbose: bool, debug: bool, trace: bool, quiet: bool) -> Self {
        match (quiet, trace, debug, verbose) {
            (true, ..) => Self::Quiet,
            (_, true, ..) => Self::Trace,
            (_, _, true, _) => Self::Debug,
            (_, _, _, true) => Self::Verbose,
            _ => Self::Production,
        }
    }

    fn directives(self) -> &'static [&'static str] {
        match self {
            Self::Production => &[
                "termwatch::cli=info",
                "termwatch::session=info",
                "termwatch::activity=warn",
                "termwatch::transcript=warn",
                "termwatch::dispatch=warn",
            ],
            Self::Verbose => &["termwatch=info"],
            Self::Debug => &["termwatch=debug"],
            Self::Trace => &["termwatch=trace"],
            Self::Quiet => &["termwatch=warn"],
        }
    }
}

/// One `--log TARGET=LEVEL` override. Short targets such as `activity` are
/// expanded to `termwatch::activity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLevel {
    pub target: String,
    pub level: Level,
}

impl FromStr for TargetLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, level) = s
            .split_once('=')
            .ok_or_else(|| format!("expected TARGET=LEVEL, got '{}'", s))?;
        let target = target.trim();
        if target.is_empty() {
            return Err(format!("missing target in '{}'", s));
        }
        let level = level
            .trim()
            .parse::<Level>()
            .map_err(|_| format!("unknown level '{}' for target '{}'", level.trim(), target))?;

        let target = if target == TARGET_PREFIX || target.starts_with("termwatch::") {
            target.to_string()
        } else {
            format!("{}::{}", TARGET_PREFIX, target)
        };
        Ok(Self { target, level })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    pub overrides: Vec<TargetLevel>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Filter directives, preset first so later overrides take precedence.
    pub fn directives(&self) -> String {
        self.preset
            .directives()
            .iter()
            .map(|d| d.to_string())
            .chain(
                self.overrides
                    .iter()
                    .map(|o| format!("{}={}", o.target, o.level.as_str().to_lowercase())),
            )
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn build_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(self.directives()).unwrap_or_else(|_| EnvFilter::new("info"))
        })
    }
}

/// Install the global subscriber.
pub fn init(config: &LogConfig) {
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(config.build_filter())
        .init();
}
