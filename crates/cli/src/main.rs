// pgrid - pipeline timelines, presets and defaults from the shell

mod catalog;
mod cells;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use pipegrid_catalog::CatalogError;
use pipegrid_config::Settings;
use pipegrid_core::PipelineType;

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "pgrid")]
#[command(about = "Pipeline timeline tooling (cells, grouped presets, defaults)")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, env = "PIPEGRID_SETTINGS", value_name = "PATH")]
    settings: Option<PathBuf>,

    #[command(flatten)]
    catalog: CatalogArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where presets and defaults live. Every flag overrides the matching setting.
#[derive(Args, Debug, Clone, Default)]
pub struct CatalogArgs {
    /// Pipeline type: culture, curing, separation, extraction
    #[arg(long, short = 'p', global = true, value_parser = parse_pipeline)]
    pub pipeline: Option<PipelineType>,

    /// Local catalog directory
    #[arg(long, global = true, env = "PIPEGRID_CATALOG_DIR", value_name = "DIR")]
    pub catalog_dir: Option<PathBuf>,

    /// Remote catalog base URL
    #[arg(long, global = true, env = "PIPEGRID_REMOTE_URL", value_name = "URL")]
    pub remote: Option<String>,

    /// Bearer token for the remote catalog
    #[arg(long, global = true, env = "PIPEGRID_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Never contact the remote catalog
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the cells of a timeline
    #[command(after_help = "\
Examples:
  pgrid cells --kind days --total 14
  pgrid cells --kind dates --start 2025-03-01 --end 2025-03-10 --json
  pgrid cells --kind phases")]
    Cells {
        /// Interval kind
        #[arg(long, short = 'k', value_enum)]
        kind: KindArg,

        /// Number of intervals (seconds, hours, days, weeks)
        #[arg(long, short = 'n', conflicts_with_all = ["start", "end"])]
        total: Option<u32>,

        /// First date of a date range (YYYY-MM-DD)
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// Last date of a date range, inclusive
        #[arg(long, requires = "start")]
        end: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage grouped presets
    #[command(subcommand)]
    Presets(PresetCommands),

    /// Read or change the pre-configured defaults map
    #[command(subcommand)]
    Defaults(DefaultsCommands),

    /// Show the settings file location and effective values
    Settings {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum PresetCommands {
    /// List presets for the pipeline
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a preset
    #[command(after_help = "\
Examples:
  pgrid presets add 'Flowering indoor' -f temperature=24 -f light='\"LED\"'
  pgrid presets add Jar --pipeline curing --emoji 🫙 -f humidity=62")]
    Add {
        /// Preset name
        name: String,

        /// Field value; VALUE is parsed as JSON when valid, else taken as text. Repeatable.
        #[arg(long = "field", short = 'f', value_name = "KEY=VALUE", required = true)]
        fields: Vec<String>,

        #[arg(long)]
        emoji: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a preset by id
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum DefaultsCommands {
    /// Print the defaults map, or one key
    Get {
        key: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Set one or more defaults
    Set {
        #[arg(value_name = "KEY=VALUE", required = true)]
        assignments: Vec<String>,
    },

    /// Remove keys from the defaults map
    Unset {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Seconds,
    Hours,
    Days,
    Weeks,
    Dates,
    Phases,
}

fn parse_pipeline(s: &str) -> Result<PipelineType, String> {
    PipelineType::parse(s)
        .ok_or_else(|| format!("unknown pipeline '{}' (expected culture, curing, separation, extraction)", s))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let result = match cli.command {
        None => {
            // No subcommand = show usage
            eprintln!("Usage: pgrid <command> [options]");
            eprintln!("       pgrid --help for more information");
            Ok(())
        }
        Some(Commands::Cells { kind, total, start, end, json }) => {
            cells::cmd_cells(kind, total, start, end, json)
        }
        Some(Commands::Presets(command)) => catalog::cmd_presets(command, &settings, &cli.catalog),
        Some(Commands::Defaults(command)) => catalog::cmd_defaults(command, &settings, &cli.catalog),
        Some(Commands::Settings { json }) => {
            catalog::cmd_settings(&settings, cli.settings.as_deref(), &cli.catalog, json)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn io(err: std::io::Error) -> Self {
        Self::runtime(err.to_string())
    }

    /// Catalog failures are runtime errors; an unwritable catalog gets a hint.
    pub fn catalog(err: CatalogError) -> Self {
        let hint = match &err {
            CatalogError::PersistenceUnavailable(_) => {
                Some("set --catalog-dir or PIPEGRID_CATALOG_DIR to a writable directory".to_string())
            }
            CatalogError::Parse(_) => Some("the catalog file is damaged; fix or remove it".to_string()),
            e if e.is_remote() => Some("the remote catalog is unreachable; retry or pass --offline".to_string()),
            _ => None,
        };
        Self { code: EXIT_ERROR, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
