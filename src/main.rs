use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use fishsort::{cli, config, logging, web};

#[derive(Debug, Parser)]
#[command(name = "fishsort")]
#[command(about = "Production history analytics for the fish-sorting line")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

/// Time range and fish-type filter shared by history queries.
#[derive(Debug, clap::Args)]
struct QueryOpts {
    /// Range start, `YYYY-MM-DDTHH:MM` (default: 24 hours ago; "" for no bound)
    #[arg(long)]
    start: Option<String>,
    /// Range end, `YYYY-MM-DDTHH:MM` (default: now; "" for no bound)
    #[arg(long)]
    end: Option<String>,
    /// Only include this fish code (default: all types)
    #[arg(long)]
    fish: Option<String>,
}

impl From<QueryOpts> for cli::QueryArgs {
    fn from(opts: QueryOpts) -> Self {
        Self {
            start: opts.start,
            end: opts.end,
            fish: opts.fish,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Query production history: statistics, histogram and records
    History {
        #[command(flatten)]
        query: QueryOpts,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Also export the result set as CSV
        #[arg(long)]
        export: bool,
        /// Directory for the exported file (default: current directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Export production history to a CSV file
    Export {
        #[command(flatten)]
        query: QueryOpts,
        /// Exact output file path
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Directory for production_history_<date>.csv (default: current directory)
        #[arg(long, conflicts_with = "output")]
        out_dir: Option<PathBuf>,
    },
    /// List fish types known to the backend
    Types {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the production-mix summary
    Mix {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Follow the live line status feed
    Watch,
    /// Check backend reachability and configuration
    Health,
    /// Launch the local history dashboard
    Web {
        /// Listen address (default from config, 127.0.0.1:9750)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Manage fishsort configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective (merged) configuration
    Show,
    /// Write a default config to ~/.fishsort/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a configuration value, e.g. `display.weight_unit kg`
    Set { key: String, value: String },
    /// Reset configuration to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();
    logging::init(&cfg.logging.level);

    match app.command {
        Commands::History {
            query,
            format,
            export,
            out_dir,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            let target = export.then(|| cli::export_target(None, out_dir));
            cli::run_history(&query.into(), fmt, target)
        }
        Commands::Export {
            query,
            output,
            out_dir,
        } => cli::run_export(&query.into(), cli::export_target(output, out_dir)),
        Commands::Types { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_types(fmt)
        }
        Commands::Mix { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_mix(fmt)
        }
        Commands::Watch => cli::run_watch(),
        Commands::Health => cli::run_health(),
        Commands::Web { addr } => {
            let addr = addr.unwrap_or_else(|| cfg.web.addr.clone());
            web::serve(&addr, cfg)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
