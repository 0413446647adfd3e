use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use clausescope::activity;
use clausescope::cli::{self, ClauseSource, OutputFormat};
use clausescope::config;

#[derive(Debug, Parser)]
#[command(name = "clausescope")]
#[command(about = "Contract clause risk analysis: rule engine plus AI, with a saved-analysis dashboard")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze one clause (from TEXT, --file, or stdin)
    Analyze {
        /// Clause text
        text: Option<String>,
        /// Read the clause from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Save the analysis after it completes
        #[arg(long)]
        save: bool,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List saved analyses with risk statistics
    Dashboard {
        /// Case-insensitive search over title, summary and id
        #[arg(long)]
        search: Option<String>,
        /// date-desc (default), date-asc, risk-desc, risk-asc
        #[arg(long, default_value = "date-desc")]
        sort: String,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show one saved analysis
    Show {
        id: String,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
        /// Print the plain-text export report instead
        #[arg(long)]
        report: bool,
    },
    /// Run the HTTP backend and web page
    Serve {
        /// Listen address (default from [server] addr)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Show recent backend activity
    Activity {
        /// Number of events to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check configuration and backend services
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets masked)
    Show,
    /// Write a default ~/.clausescope/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one value, e.g. `config set ai.model gpt-4o-mini`
    Set { key: String, value: String },
    /// Restore the default configuration
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    activity::set_enabled(config::load().logging.enabled);

    match app.command {
        Commands::Analyze {
            text,
            file,
            save,
            format,
        } => {
            let source = match (&text, &file) {
                (Some(text), _) => ClauseSource::Text(text),
                (None, Some(path)) => ClauseSource::File(path),
                (None, None) => ClauseSource::Stdin,
            };
            cli::run_analyze(source, save, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Dashboard {
            search,
            sort,
            format,
        } => cli::run_dashboard(
            search.as_deref(),
            &sort,
            OutputFormat::from_str_opt(Some(&format)),
        ),
        Commands::Show { id, format, report } => {
            cli::run_show(&id, OutputFormat::from_str_opt(Some(&format)), report)
        }
        Commands::Serve { addr } => cli::run_serve(addr.as_deref()),
        Commands::Activity { limit, format } => {
            cli::run_activity(limit, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
