//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use symptomfix_core::normalize::normalize;
use symptomfix_core::{CleanupOptions, CleanupReport, ProgressReporter, run_cleanup};
use symptomfix_shared::{
    AppConfig, RunConfig, RunOverrides, init_config, load_config, load_config_from,
};
use symptomfix_storage::MongoStore;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// symptomfix — normalize knowledge base symptoms and fill the symptom lookup.
#[derive(Parser)]
#[command(
    name = "symptomfix",
    version,
    about = "Normalize knowledge base symptom strings and populate the symptom lookup.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.symptomfix/symptomfix.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the cleanup against the document store.
    Run(RunArgs),

    /// Print the normalized form of each argument (no database access).
    Normalize {
        /// Raw symptom strings.
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `symptomfix run`.
#[derive(clap::Args)]
pub(crate) struct RunArgs {
    /// MongoDB connection string.
    #[arg(long, env = "SYMPTOMFIX_MONGODB_URI")]
    pub uri: Option<String>,

    /// Database name.
    #[arg(long)]
    pub database: Option<String>,

    /// Knowledge base collection name.
    #[arg(long)]
    pub kb_collection: Option<String>,

    /// Symptom lookup collection name.
    #[arg(long)]
    pub symptom_collection: Option<String>,

    /// Report what would change without writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not touch createdAt/updatedAt.
    #[arg(long)]
    pub no_timestamps: bool,

    /// Print the full report as JSON instead of the summary line.
    #[arg(long)]
    pub json: bool,
}

impl From<&RunArgs> for RunOverrides {
    fn from(args: &RunArgs) -> Self {
        Self {
            uri: args.uri.clone(),
            database: args.database.clone(),
            knowledge_base_collection: args.kb_collection.clone(),
            symptom_collection: args.symptom_collection.clone(),
            dry_run: args.dry_run,
            no_timestamps: args.no_timestamps,
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "symptomfix=info",
        1 => "symptomfix=debug",
        _ => "symptomfix=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Run(args) => cmd_run(cli.config.as_deref(), args).await,
        Command::Normalize { text } => cmd_normalize(text),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

async fn cmd_run(config_path: Option<&Path>, args: &RunArgs) -> Result<()> {
    let config = resolve_config(config_path)?;
    let run_config = RunConfig::resolve(&config, &RunOverrides::from(args))?;

    info!(
        database = %run_config.store.database,
        dry_run = run_config.dry_run,
        timestamps = run_config.store.timestamps,
        "starting cleanup"
    );

    let store = MongoStore::connect(&run_config.store).await?;
    let options = CleanupOptions {
        dry_run: run_config.dry_run,
    };

    let report = if args.json {
        run_cleanup(&store, &options, &symptomfix_core::SilentProgress).await?
    } else {
        let reporter = CliProgress::new();
        run_cleanup(&store, &options, &reporter).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary_line());
    }

    Ok(())
}

fn cmd_normalize(text: &[String]) -> Result<()> {
    for raw in text {
        println!("{}", normalize(raw));
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn record_updated(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Updating knowledge bases [{current}/{total}]"));
    }

    fn symptom_checked(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Symptom lookup [{current}/{total}] {name}"));
    }

    fn done(&self, _report: &CleanupReport) {
        self.spinner.finish_and_clear();
    }
}

// A failed run never reaches `done`; clear the line before the error prints.
impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
