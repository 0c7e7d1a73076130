//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use qabank_core::{
    Defect, ImportOptions, ImportReport, MaintenanceReport, ProgressReporter, corpus_stats,
    run_append, run_cleanup, run_club, run_enrich, run_import,
};
use qabank_shared::{AppConfig, IdScheme, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// qabank: turn interview-question READMEs into a structured question bank.
#[derive(Parser)]
#[command(
    name = "qabank",
    version,
    about = "Extract interview questions from markdown sources into a JSON question bank.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.qabank/qabank.toml).
    #[arg(long, global = true, env = "QABANK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base directory for sources and assets (overrides `defaults.root_dir`).
    #[arg(long, global = true)]
    pub root: Option<String>,

    /// Corpus path (overrides `defaults.output`).
    #[arg(long, global = true)]
    pub output: Option<String>,

    /// Id scheme: random or deterministic (overrides `defaults.id_scheme`).
    #[arg(long, global = true)]
    pub id_scheme: Option<IdScheme>,

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
    /// Extract every configured source and rebuild the corpus.
    Import {
        /// Only import sources of these technologies (repeatable).
        #[arg(long)]
        only: Vec<String>,

        /// Skip categorization and diagram association.
        #[arg(long)]
        skip_enrich: bool,

        /// Skip technology consolidation.
        #[arg(long)]
        skip_consolidate: bool,

        /// Run in memory and print the report without writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Re-normalize every record and repair merged titles.
    Cleanup {
        #[arg(long)]
        dry_run: bool,
    },

    /// Collapse a technology into one compiled record.
    Club {
        /// Technology to consolidate (defaults to every configured one).
        #[arg(long)]
        technology: Option<String>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Copy diagrams, categorize records and attach images.
    Enrich {
        #[arg(long)]
        dry_run: bool,
    },

    /// Append hand-authored records from a JSON array file.
    Append {
        /// JSON file holding an array of question records.
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        dry_run: bool,
    },

    /// Print record counts per technology and category.
    Stats,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
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

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "qabank=info",
        1 => "qabank=debug",
        _ => "qabank=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
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
pub(crate) fn run(cli: Cli) -> Result<()> {
    if let Command::Config {
        action: ConfigAction::Init,
    } = cli.command
    {
        return cmd_config_init();
    }
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Import {
            only,
            skip_enrich,
            skip_consolidate,
            dry_run,
        } => cmd_import(
            &config,
            ImportOptions {
                only,
                skip_enrich,
                skip_consolidate,
                dry_run,
            },
        ),
        Command::Cleanup { dry_run } => {
            print_maintenance("cleanup", &run_cleanup(&config, dry_run)?);
            Ok(())
        }
        Command::Club {
            technology,
            dry_run,
        } => {
            print_maintenance("club", &run_club(&config, technology.as_deref(), dry_run)?);
            Ok(())
        }
        Command::Enrich { dry_run } => {
            print_maintenance("enrich", &run_enrich(&config, dry_run)?);
            Ok(())
        }
        Command::Append { file, dry_run } => {
            print_maintenance("append", &run_append(&config, &file, dry_run)?);
            Ok(())
        }
        Command::Stats => cmd_stats(&config),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Load the config file, then apply command-line overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    if let Some(root) = &cli.root {
        config.defaults.root_dir = root.clone();
    }
    if let Some(output) = &cli.output {
        config.defaults.output = output.clone();
    }
    if let Some(scheme) = cli.id_scheme {
        config.defaults.id_scheme = scheme;
    }

    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_import(config: &AppConfig, options: ImportOptions) -> Result<()> {
    info!(
        root = %config.defaults.root_dir,
        output = %config.defaults.output,
        "importing question bank"
    );

    let reporter = CliProgress::new();
    let report = run_import(config, &options, &reporter)?;

    println!();
    if report.written {
        println!("  Question bank updated!");
    } else {
        println!("  Dry run: nothing written.");
    }
    println!("  Output:       {}", report.output.display());
    println!(
        "  Sources:      {} read, {} missing",
        report.sources_read,
        report.sources_missing.len()
    );
    for missing in &report.sources_missing {
        println!("    missing     {missing}");
    }
    for (technology, count) in &report.extracted {
        println!("    {technology:<12}{count} extracted");
    }
    println!("  Kept:         {}", report.kept);
    println!("  Replaced:     {}", report.replaced);
    println!("  Repaired:     {} titles", report.repaired_titles);
    println!("  Categorized:  {}", report.categorized);
    println!("  Images:       {}", report.images);
    for (technology, merged) in &report.consolidated {
        println!("  Clubbed:      {technology} ({merged} records)");
    }
    print_defects(&report.defects);
    println!("  Total:        {}", report.total);
    println!("  Time:         {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_stats(config: &AppConfig) -> Result<()> {
    let stats = corpus_stats(config)?;
    let total: usize = stats.values().flat_map(|c| c.values()).sum();

    for (technology, categories) in &stats {
        let count: usize = categories.values().sum();
        println!("{technology} ({count})");
        for (category, n) in categories {
            println!("  {category:<28}{n}");
        }
    }
    println!("Total: {total}");
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_maintenance(action: &str, report: &MaintenanceReport) {
    println!();
    println!("  {action}: {} records changed", report.changed);
    if report.repaired_titles > 0 {
        println!("  Repaired:     {} titles", report.repaired_titles);
    }
    print_defects(&report.defects);
    println!("  Total:        {}", report.total);
    if !report.written {
        println!("  Dry run: nothing written.");
    }
    println!();
}

fn print_defects(defects: &[Defect]) {
    if defects.is_empty() {
        return;
    }
    println!("  Defects:      {}", defects.len());
    for d in defects {
        println!("    {} [{}] {}", d.id, d.technology, d.problem);
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn source_done(&self, source: &str, records: usize, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Extracting [{current}/{total}] {} ({records} questions)",
            short_name(source)
        ));
    }

    fn done(&self, _report: &ImportReport) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

/// Last two path components, for compact spinner messages.
fn short_name(source: &str) -> String {
    let path = Path::new(source);
    let parts: Vec<_> = path
        .components()
        .rev()
        .take(2)
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.into_iter().rev().collect::<Vec<_>>().join("/")
}
