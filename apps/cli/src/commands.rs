//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use sitebuild_core::pipeline::{self, BuildContext, BuildSummary, ProgressReporter};
use sitebuild_core::watch;
use sitebuild_shared::{Config, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// sitebuild — build static-site assets and preview them with live reload.
#[derive(Parser)]
#[command(
    name = "sitebuild",
    version,
    about = "Copy vendor libraries, compile styles, minify scripts, and serve a live-reload preview.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Project root (defaults to the current directory).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file path (defaults to <root>/sitebuild.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands. No subcommand runs the full build.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full build: clean, vendor, then styles/scripts/media/HTML.
    Build,

    /// Delete the output directory.
    Clean,

    /// Clean the output directory and copy vendor libraries.
    Vendor,

    /// Compile stylesheets only.
    Styles,

    /// Minify scripts only.
    Scripts,

    /// Build, then watch sources and serve a live-reload preview.
    Watch {
        /// Preview server port (overrides [serve].port).
        #[arg(short, long)]
        port: Option<u16>,
    },

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
    /// Write a starter sitebuild.toml.
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
        0 => "sitebuild=info",
        1 => "sitebuild=debug",
        _ => "sitebuild=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let root = match &cli.root {
        Some(r) => r.clone(),
        None => std::env::current_dir()
            .map_err(|e| eyre!("cannot determine working directory: {e}"))?,
    };

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config(&root)?,
    };

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => cmd_build(root, config).await,
        Command::Clean => cmd_clean(root, config),
        Command::Vendor => cmd_vendor(root, config),
        Command::Styles => cmd_styles(root, config),
        Command::Scripts => cmd_scripts(root, config),
        Command::Watch { port } => cmd_watch(root, config, port).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&root),
            ConfigAction::Show => cmd_config_show(config),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(root: PathBuf, config: Config) -> Result<()> {
    let ctx = BuildContext::new(root, config);

    info!(root = %ctx.project_root.display(), "starting build");
    let reporter = CliProgress::new();
    let summary = pipeline::run_build(&ctx, &reporter).await?;

    print_summary(&ctx, &summary);
    Ok(())
}

fn cmd_clean(root: PathBuf, config: Config) -> Result<()> {
    let ctx = BuildContext::new(root, config);
    pipeline::clean(&ctx)?;
    println!("Removed {}", ctx.config.output_root(&ctx.project_root).display());
    Ok(())
}

fn cmd_vendor(root: PathBuf, config: Config) -> Result<()> {
    let ctx = BuildContext::new(root, config);
    pipeline::clean(&ctx)?;
    let report = pipeline::vendor(&ctx)?;
    println!("Copied {} vendor files", report.files);
    Ok(())
}

fn cmd_styles(root: PathBuf, config: Config) -> Result<()> {
    let ctx = BuildContext::new(root, config);
    let report = pipeline::styles(&ctx)?;
    for out in &report.outputs {
        println!("  {}", out.output.display());
    }
    println!("Compiled {} stylesheet(s)", report.outputs.len());
    Ok(())
}

fn cmd_scripts(root: PathBuf, config: Config) -> Result<()> {
    let ctx = BuildContext::new(root, config);
    let report = pipeline::scripts(&ctx)?;
    for out in &report.outputs {
        println!("  {}", out.output.display());
    }
    println!("Minified {} script(s)", report.outputs.len());
    Ok(())
}

async fn cmd_watch(root: PathBuf, mut config: Config, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.serve.port = port;
    }

    let ctx = BuildContext::new(root, config);
    let reporter = CliProgress::new();
    watch::run_watch(&ctx, &reporter).await?;
    Ok(())
}

fn cmd_config_init(root: &PathBuf) -> Result<()> {
    let path = init_config(root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: Config) -> Result<()> {
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _summary: &BuildSummary) {
        self.spinner.finish_and_clear();
    }
}

/// Print the post-build summary block.
fn print_summary(ctx: &BuildContext, summary: &BuildSummary) {
    println!();
    println!("  Build complete!");
    println!("  Vendor:  {} file(s)", summary.vendor_files);
    println!("  Styles:  {} output(s)", summary.styles.outputs.len());
    println!("  Scripts: {} output(s)", summary.scripts.outputs.len());
    println!("  Media:   {} file(s)", summary.media_files);
    println!("  HTML:    {} file(s)", summary.html_files);
    println!(
        "  Output:  {}",
        ctx.config.output_root(&ctx.project_root).display()
    );
    println!("  Time:    {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}
