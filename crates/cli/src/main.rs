use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use datestamp_core::{
    app_paths, load_config, run_batch, save_config, AppConfig, Anchor, BatchOptions, BatchReport,
    FileOutcome, TextColor,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "datestamp", version)]
#[command(about = "Stamp the capture date (YYYY-MM-DD) from EXIF onto photos")]
struct Cli {
    /// Log per-file details (same as RUST_LOG=debug)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Stamp(StampArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Init,
}

#[derive(Debug, Args)]
struct StampArgs {
    /// Image file or directory. For a file, its whole directory is processed.
    path: PathBuf,
    /// Font size in pixels [default: 36]
    #[arg(long)]
    font_size: Option<u32>,
    /// Text color, #RRGGBB / #RGB or a name like "white" [default: #FFFFFF]
    #[arg(long)]
    color: Option<String>,
    /// top-left, top-right, bottom-left, bottom-right or center [default: bottom-right]
    #[arg(long)]
    position: Option<Anchor>,
    /// Margin from the edges in pixels [default: 20]
    #[arg(long)]
    margin: Option<u32>,
    /// Path to a .ttf/.otf font file
    #[arg(long)]
    font_path: Option<PathBuf>,
    /// Recurse into subdirectories (directory input only)
    #[arg(long, default_value_t = false)]
    recursive: bool,
    /// Stay in the top directory even if the config enables recursion
    #[arg(long, default_value_t = false, conflicts_with = "recursive")]
    no_recursive: bool,
    /// Resolve dates and targets without writing images
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Worker threads (1 = sequential)
    #[arg(long)]
    jobs: Option<usize>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Stamp(args) => cmd_stamp(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init => cmd_config_init(),
        },
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn cmd_stamp(args: StampArgs) -> Result<()> {
    let config = load_config()?;
    let options = build_options(&args, config)?;
    debug!(?options, "batch options");
    let report = run_batch(&options)?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report),
    }
    Ok(())
}

fn build_options(args: &StampArgs, config: AppConfig) -> Result<BatchOptions> {
    let color_raw = args.color.clone().unwrap_or(config.color);
    let color = color_raw
        .parse::<TextColor>()
        .with_context(|| format!("invalid --color: {color_raw}"))?;
    let outline_color = config
        .outline_color
        .parse::<TextColor>()
        .with_context(|| format!("invalid outline_color in config: {}", config.outline_color))?;

    Ok(BatchOptions {
        input: args.path.clone(),
        recursive: !args.no_recursive && (args.recursive || config.recursive),
        font_size: args.font_size.unwrap_or(config.font_size),
        color,
        anchor: args.position.unwrap_or(config.position),
        margin: args.margin.unwrap_or(config.margin),
        font_path: args.font_path.clone().or(config.font_path),
        font_candidates: config.font_candidates,
        outline_width: config.outline_width,
        outline_color,
        dry_run: args.dry_run,
        jobs: args.jobs,
    })
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("Config file: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let paths = app_paths()?;
    if paths.config_path.exists() {
        anyhow::bail!(
            "config file already exists: {}",
            paths.config_path.display()
        );
    }
    let written = save_config(&AppConfig::default())?;
    println!("Wrote default config: {}", written.display());
    Ok(())
}

fn print_table(report: &BatchReport) {
    println!("Source: {}", report.source_dir.display());
    println!("Output: {}", report.output_dir.display());

    if report.total == 0 {
        println!("No images found to process.");
        return;
    }

    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Stamped { source, date, .. } => {
                println!("{} -> {} ({:?})", source.display(), date, date.source)
            }
            FileOutcome::Planned {
                source,
                output,
                date,
            } => println!(
                "{} -> {} [{}] ({:?})",
                source.display(),
                output.display(),
                date,
                date.source
            ),
            FileOutcome::Skipped { source, reason } => {
                println!("Skip: {} ({})", source.display(), reason)
            }
        }
    }

    if report.dry_run {
        println!(
            "\nDry run: {}/{} image(s) would be watermarked. No files were written.",
            report.processed, report.total
        );
    } else {
        println!(
            "\nDone. Watermarked {}/{} image(s).",
            report.processed, report.total
        );
    }
}
