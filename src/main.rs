use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use article_tei::utils::init_logging;
use article_tei::{
    DigestAlgorithm, Grammar, OutputMode, RunConfig, load_portal, run_conversion, run_inventory,
};

#[derive(Parser, Debug)]
#[command(name = "article-tei", version, about)]
struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. `debug` or `article_tei::passes=debug`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a JSON-lines batch of pages into TEI documents
    Convert(ConvertArgs),
    /// Write draft dictionary tables for the tags found in a batch
    Inventory(InventoryArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Portal configuration (`{portal}.json`)
    #[arg(long)]
    config: PathBuf,
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    output: PathBuf,
    /// Directory for the URL lists and the log file (defaults to the output directory)
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Skip validation and write readable file names
    #[arg(long)]
    debug: bool,
    /// Convert on a single thread
    #[arg(long)]
    sequential: bool,
    /// Grammar file to validate against instead of the bundled one
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Digest algorithms for the hashsums file (repeatable)
    #[arg(long = "digest")]
    digests: Vec<DigestAlgorithm>,
    #[arg(long)]
    chunk_size: Option<usize>,
}

#[derive(Args, Debug)]
struct InventoryArgs {
    #[arg(long)]
    config: PathBuf,
    #[arg(long)]
    input: PathBuf,
    #[arg(long)]
    output: PathBuf,
}

fn portal_stem(config: &Path) -> String {
    config
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "portal".to_string())
}

fn convert(args: ConvertArgs, log_level: Option<&str>) -> Result<()> {
    let log_dir = args.log_dir.clone().unwrap_or_else(|| args.output.clone());
    init_logging(log_level, Some(&log_dir), &portal_stem(&args.config))
        .context("failed to set up logging")?;

    let portal = load_portal(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let mut builder = RunConfig::builder()
        .portal(portal)
        .output_dir(&args.output)
        .log_dir(log_dir)
        .mode(if args.debug { OutputMode::Debug } else { OutputMode::Archive })
        .sequential(args.sequential);
    if let Some(path) = &args.schema {
        let grammar = Grammar::from_path(path)
            .with_context(|| format!("failed to load grammar {}", path.display()))?;
        builder = builder.grammar(Arc::new(grammar));
    }
    if !args.digests.is_empty() {
        builder = builder.digests(args.digests);
    }
    if let Some(chunk_size) = args.chunk_size {
        builder = builder.chunk_size(chunk_size);
    }
    let config = builder.build()?;

    let summary = run_conversion(&config, &args.input)?;
    println!(
        "{}: {} archived ({} empty), {} quarantined, {} failed",
        config.portal_name(),
        summary.archived,
        summary.empty,
        summary.quarantined,
        summary.failed
    );
    Ok(())
}

fn inventory(args: InventoryArgs, log_level: Option<&str>) -> Result<()> {
    init_logging(log_level, None, &portal_stem(&args.config)).context("failed to set up logging")?;
    let portal = load_portal(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let report = run_inventory(&portal, &args.input, &args.output)?;
    println!(
        "{} signatures from {} articles: {}, {}",
        report.signatures,
        report.articles,
        report.text_table.display(),
        report.notext_table.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Convert(args) => convert(args, cli.log_level.as_deref()),
        Command::Inventory(args) => inventory(args, cli.log_level.as_deref()),
    }
}
