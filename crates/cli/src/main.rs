use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use oasgen_pipeline::{PipelineConfig, SpecPipeline};
use std::path::PathBuf;

mod bootstrap;
mod output;
mod replay;

#[derive(Parser)]
#[command(name = "oasgen")]
#[command(about = "Generate OpenAPI 3.1 documents from captured HTTP traffic", long_about = None)]
#[command(version)]
struct Cli {
    /// Capture files, or directories searched for .har and .ldjson files
    inputs: Vec<PathBuf>,

    /// Directory of `<destination>.json` specs to continue from
    #[arg(long)]
    load_dir: Option<PathBuf>,

    /// Write one `<destination>.json` per service here instead of printing
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Source identity for captures that do not declare one
    #[arg(long)]
    source: Option<String>,

    /// Examples kept per parameter, header and form field
    #[arg(long)]
    max_examples: Option<usize>,

    /// Sibling segments of one shape needed before they fold into a parameter
    #[arg(long)]
    compaction_min_siblings: Option<usize>,

    /// Entries buffered between the reader and the generator
    #[arg(long)]
    channel_capacity: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long)]
    quiet: bool,
}

impl Cli {
    /// Environment defaults with command-line overrides on top.
    fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::from_env();
        if let Some(capacity) = self.channel_capacity {
            config.channel_capacity = capacity;
        }
        if let Some(max_examples) = self.max_examples {
            config.generator.max_examples = max_examples;
        }
        if let Some(min_siblings) = self.compaction_min_siblings {
            config.generator.compaction_min_siblings = min_siblings;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = cli.pipeline_config();
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    let pipeline = SpecPipeline::new(config);
    let registry = pipeline.registry();

    if let Some(dir) = &cli.load_dir {
        let loaded = bootstrap::load_specs(&registry, dir)?;
        info!("Loaded {loaded} spec(s) from {}", dir.display());
    }

    let files = replay::collect_capture_files(&cli.inputs)?;
    info!("Replaying {} capture file(s)", files.len());

    pipeline.start();
    let replayed = replay::replay_files(&pipeline, &files, cli.source.as_deref()).await;
    pipeline.close();
    pipeline.join().await;
    let stats = replayed?;
    info!(
        "Replayed {} entries from {} file(s); {} file(s) and {} line(s) skipped",
        stats.entries, stats.files, stats.failed_files, stats.skipped_lines
    );

    let specs = registry
        .get_all_specs()
        .context("Failed to snapshot generated specs")?;
    match &cli.out_dir {
        Some(dir) => output::write_specs(dir, &specs)?,
        None => output::print_specs(&specs)?,
    }

    Ok(())
}
