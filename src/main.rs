use anyhow::{bail, Context, Result};
use clap::Parser;
use img_shrink::cli::{Args, Commands};
use img_shrink::logger::{self, Verbosity};
use img_shrink::{export_tree, pipeline, PipelineOptions, Staleness};
use std::path::Path;

fn main() -> Result<()> {
    let args = Args::parse();
    logger::set_verbosity(Verbosity::from_flags(args.quiet, args.verbose));

    match args.command {
        Commands::Run {
            root,
            quality,
            max_dimension,
            exclude,
        } => {
            let options = PipelineOptions::new(quality, max_dimension, &exclude.patterns)?;
            compress_tree(&root, &options)?;
        }
        Commands::Status { root, exclude } => {
            let options = PipelineOptions::new(None, None, &exclude.patterns)?;
            show_status(&root, &options)?;
        }
        Commands::Export { root, dest } => {
            export_tree(&root, &dest)
                .with_context(|| format!("failed to export {}", root.display()))?;
        }
    }

    Ok(())
}

fn compress_tree(root: &Path, options: &PipelineOptions) -> Result<()> {
    img_shrink::info!("🖼️  Starting image compression...\n");

    let summary = pipeline::run(root, options)
        .with_context(|| format!("failed to process {}", root.display()))?;
    summary.print();

    if let Some(e) = &summary.ledger_error {
        bail!("compressed files were not recorded: {}", e);
    }
    Ok(())
}

fn show_status(root: &Path, options: &PipelineOptions) -> Result<()> {
    let entries = pipeline::scan(root, options)
        .with_context(|| format!("failed to scan {}", root.display()))?;

    let mut stale = 0;
    for entry in &entries {
        if entry.staleness == Staleness::Current {
            img_shrink::verbose!("{} ({})", entry.key, entry.staleness);
        } else {
            stale += 1;
            img_shrink::info!("⚙ {} ({})", entry.key, entry.staleness);
        }
    }

    img_shrink::info!(
        "\n📊 {} of {} images would be compressed",
        stale,
        entries.len()
    );
    Ok(())
}
