use std::fs;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use photo_classifier::{
    AnnotateOptions, Args, Classifier, ClassifierConfig, Overlay, annotate_sources, results_summary,
};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let classifier = Classifier::from_config(&ClassifierConfig::from(&args))
        .context("failed to initialize classifier")?;
    let overlay = match &args.font {
        Some(path) => Some(Overlay::load(path)?),
        None => {
            warn!("no --font given, annotated images will carry no text");
            None
        }
    };
    fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let options = AnnotateOptions {
        output_dir: &args.output,
        max_width: args.max_width,
        batch_size: args.batch_size as usize,
        overlay: overlay.as_ref(),
    };
    let report = annotate_sources(&classifier, &args.source, &options);

    for annotated in &report.annotated {
        println!("{}", annotated.source.display());
        print!("{}", results_summary(&annotated.results));
    }
    for failure in &report.failed {
        eprintln!("Failed to process image: {}", failure.source.display());
    }

    if !report.is_success() {
        bail!("{} of {} images failed", report.failed.len(), args.source.len());
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
