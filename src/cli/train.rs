//! Train command - build and save the class vectors

use anyhow::{Context, Result};
use apkhd::classifier::{ClassVectorBuilder, ClassVectors, Label, TrainStats};
use apkhd::config::HdcConfig;
use apkhd::encoder::Encoder;
use apkhd::extract::FileExtractor;
use apkhd::hdc::Codebook;
use apkhd::samples::{list_samples, paired};
use apkhd::store::{NpyStore, VectorStore};
use apkhd::telemetry::{Observer, TelemetryReport, DEFAULT_INTERVAL};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{info, warn};

const PREVIEW_LEN: usize = 32;

pub fn run(config: &HdcConfig, benign: &Path, malicious: &Path) -> Result<()> {
    let extensions = &config.samples.extensions;
    let benign_files = list_samples(benign, extensions)
        .with_context(|| format!("Cannot list benign samples in {}", benign.display()))?;
    let malicious_files = list_samples(malicious, extensions)
        .with_context(|| format!("Cannot list malicious samples in {}", malicious.display()))?;

    let pairs = paired(&benign_files, &malicious_files, config.training.max_apps);
    info!(
        "Found {} benign and {} malicious samples, using {} pairs",
        benign_files.len(),
        malicious_files.len(),
        pairs.len()
    );
    if pairs.is_empty() {
        warn!("No paired samples; class vectors will equal the tie-break vector");
    }

    let codebook = Codebook::new(config.encoding.dimension)?;
    let encoder = Encoder::new(&codebook, config.encoding.max_ops);

    let bar = ProgressBar::new((pairs.len() * 2) as u64);
    bar.set_style(bar_style());
    bar.set_message("Encoding applications...");

    let observer = Observer::start(DEFAULT_INTERVAL);
    let source = FileExtractor;
    let built = ClassVectorBuilder::new(encoder, &source)
        .with_progress(bar.clone())
        .build(&pairs);
    let telemetry = observer.finish();
    bar.finish_and_clear();
    let (classes, stats) = built?;

    let store = NpyStore::new(&config.store.dir);
    store
        .save_all(&classes)
        .with_context(|| format!("Failed to save class vectors to {}", store.dir().display()))?;

    print_summary(&classes, &stats, &telemetry, &codebook);
    println!(
        "\n{} Saved to {} and {}",
        style("✓").green(),
        style(store.path_for(Label::Benign).display()).cyan(),
        style(store.path_for(Label::Malicious).display()).cyan()
    );
    Ok(())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("█▓▒░  "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn preview(classes: &ClassVectors, label: Label) -> String {
    let values: Vec<String> = classes
        .get(label)
        .as_slice()
        .iter()
        .take(PREVIEW_LEN)
        .map(|v| v.to_string())
        .collect();
    format!("[{}]", values.join(" "))
}

fn print_summary(
    classes: &ClassVectors,
    stats: &TrainStats,
    telemetry: &TelemetryReport,
    codebook: &Codebook,
) {
    println!("\n{}", style("Class vectors built").bold());
    println!("  Pairs:      {}", style(stats.pairs).cyan());
    for label in Label::ALL {
        let s = stats.get(label);
        println!(
            "  {:<10}  {} encoded, {} skipped",
            format!("{label}:"),
            style(s.encoded).cyan(),
            style(s.skipped).yellow()
        );
    }
    println!(
        "  Vocabulary: {} opcodes, {} methods (D={})",
        codebook.opcodes().len(),
        codebook.methods().len(),
        codebook.dim()
    );

    println!();
    for label in Label::ALL {
        println!("{} (first {}): {}", label, PREVIEW_LEN, preview(classes, label));
    }

    println!(
        "\nTraining time: {:.2} sec",
        telemetry.elapsed.as_secs_f64()
    );
    match telemetry.peak_rss_kb {
        Some(kb) => println!(
            "Peak resident memory: {:.2} MB ({} samples)",
            kb as f64 / 1024.0,
            telemetry.samples
        ),
        None => println!("Peak resident memory: {}", style("[not available]").dim()),
    }
}
