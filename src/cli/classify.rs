//! Classify and predict commands

use anyhow::{Context, Result};
use apkhd::classifier::{classify, evaluate, ClassVectors, Decision, EvaluationReport, Label};
use apkhd::config::HdcConfig;
use apkhd::encoder::Encoder;
use apkhd::extract::{FileExtractor, OpcodeSource};
use apkhd::hdc::Codebook;
use apkhd::samples::{list_samples, tail_sample};
use apkhd::store::{preload_vocabulary, NpyStore, VectorStore};
use console::style;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load both class vectors and a codebook at the model's width
fn load_model(config: &HdcConfig, vocab: Option<&Path>) -> Result<(ClassVectors, Codebook)> {
    let store = NpyStore::new(&config.store.dir);
    let classes = store.load_all()?;
    if classes.dim() != config.encoding.dimension {
        warn!(
            "Model in {} has D={}, configured D={}; encoding with D={}",
            store.dir().display(),
            classes.dim(),
            config.encoding.dimension,
            classes.dim()
        );
    }

    let codebook = Codebook::new(classes.dim())?;
    if let Some(vocab) = vocab {
        let loaded = preload_vocabulary(&codebook, vocab)
            .with_context(|| format!("Failed to load vocabulary {}", vocab.display()))?;
        info!(
            "Preloaded {} opcode and {} method vectors from {}",
            loaded.opcodes.inserted,
            loaded.methods.inserted,
            vocab.display()
        );
    }
    Ok((classes, codebook))
}

pub fn run(
    config: &HdcConfig,
    benign: &Path,
    malicious: &Path,
    format: &str,
    vocab: Option<&Path>,
) -> Result<()> {
    let (classes, codebook) = load_model(config, vocab)?;
    let encoder = Encoder::new(&codebook, config.encoding.max_ops);

    let eval = &config.evaluation;
    let mut samples: Vec<(PathBuf, Label)> = Vec::new();
    for (dir, label) in [(benign, Label::Benign), (malicious, Label::Malicious)] {
        let files = list_samples(dir, &config.samples.extensions)
            .with_context(|| format!("Cannot list {} samples in {}", label, dir.display()))?;
        let picked = tail_sample(&files, eval.tail_length, eval.test_count, eval.seed);
        samples.extend(picked.into_iter().map(|p| (p, label)));
    }

    if samples.is_empty() {
        match format {
            "json" => println!(
                "{}",
                serde_json::to_string_pretty(&EvaluationReport::from_predictions(Vec::new()))?
            ),
            _ => println!("\nNo test files found to evaluate."),
        }
        return Ok(());
    }

    let bar = ProgressBar::new(samples.len() as u64);
    let report = evaluate(&encoder, &FileExtractor, &classes, &samples, Some(&bar))?;
    bar.finish_and_clear();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_report(&report),
    }
    Ok(())
}

fn print_decision(decision: &Decision) {
    println!(
        "    Cosine to benign:    {:+.4}  (0..1: {:.4})",
        decision.benign_similarity, decision.benign_score
    );
    println!(
        "    Cosine to malicious: {:+.4}  (0..1: {:.4})",
        decision.malicious_similarity, decision.malicious_score
    );
    println!("    Margin (benign - malicious): {:+.4}", decision.margin);
}

fn styled_label(label: Label) -> console::StyledObject<&'static str> {
    match label {
        Label::Benign => style(label.as_str()).green(),
        Label::Malicious => style(label.as_str()).red(),
    }
}

fn print_report(report: &EvaluationReport) {
    for label in Label::ALL {
        println!("\n{}", style(format!("{label} test")).bold());
        for p in report.predictions.iter().filter(|p| p.expected == label) {
            let mark = if p.correct {
                style("[OK]").green()
            } else {
                style("[MISS]").red()
            };
            println!(
                "  {} {}: predicted = {}",
                mark,
                p.file,
                styled_label(p.decision.label)
            );
            print_decision(&p.decision);
        }
    }

    println!(
        "\nAccuracy: {}/{} = {:.2}%",
        style(report.correct).cyan(),
        report.total,
        report.accuracy * 100.0
    );
}

#[derive(Debug, Serialize)]
struct FileDecision {
    file: String,
    decision: Decision,
}

pub fn predict(config: &HdcConfig, files: &[PathBuf], format: &str, vocab: Option<&Path>) -> Result<()> {
    let (classes, codebook) = load_model(config, vocab)?;
    let encoder = Encoder::new(&codebook, config.encoding.max_ops);
    let source = FileExtractor;

    let decisions = files
        .par_iter()
        .map(|path| -> Result<FileDecision> {
            let methods = source.extract(path, encoder.max_ops());
            let vector = encoder.encode(&methods)?;
            Ok(FileDecision {
                file: path.display().to_string(),
                decision: classify(&vector, &classes)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&decisions)?),
        _ => {
            for d in &decisions {
                println!("\n{}: {}", style(&d.file).bold(), styled_label(d.decision.label));
                print_decision(&d.decision);
            }
        }
    }
    Ok(())
}
