//! Export and vocab commands - JSON interchange documents

use anyhow::{Context, Result};
use apkhd::classifier::Label;
use apkhd::config::HdcConfig;
use apkhd::extract::extract_opcodes;
use apkhd::hdc::Codebook;
use apkhd::samples::list_samples;
use apkhd::store::{ClassVectorDocument, NpyStore, VectorStore, VocabularyDocument};
use console::style;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn run_export(config: &HdcConfig, output: &Path) -> Result<()> {
    let store = NpyStore::new(&config.store.dir);
    let classes = store.load_all()?;
    ClassVectorDocument::from_classes(&classes)
        .write(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "{} Exported {} class vectors (D={}) to {}",
        style("✓").green(),
        Label::ALL.len(),
        classes.dim(),
        style(output.display()).cyan()
    );
    Ok(())
}

pub fn run_vocab(
    config: &HdcConfig,
    benign: &Path,
    malicious: &Path,
    include_methods: bool,
    output: &Path,
) -> Result<()> {
    let mut files: Vec<PathBuf> = Vec::new();
    for dir in [benign, malicious] {
        let listed = list_samples(dir, &config.samples.extensions)
            .with_context(|| format!("Cannot list samples in {}", dir.display()))?;
        files.extend(listed.into_iter().take(config.training.max_apps));
    }
    info!("Collecting vocabulary from {} samples", files.len());

    let codebook = Codebook::new(config.encoding.dimension)?;
    let max_ops = config.encoding.max_ops;
    files.par_iter().try_for_each(|path| -> Result<()> {
        let methods = extract_opcodes(path, max_ops);
        for (method, ops) in &methods {
            if include_methods {
                codebook.method(method)?;
            }
            for op in ops {
                codebook.opcode(op)?;
            }
        }
        Ok(())
    })?;

    let mut doc = VocabularyDocument::from_opcode_cache(codebook.opcodes());
    if include_methods {
        doc = doc.with_methods(codebook.methods());
    }
    doc.write(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} Saved {} opcode vectors{} (D={}) to {}",
        style("✓").green(),
        style(doc.len()).cyan(),
        if include_methods {
            format!(" and {} method vectors", doc.methods.len())
        } else {
            String::new()
        },
        codebook.dim(),
        style(output.display()).cyan()
    );
    Ok(())
}
