//! Training and conversion jobs.
//!
//! One trainer serves all three document formats; only the parsing step
//! differs and that is selected by `FormatKind`. Both operations are
//! synchronous and blocking — callers own all asynchrony — and report
//! through the channel `Reporter` while returning typed outcomes.

pub mod classifier;
pub mod deploy;
mod error;
pub mod tokenizer;

pub use error::TrainerError;

use crate::channel::Reporter;
use crate::document;
use crate::model::{FormatKind, TrainOutcome};
use crate::store;
use classifier::FitConfig;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Progress band covered by the epoch loop; the surrounding steps use the
/// values below 20 and above 85.
const EPOCH_BAND: (u8, u8) = (20, 85);

fn env_err(context: &str, e: impl std::fmt::Display) -> TrainerError {
    TrainerError::Environment(format!("{context}: {e}"))
}

/// Train a classifier from `source`, writing the three artifacts under
/// `generated/<kind>/` below `root`.
///
/// Reports progress reaching 100 on success. Raises an input error before any
/// artifact is written when the document yields zero training pairs.
pub fn train(
    source: &Path,
    kind: FormatKind,
    root: &Path,
    epochs: usize,
    reporter: &Reporter,
) -> Result<TrainOutcome, TrainerError> {
    reporter.progress(0);
    reporter.log(format!("Training started from {}", source.display()));

    let pairs = document::parse(source, kind)?;
    if pairs.is_empty() {
        return Err(TrainerError::Input(format!(
            "no answers or synonyms found in {}",
            source.display()
        )));
    }
    reporter.log(format!("Parsed {} training pairs", pairs.len()));
    reporter.progress(10);

    let texts: Vec<String> = pairs.iter().map(|p| p.text.clone()).collect();
    let tokenizer = tokenizer::Tokenizer::fit(&texts);
    let sequences = tokenizer.sequences(&texts);
    let (padded, max_len) = tokenizer::pad_post(&sequences);
    reporter.log(format!(
        "Tokenizer fitted: {} words, sequence length {max_len}",
        tokenizer.vocab_len()
    ));
    reporter.progress(15);

    let label_map = build_label_map(&pairs);
    let labels: Vec<usize> = pairs.iter().map(|p| label_map[&p.label]).collect();
    reporter.log(format!("{} classes", label_map.len()));
    reporter.progress(EPOCH_BAND.0);

    let cfg = FitConfig {
        epochs,
        ..Default::default()
    };
    let (lo, hi) = EPOCH_BAND;
    let model = classifier::fit(
        &padded,
        &labels,
        tokenizer.vocab_len() + 1,
        label_map.len(),
        max_len,
        &cfg,
        |stats| {
            let span = (hi - lo) as f32;
            let pct = lo + (span * stats.epoch as f32 / epochs.max(1) as f32) as u8;
            reporter.progress(pct);
            reporter.log(format!(
                "Epoch {}/{}: loss {:.4}, accuracy {:.2}",
                stats.epoch, epochs, stats.loss, stats.accuracy
            ));
        },
    );

    let dir = store::dir(root, kind);
    fs::create_dir_all(&dir).map_err(|e| env_err("cannot create artifact directory", e))?;

    let tokenizer_path = dir.join(store::TOKENIZER_FILE);
    let tokenizer_json = serde_json::to_string_pretty(&tokenizer)
        .map_err(|e| env_err("cannot serialize tokenizer", e))?;
    fs::write(&tokenizer_path, tokenizer_json)
        .map_err(|e| env_err("cannot write tokenizer", e))?;
    reporter.log(format!("Tokenizer saved: {}", tokenizer_path.display()));
    reporter.progress(90);

    let model_path = dir.join(store::MODEL_FILE);
    let model_json =
        serde_json::to_string(&model).map_err(|e| env_err("cannot serialize model", e))?;
    fs::write(&model_path, model_json).map_err(|e| env_err("cannot write model", e))?;
    reporter.log(format!("Model saved: {}", model_path.display()));

    let label_map_path = dir.join(store::LABEL_MAP_FILE);
    let label_json = serde_json::to_string_pretty(&label_map)
        .map_err(|e| env_err("cannot serialize label map", e))?;
    fs::write(&label_map_path, label_json)
        .map_err(|e| env_err("cannot write label map", e))?;
    reporter.log(format!("Label map saved: {}", label_map_path.display()));
    reporter.progress(95);

    let outcome = TrainOutcome {
        item_count: pairs.len(),
        tokenizer_path,
        model_path,
        label_map_path,
    };
    reporter.progress(100);
    Ok(outcome)
}

/// Convert the trained model in `model_dir` to the deployable format.
///
/// Requires the model artifact to already exist; reports progress reaching
/// 100 and writes the deployable file before returning its path.
pub fn convert(model_dir: &Path, reporter: &Reporter) -> Result<PathBuf, TrainerError> {
    reporter.progress(0);
    reporter.log(format!("Converting model in {}", model_dir.display()));

    let model_path = model_dir.join(store::MODEL_FILE);
    if !model_path.exists() {
        return Err(TrainerError::MissingArtifact { path: model_path });
    }

    let raw =
        fs::read_to_string(&model_path).map_err(|e| env_err("cannot read model artifact", e))?;
    let model: classifier::Model =
        serde_json::from_str(&raw).map_err(|e| env_err("cannot decode model artifact", e))?;
    reporter.progress(30);

    let bytes = deploy::encode(&model);
    reporter.progress(70);

    let out_path = model_dir.join(store::DEPLOYABLE_FILE);
    fs::write(&out_path, bytes).map_err(|e| env_err("cannot write deployable model", e))?;
    reporter.log(format!("Deployable model saved: {}", out_path.display()));
    reporter.progress(100);
    Ok(out_path)
}

/// Deterministic label map: unique category keys sorted lexicographically,
/// assigned contiguous indices from zero.
fn build_label_map(pairs: &[crate::model::TrainingPair]) -> BTreeMap<String, usize> {
    let unique: std::collections::BTreeSet<&str> = pairs.iter().map(|p| p.label.as_str()).collect();
    unique
        .into_iter()
        .enumerate()
        .map(|(i, label)| (label.to_string(), i))
        .collect()
}
