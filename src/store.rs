//! Filesystem convention for generated artifacts.
//!
//! Each format kind owns `generated/<kind>/` under the artifact root, holding
//! three required files (tokenizer, model, label map) and one optional file
//! (the deployable model). Paths are deterministic functions of (root, kind);
//! nothing is ever cached, completeness is always recomputed from disk.

use crate::model::FormatKind;
use std::fs;
use std::path::{Path, PathBuf};

pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const MODEL_FILE: &str = "text_classifier.model.json";
pub const LABEL_MAP_FILE: &str = "label_encoder.json";
pub const DEPLOYABLE_FILE: &str = "text_classifier.bin";

const REQUIRED_FILES: [&str; 3] = [TOKENIZER_FILE, MODEL_FILE, LABEL_MAP_FILE];

/// Snapshot of which artifacts are present for one kind.
#[derive(Debug, Clone)]
pub struct ArtifactCheck {
    pub all_present: bool,
    pub deployable_present: bool,
    pub dir: PathBuf,
}

/// Artifact directory for one kind. Pure, no I/O.
pub fn dir(root: &Path, kind: FormatKind) -> PathBuf {
    root.join("generated").join(kind.as_dir())
}

/// Full path of one artifact file. Pure, no I/O.
pub fn resolve(root: &Path, kind: FormatKind, name: &str) -> PathBuf {
    dir(root, kind).join(name)
}

/// Recompute artifact completeness for one kind from disk.
pub fn exists(root: &Path, kind: FormatKind) -> ArtifactCheck {
    let dir = dir(root, kind);
    let all_present = REQUIRED_FILES.iter().all(|f| dir.join(f).exists());
    let deployable_present = dir.join(DEPLOYABLE_FILE).exists();
    ArtifactCheck {
        all_present,
        deployable_present,
        dir,
    }
}

/// Delete the artifacts for one kind, best-effort.
///
/// Individual removal failures are swallowed; a half-cleared directory is
/// acceptable because the next training run overwrites whatever remains.
pub fn clear(root: &Path, kind: FormatKind) {
    let dir = dir(root, kind);
    for name in REQUIRED_FILES.iter().chain([DEPLOYABLE_FILE].iter()) {
        let _ = fs::remove_file(dir.join(name));
    }
}
