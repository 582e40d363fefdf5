use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which of the three supported document serializations is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Json,
    Yaml,
    Toml,
}

impl FormatKind {
    /// Infer the kind from a file extension. Returns None for anything else.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(FormatKind::Json),
            Some("yaml") | Some("yml") => Some(FormatKind::Yaml),
            Some("toml") => Some(FormatKind::Toml),
            _ => None,
        }
    }

    /// Artifact subdirectory name under `generated/`.
    pub fn as_dir(self) -> &'static str {
        match self {
            FormatKind::Json => "json",
            FormatKind::Yaml => "yaml",
            FormatKind::Toml => "toml",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_dir())
    }
}

/// Authoritative lifecycle state. Exactly one is active at a time; import is
/// instantaneous and therefore has no state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Idle,
    Training,
    Trained,
    Converting,
    Converted,
    Exporting,
    Exported,
    Error,
}

/// Which user actions are currently legal. Derived from the lifecycle state
/// plus what is on disk; never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actions {
    pub import: bool,
    pub train: bool,
    pub convert: bool,
    pub export: bool,
}

/// One (text, category label) pair extracted from a document. Held only for
/// the duration of a training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingPair {
    pub text: String,
    pub label: String,
}

/// Result of a completed training job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainOutcome {
    pub item_count: usize,
    pub tokenizer_path: PathBuf,
    pub model_path: PathBuf,
    pub label_map_path: PathBuf,
}

/// Events flowing from background jobs and the controller to presentation
/// layers. Progress values are 0-100 and not required to be monotone between
/// phases; consumers display the latest value received. Log lines must be
/// delivered in order, none dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    Progress {
        pct: u8,
    },
    Log {
        line: String,
    },
    /// Lifecycle transition together with the freshly derived action guards.
    State {
        state: LifecycleState,
        actions: Actions,
    },
    Source {
        path: PathBuf,
        kind: FormatKind,
    },
    TrainCompleted {
        // Box to keep AppEvent size small; TrainOutcome carries three paths.
        outcome: Box<TrainOutcome>,
    },
    ConvertCompleted {
        deployable_path: PathBuf,
    },
    Exported {
        dest: PathBuf,
    },
}
