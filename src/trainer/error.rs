use std::path::PathBuf;
use thiserror::Error;

/// Trainer failure taxonomy.
///
/// Input errors are raised before any artifact is written. Environment errors
/// cover the artifact directory and serialization I/O. Missing-artifact errors
/// are raised when conversion is requested before a model exists.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("invalid training document: {0}")]
    Input(String),

    #[error("artifact environment error: {0}")]
    Environment(String),

    #[error("model artifact not found at {}", path.display())]
    MissingArtifact { path: PathBuf },
}
