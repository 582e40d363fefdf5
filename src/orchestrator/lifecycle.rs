//! Lifecycle state machine guards.
//!
//! The state itself lives in the session context; this module derives which
//! user actions are legal for a state given what is on disk, and the status
//! text shown for each state.

use crate::model::{Actions, LifecycleState};
use crate::store::ArtifactCheck;

impl LifecycleState {
    /// Status line wording for the presentation layer.
    pub fn status_text(self) -> &'static str {
        match self {
            LifecycleState::Idle => "untrained model",
            LifecycleState::Training => "training model",
            LifecycleState::Trained => "model trained",
            LifecycleState::Converting => "generating deployable",
            LifecycleState::Converted => "deployable generated",
            LifecycleState::Exporting => "exporting",
            LifecycleState::Exported => "export complete",
            LifecycleState::Error => "error in process",
        }
    }

    /// Whether a background job may currently be dispatched or an import
    /// accepted. Exporting is synchronous but still blocks other actions.
    pub fn is_settled(self) -> bool {
        !matches!(
            self,
            LifecycleState::Training | LifecycleState::Converting | LifecycleState::Exporting
        )
    }
}

/// Derive the enabled actions for a state.
///
/// Train is only legal from a settled pre-training state; convert follows
/// either a successful training run or artifacts already on disk at import
/// time (stale-but-valid); export mirrors that for the deployable artifact.
pub fn enabled_actions(
    state: LifecycleState,
    has_source: bool,
    check: &ArtifactCheck,
) -> Actions {
    let settled = state.is_settled();
    Actions {
        import: settled,
        train: settled && has_source && matches!(state, LifecycleState::Idle | LifecycleState::Error),
        convert: match state {
            LifecycleState::Trained => true,
            LifecycleState::Idle => has_source && check.all_present,
            _ => false,
        },
        export: match state {
            LifecycleState::Converted | LifecycleState::Exported => true,
            LifecycleState::Idle => has_source && check.deployable_present,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn check(all: bool, deployable: bool) -> ArtifactCheck {
        ArtifactCheck {
            all_present: all,
            deployable_present: deployable,
            dir: PathBuf::from("generated/json"),
        }
    }

    #[test]
    fn trained_enables_only_convert() {
        let a = enabled_actions(LifecycleState::Trained, true, &check(true, false));
        assert!(!a.train);
        assert!(a.convert);
        assert!(!a.export);
        assert!(a.import);
    }

    #[test]
    fn running_jobs_disable_everything() {
        for state in [LifecycleState::Training, LifecycleState::Converting] {
            let a = enabled_actions(state, true, &check(true, true));
            assert_eq!(a, Actions::default());
        }
    }

    #[test]
    fn idle_with_stale_artifacts_reenables_convert_and_export() {
        let a = enabled_actions(LifecycleState::Idle, true, &check(true, true));
        assert!(a.train);
        assert!(a.convert);
        assert!(a.export);
    }

    #[test]
    fn idle_without_artifacts_only_trains() {
        let a = enabled_actions(LifecycleState::Idle, true, &check(false, false));
        assert!(a.train);
        assert!(!a.convert);
        assert!(!a.export);
    }

    #[test]
    fn idle_without_source_only_imports() {
        let a = enabled_actions(LifecycleState::Idle, false, &check(true, true));
        assert!(a.import);
        assert!(!a.train);
        assert!(!a.convert);
        assert!(!a.export);
    }

    #[test]
    fn error_allows_import_to_retry() {
        let a = enabled_actions(LifecycleState::Error, true, &check(false, false));
        assert!(a.import);
        assert!(a.train);
        assert!(!a.convert);
    }

    #[test]
    fn converted_and_exported_enable_export() {
        for state in [LifecycleState::Converted, LifecycleState::Exported] {
            let a = enabled_actions(state, true, &check(true, true));
            assert!(a.export, "{state:?}");
            assert!(!a.convert, "{state:?}");
        }
    }
}
