//! Artifact completeness watcher.
//!
//! Armed with the active kind and whether the artifacts were already complete
//! at arm time. Push notifications and the polling fallback both funnel into
//! `check`, which fires at most once per arm cycle and only on the transition
//! into completeness. The arm state is dropped before the fire is reported,
//! so a racing second detection observes a disarmed watcher.

use crate::model::FormatKind;
use crate::store;
use std::path::{Path, PathBuf};

/// Snapshot taken when the watcher is armed.
#[derive(Debug, Clone, Copy)]
struct WatchArm {
    kind: FormatKind,
    initially_complete: bool,
}

#[derive(Debug, Default)]
pub struct ArtifactWatcher {
    arm: Option<WatchArm>,
}

impl ArtifactWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for one kind, recomputing `initially_complete` fresh from disk.
    pub fn arm(&mut self, root: &Path, kind: FormatKind) {
        let initially_complete = store::exists(root, kind).all_present;
        self.arm = Some(WatchArm {
            kind,
            initially_complete,
        });
    }

    pub fn is_armed(&self) -> bool {
        self.arm.is_some()
    }

    /// Recheck completeness; returns the artifact directory exactly once per
    /// arm cycle, on the incomplete-to-complete transition.
    ///
    /// Never fires when the artifacts were already complete at arm time, even
    /// if the files are touched again afterwards.
    pub fn check(&mut self, root: &Path) -> Option<PathBuf> {
        let arm = self.arm.as_ref()?;
        if arm.initially_complete {
            return None;
        }
        let check = store::exists(root, arm.kind);
        if !check.all_present {
            return None;
        }
        self.arm = None;
        Some(check.dir)
    }
}
