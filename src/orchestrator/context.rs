//! Session context: the single mutable home for the active source, kind,
//! lifecycle state and watch arm. One instance per session, owned by the
//! controller and passed explicitly to every operation.

use crate::model::{Actions, FormatKind, LifecycleState};
use crate::orchestrator::lifecycle;
use crate::orchestrator::watcher::ArtifactWatcher;
use crate::store::{self, ArtifactCheck};
use std::path::PathBuf;

pub(crate) struct SessionCtx {
    pub root: PathBuf,
    pub source: Option<PathBuf>,
    pub kind: Option<FormatKind>,
    pub state: LifecycleState,
    pub watcher: ArtifactWatcher,
}

impl SessionCtx {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            source: None,
            kind: None,
            state: LifecycleState::Idle,
            watcher: ArtifactWatcher::new(),
        }
    }

    /// Artifact completeness for the active kind, recomputed from disk.
    pub fn check(&self) -> ArtifactCheck {
        match self.kind {
            Some(kind) => store::exists(&self.root, kind),
            None => ArtifactCheck {
                all_present: false,
                deployable_present: false,
                dir: self.root.join("generated"),
            },
        }
    }

    /// Currently legal actions, derived fresh.
    pub fn actions(&self) -> Actions {
        lifecycle::enabled_actions(self.state, self.source.is_some(), &self.check())
    }

    /// Register a newly imported source. State resets unconditionally to a
    /// pre-training state; the watcher re-arms with a fresh completeness
    /// snapshot so stale artifacts never look freshly generated.
    pub fn import(&mut self, path: PathBuf, kind: FormatKind) {
        self.source = Some(path);
        self.kind = Some(kind);
        self.state = LifecycleState::Idle;
        self.watcher.arm(&self.root, kind);
    }
}
