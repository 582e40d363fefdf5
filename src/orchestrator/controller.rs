//! Job lifecycle controller.
//!
//! Owns the session context and the single background job slot, dispatches
//! training/conversion work off the interaction thread, forwards job events
//! to presentation layers, and drives the artifact watcher from both the
//! filesystem push path and the polling fallback.

use crate::channel::Reporter;
use crate::cli::Cli;
use crate::model::{AppEvent, FormatKind, LifecycleState, TrainOutcome};
use crate::orchestrator::context::SessionCtx;
use crate::store;
use crate::trainer::{self, TrainerError};
use anyhow::Result;
use notify::{RecursiveMode, Watcher};
use std::fs;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Duration;

/// Commands emitted by presentation layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Import { path: PathBuf },
    Train,
    Convert,
    Export { dest: Option<PathBuf> },
    ClearArtifacts,
    Quit,
}

enum JobDone {
    Train(Result<TrainOutcome, TrainerError>),
    Convert(Result<PathBuf, TrainerError>),
}

/// Handle for the single active background job.
struct JobCtx {
    handle: Option<tokio::task::JoinHandle<JobDone>>,
}

fn send_log(event_tx: &UnboundedSender<AppEvent>, line: impl Into<String>) {
    let _ = event_tx.send(AppEvent::Log { line: line.into() });
}

fn send_state(ctx: &SessionCtx, event_tx: &UnboundedSender<AppEvent>) {
    let _ = event_tx.send(AppEvent::State {
        state: ctx.state,
        actions: ctx.actions(),
    });
}

/// Register a recursive notify watcher over `generated/`, forwarding change
/// pings into the controller loop. The watcher must stay alive for the push
/// path to keep working; polling covers platforms where it cannot start.
fn spawn_fs_watcher(
    root: &std::path::Path,
    fs_tx: mpsc::UnboundedSender<()>,
) -> Result<notify::RecommendedWatcher> {
    let gen_dir = root.join("generated");
    fs::create_dir_all(&gen_dir)?;
    let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
        if res.is_ok() {
            let _ = fs_tx.send(());
        }
    })?;
    watcher.watch(&gen_dir, RecursiveMode::Recursive)?;
    Ok(watcher)
}

fn handle_import(ctx: &mut SessionCtx, event_tx: &UnboundedSender<AppEvent>, path: PathBuf) {
    if !ctx.actions().import {
        return;
    }
    let Some(kind) = FormatKind::from_path(&path) else {
        send_log(
            event_tx,
            format!("Unsupported document extension: {}", path.display()),
        );
        return;
    };
    ctx.import(path.clone(), kind);
    let _ = event_tx.send(AppEvent::Source { path: path.clone(), kind });
    send_log(event_tx, format!("File selected: {} ({kind})", path.display()));
    // Stale-but-valid: artifacts already on disk re-enable convert/export
    // through the derived actions, while the status resets to untrained.
    send_state(ctx, event_tx);
}

fn start_train(
    ctx: &mut SessionCtx,
    event_tx: &UnboundedSender<AppEvent>,
    epochs: usize,
) -> Option<JobCtx> {
    if !ctx.actions().train {
        return None;
    }
    let (source, kind) = (ctx.source.clone()?, ctx.kind?);

    // Stale artifacts would make the watcher's arm snapshot look complete,
    // so clear first, then arm.
    store::clear(&ctx.root, kind);
    ctx.watcher.arm(&ctx.root, kind);
    ctx.state = LifecycleState::Training;

    let _ = event_tx.send(AppEvent::Progress { pct: 0 });
    send_log(event_tx, "Training model");
    send_state(ctx, event_tx);

    let reporter = Reporter::new(event_tx.clone());
    let root = ctx.root.clone();
    let handle = tokio::task::spawn_blocking(move || {
        JobDone::Train(trainer::train(&source, kind, &root, epochs, &reporter))
    });
    Some(JobCtx {
        handle: Some(handle),
    })
}

fn start_convert(ctx: &mut SessionCtx, event_tx: &UnboundedSender<AppEvent>) -> Option<JobCtx> {
    if !ctx.actions().convert {
        return None;
    }
    let kind = ctx.kind?;
    ctx.state = LifecycleState::Converting;

    let _ = event_tx.send(AppEvent::Progress { pct: 0 });
    send_log(event_tx, "Generating deployable model");
    send_state(ctx, event_tx);

    let reporter = Reporter::new(event_tx.clone());
    let model_dir = store::dir(&ctx.root, kind);
    let handle = tokio::task::spawn_blocking(move || {
        JobDone::Convert(trainer::convert(&model_dir, &reporter))
    });
    Some(JobCtx {
        handle: Some(handle),
    })
}

/// Synchronous export: a plain file copy, no channel involved. Failure is
/// reported inline and leaves the lifecycle state untouched, since the
/// deployable artifact itself is unaffected.
fn handle_export(
    ctx: &mut SessionCtx,
    event_tx: &UnboundedSender<AppEvent>,
    dest: Option<PathBuf>,
) {
    if !ctx.actions().export {
        return;
    }
    let Some(kind) = ctx.kind else { return };
    let src = store::resolve(&ctx.root, kind, store::DEPLOYABLE_FILE);
    let dest = dest.unwrap_or_else(|| {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(store::DEPLOYABLE_FILE)
    });

    let prev = ctx.state;
    ctx.state = LifecycleState::Exporting;
    match fs::copy(&src, &dest) {
        Ok(_) => {
            ctx.state = LifecycleState::Exported;
            send_log(event_tx, format!("Exported: {}", dest.display()));
            let _ = event_tx.send(AppEvent::Exported { dest });
        }
        Err(e) => {
            ctx.state = prev;
            send_log(event_tx, format!("Export failed: {e}"));
        }
    }
    send_state(ctx, event_tx);
}

fn handle_clear(ctx: &mut SessionCtx, event_tx: &UnboundedSender<AppEvent>) {
    if !ctx.state.is_settled() {
        return;
    }
    let Some(kind) = ctx.kind else { return };
    store::clear(&ctx.root, kind);
    ctx.watcher.arm(&ctx.root, kind);
    ctx.state = LifecycleState::Idle;
    send_log(event_tx, format!("Cleared generated artifacts for {kind}"));
    send_state(ctx, event_tx);
}

/// Run a watcher check; fires at most once per arm cycle.
fn run_watch_check(ctx: &mut SessionCtx, event_tx: &UnboundedSender<AppEvent>) {
    if let Some(dir) = ctx.watcher.check(&ctx.root) {
        send_log(
            event_tx,
            format!("Generated artifacts detected in: {}", dir.display()),
        );
        send_state(ctx, event_tx);
    }
}

fn finish_job(ctx: &mut SessionCtx, event_tx: &UnboundedSender<AppEvent>, done: JobDone) {
    match done {
        JobDone::Train(Ok(outcome)) => {
            // Progress alone is not success: the store check is the
            // authoritative confirmation that all artifacts landed on disk.
            if ctx.check().all_present {
                ctx.state = LifecycleState::Trained;
                send_log(
                    event_tx,
                    format!("Training finished: {} items serialized", outcome.item_count),
                );
                let _ = event_tx.send(AppEvent::TrainCompleted {
                    outcome: Box::new(outcome),
                });
            } else {
                ctx.state = LifecycleState::Error;
                send_log(
                    event_tx,
                    "Training reported success but artifacts are missing",
                );
            }
        }
        JobDone::Train(Err(e)) => {
            ctx.state = LifecycleState::Error;
            send_log(event_tx, format!("Training failed: {e}"));
        }
        JobDone::Convert(Ok(path)) => {
            if ctx.check().deployable_present {
                ctx.state = LifecycleState::Converted;
                send_log(event_tx, format!("Conversion completed: {}", path.display()));
                let _ = event_tx.send(AppEvent::ConvertCompleted {
                    deployable_path: path,
                });
            } else {
                ctx.state = LifecycleState::Error;
                send_log(
                    event_tx,
                    "Conversion reported success but the deployable is missing",
                );
            }
        }
        JobDone::Convert(Err(e)) => {
            ctx.state = LifecycleState::Error;
            send_log(event_tx, format!("Conversion failed: {e}"));
        }
    }
    send_state(ctx, event_tx);
}

/// Orchestrate jobs based on UI commands and emit events back to
/// presentation layers. At most one background job runs at a time; a command
/// whose action is disabled in the current state is a no-op.
pub(crate) async fn run_controller(
    args: &Cli,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut ctx = SessionCtx::new(args.artifact_root.clone());
    let mut job_ctx: Option<JobCtx> = None;
    let mut quit_pending = false;

    let (fs_tx, mut fs_rx) = mpsc::unbounded_channel::<()>();
    let _fs_watcher = match spawn_fs_watcher(&ctx.root, fs_tx) {
        Ok(w) => Some(w),
        Err(e) => {
            send_log(
                &event_tx,
                format!("Filesystem notifications unavailable ({e}); polling only"),
            );
            None
        }
    };
    let mut poll = tokio::time::interval(Duration::from_millis(500));

    if let Some(path) = args.source.clone() {
        handle_import(&mut ctx, &event_tx, path);
    } else {
        send_state(&ctx, &event_tx);
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Import { path }) => handle_import(&mut ctx, &event_tx, path),
                    Some(UiCommand::Train) => {
                        if job_ctx.is_none() {
                            job_ctx = start_train(&mut ctx, &event_tx, args.epochs);
                        }
                    }
                    Some(UiCommand::Convert) => {
                        if job_ctx.is_none() {
                            job_ctx = start_convert(&mut ctx, &event_tx);
                        }
                    }
                    Some(UiCommand::Export { dest }) => handle_export(&mut ctx, &event_tx, dest),
                    Some(UiCommand::ClearArtifacts) => handle_clear(&mut ctx, &event_tx),
                    Some(UiCommand::Quit) | None => {
                        // No cancellation exists; wait for the active job so
                        // its artifacts are not left mid-write.
                        if job_ctx.is_some() {
                            quit_pending = true;
                            send_log(&event_tx, "Waiting for the active job to finish");
                        } else {
                            break;
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it
            // can be dropped if another select branch is chosen, and we'll
            // never observe completion.
            maybe_done = async {
                if let Some(job) = &mut job_ctx {
                    if let Some(h) = job.handle.as_mut() {
                        return Some(h.await);
                    }
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    if let Some(job) = &mut job_ctx {
                        job.handle.take();
                    }
                    job_ctx = None;
                    // Let the watcher observe completeness before the state
                    // transition so both signals land in one drain.
                    run_watch_check(&mut ctx, &event_tx);
                    match join_res {
                        Ok(done) => finish_job(&mut ctx, &event_tx, done),
                        Err(e) => {
                            ctx.state = LifecycleState::Error;
                            send_log(&event_tx, format!("Job panicked: {e}"));
                            send_state(&ctx, &event_tx);
                        }
                    }
                    if quit_pending {
                        break;
                    }
                }
            }
            _ = fs_rx.recv() => {
                if ctx.watcher.is_armed() {
                    run_watch_check(&mut ctx, &event_tx);
                }
            }
            _ = poll.tick() => {
                if ctx.watcher.is_armed() {
                    run_watch_check(&mut ctx, &event_tx);
                }
            }
        }
    }

    Ok(())
}
