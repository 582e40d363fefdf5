use crate::channel::Reporter;
use crate::model::{AppEvent, FormatKind, TrainOutcome};
use crate::store;
use crate::trainer;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "text-classifier-cli",
    version,
    about = "Train a small text classifier from a Q&A document, with optional TUI"
)]
pub struct Cli {
    /// Training document (JSON, YAML or TOML); the kind is inferred from the extension
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Root directory holding the generated/<kind> artifact folders
    #[arg(long, default_value = ".")]
    pub artifact_root: PathBuf,

    /// Training epochs
    #[arg(long, default_value_t = 12)]
    pub epochs: usize,

    /// Print the final report as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text log and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Convert the trained model to the deployable format after training (headless modes)
    #[arg(long)]
    pub convert: bool,

    /// Export the deployable model to this path after converting (headless modes)
    #[arg(long)]
    pub export: Option<PathBuf>,
}

pub async fn run(args: Cli) -> Result<()> {
    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_headless(args, false).await;
        }
    }

    let json = args.json;
    run_headless(args, json).await
}

/// Final report for scripting consumers.
#[derive(Debug, Serialize)]
struct RunReport {
    timestamp_utc: String,
    source: PathBuf,
    kind: FormatKind,
    item_count: usize,
    tokenizer_path: PathBuf,
    model_path: PathBuf,
    label_map_path: PathBuf,
    deployable_path: Option<PathBuf>,
    exported_path: Option<PathBuf>,
}

/// Run the import -> train [-> convert -> export] pipeline without a TUI.
/// Log lines go to stderr; `json` routes the final report to stdout.
async fn run_headless(args: Cli, json: bool) -> Result<()> {
    let source = args
        .source
        .clone()
        .context("--source is required in headless mode")?;
    let kind = FormatKind::from_path(&source).with_context(|| {
        format!(
            "unsupported document extension: {} (expected .json, .yaml or .toml)",
            source.display()
        )
    })?;

    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<AppEvent>();

    let reporter = Reporter::new(evt_tx);
    let root = args.artifact_root.clone();
    let epochs = args.epochs;
    let do_convert = args.convert;
    let src = source.clone();
    // The channel closes once the job drops its reporter, ending the drain
    // loop below.
    let handle = tokio::task::spawn_blocking(move || {
        let outcome = trainer::train(&src, kind, &root, epochs, &reporter)?;
        let deployable = if do_convert {
            Some(trainer::convert(&store::dir(&root, kind), &reporter)?)
        } else {
            None
        };
        Ok::<(TrainOutcome, Option<PathBuf>), trainer::TrainerError>((outcome, deployable))
    });

    while let Some(ev) = evt_rx.recv().await {
        match ev {
            AppEvent::Log { line } => {
                let _ = out_tx.send(OutputLine::Stderr(line));
            }
            // Per-epoch log lines already narrate progress in headless mode.
            _ => {}
        }
    }

    let (outcome, deployable_path) = handle.await.context("training task failed")??;

    let exported_path = match args.export.as_deref() {
        Some(dest) => {
            let deployable = store::resolve(&args.artifact_root, kind, store::DEPLOYABLE_FILE);
            std::fs::copy(&deployable, dest)
                .with_context(|| format!("cannot export to {}", dest.display()))?;
            let _ = out_tx.send(OutputLine::Stderr(format!("Exported: {}", dest.display())));
            Some(dest.to_path_buf())
        }
        None => None,
    };

    let report = RunReport {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        source,
        kind,
        item_count: outcome.item_count,
        tokenizer_path: outcome.tokenizer_path,
        model_path: outcome.model_path,
        label_map_path: outcome.label_map_path,
        deployable_path,
        exported_path,
    };

    if json {
        let out = serde_json::to_string_pretty(&report)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        let _ = out_tx.send(OutputLine::Stdout(format!(
            "Items serialized: {}",
            report.item_count
        )));
        let _ = out_tx.send(OutputLine::Stdout(format!(
            "Model: {}",
            report.model_path.display()
        )));
        if let Some(p) = report.deployable_path.as_ref() {
            let _ = out_tx.send(OutputLine::Stdout(format!("Deployable: {}", p.display())));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
