mod state;

use crate::channel;
use crate::cli::Cli;
use crate::model::{AppEvent, FormatKind, LifecycleState};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Terminal,
};
use state::UiState;
use std::path::PathBuf;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure between the trainer and the UI.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking terminal I/O out of
    // the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&args, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::default();
    if let Some(path) = args.source.clone() {
        state.kind = FormatKind::from_path(&path);
        state.source = Some(path);
    }

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain pending events without blocking. Only the last progress value
        // is applied per drain; log lines keep their order.
        let drained = channel::drain(&mut event_rx);
        if let Some(pct) = drained.progress {
            state.progress = pct;
        }
        for ev in drained.events {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if state.editing_path {
                    if k.modifiers == KeyModifiers::CONTROL && k.code == KeyCode::Char('c') {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    handle_path_input(&mut state, &cmd_tx, k.code);
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('i')) => {
                        if state.actions.import {
                            state.editing_path = true;
                            state.path_input = state
                                .source
                                .as_ref()
                                .map(|p| p.display().to_string())
                                .unwrap_or_default();
                        }
                    }
                    (_, KeyCode::Char('t')) => {
                        if state.actions.train {
                            let _ = cmd_tx.send(UiCommand::Train);
                        }
                    }
                    (_, KeyCode::Char('c')) => {
                        if state.actions.convert {
                            let _ = cmd_tx.send(UiCommand::Convert);
                        }
                    }
                    (_, KeyCode::Char('e')) => {
                        if state.actions.export {
                            let _ = cmd_tx.send(UiCommand::Export { dest: None });
                        }
                    }
                    (_, KeyCode::Char('x')) => {
                        let _ = cmd_tx.send(UiCommand::ClearArtifacts);
                    }
                    (_, KeyCode::Char('L')) => state.clear_log(),
                    (_, KeyCode::Up) => state.scroll_up(1),
                    (_, KeyCode::Down) => state.scroll_down(1),
                    (_, KeyCode::PageUp) => state.scroll_up(10),
                    (_, KeyCode::PageDown) => state.scroll_down(10),
                    (_, KeyCode::End) => state.scroll_to_bottom(),
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn handle_path_input(
    state: &mut UiState,
    cmd_tx: &UnboundedSender<UiCommand>,
    code: KeyCode,
) {
    match code {
        KeyCode::Esc => {
            state.editing_path = false;
            state.path_input.clear();
        }
        KeyCode::Enter => {
            let path = PathBuf::from(state.path_input.trim());
            state.editing_path = false;
            state.path_input.clear();
            if path.as_os_str().is_empty() {
                return;
            }
            let _ = cmd_tx.send(UiCommand::Import { path });
        }
        KeyCode::Backspace => {
            state.path_input.pop();
        }
        KeyCode::Char(c) => state.path_input.push(c),
        _ => {}
    }
}

fn apply_event(state: &mut UiState, ev: AppEvent) {
    match ev {
        AppEvent::Progress { pct } => state.progress = pct,
        AppEvent::Log { line } => state.push_log(line),
        AppEvent::State {
            state: lifecycle,
            actions,
        } => {
            state.state = lifecycle;
            state.actions = actions;
        }
        AppEvent::Source { path, kind } => {
            state.source = Some(path);
            state.kind = Some(kind);
            state.progress = 0;
            state.item_count = None;
            state.last_export = None;
        }
        AppEvent::TrainCompleted { outcome } => {
            state.item_count = Some(outcome.item_count);
        }
        AppEvent::ConvertCompleted { .. } => {}
        AppEvent::Exported { dest } => {
            state.last_export = Some(dest);
        }
    }
}

fn state_color(state: LifecycleState) -> Color {
    match state {
        LifecycleState::Training | LifecycleState::Converting | LifecycleState::Exporting => {
            Color::Yellow
        }
        LifecycleState::Trained | LifecycleState::Converted | LifecycleState::Exported => {
            Color::Green
        }
        LifecycleState::Error => Color::Red,
        LifecycleState::Idle => Color::Gray,
    }
}

fn action_line(key: &str, label: &str, enabled: bool) -> Line<'static> {
    let style = if enabled {
        Style::default().fg(Color::White)
    } else {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM)
    };
    Line::from(vec![
        Span::styled(format!(" {key} "), style.add_modifier(Modifier::BOLD)),
        Span::styled(label.to_string(), style),
    ])
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let source_text = match (&state.source, state.kind) {
        (Some(path), Some(kind)) => format!("{} ({kind})", path.display()),
        (Some(path), None) => path.display().to_string(),
        _ => "no document imported".to_string(),
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled("Source: ", Style::default().fg(Color::Gray)),
        Span::raw(source_text),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("text-classifier-cli"),
    );
    f.render_widget(header, chunks[0]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)].as_ref())
        .split(chunks[1]);

    draw_log(main[0], f, state);
    draw_side(main[1], f, state);
    draw_footer(chunks[2], f, state);
}

fn draw_log(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let height = area.height.saturating_sub(2) as usize;
    let offset = state.log_offset(height);
    let lines: Vec<Line> = state
        .log
        .iter()
        .skip(offset)
        .take(height)
        .map(|l| Line::from(l.as_str()))
        .collect();

    let title = if state.follow_log {
        "Log".to_string()
    } else {
        format!("Log ({}/{})", offset + height.min(state.log.len()), state.log.len())
    };
    let log = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(log, area);
}

fn draw_side(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    let status = Paragraph::new(Line::from(Span::styled(
        state.state.status_text(),
        Style::default().fg(state_color(state.state)),
    )))
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, side[0]);

    let items_text = match state.item_count {
        Some(n) => format!("items serialized: {n}"),
        None => "items serialized: -".to_string(),
    };
    let items =
        Paragraph::new(items_text).block(Block::default().borders(Borders::ALL).title("Training"));
    f.render_widget(items, side[1]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(state_color(state.state)))
        .percent(u16::from(state.progress.min(100)));
    f.render_widget(gauge, side[2]);

    let mut lines = vec![
        action_line("i", "import document", state.actions.import),
        action_line("t", "train model", state.actions.train),
        action_line("c", "generate deployable", state.actions.convert),
        action_line("e", "export deployable", state.actions.export),
        action_line("x", "clear artifacts", state.kind.is_some()),
        action_line("L", "clear log", true),
        action_line("q", "quit", true),
    ];
    if let Some(dest) = &state.last_export {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("exported: {}", dest.display()),
            Style::default().fg(Color::Green),
        )));
    }
    let actions =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Actions"));
    f.render_widget(actions, side[3]);
}

fn draw_footer(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let line = if state.editing_path {
        Line::from(vec![
            Span::styled("Source path: ", Style::default().fg(Color::Gray)),
            Span::raw(state.path_input.clone()),
            Span::styled("▌", Style::default().fg(Color::Yellow)),
            Span::styled("  (Enter to import, Esc to cancel)", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(Span::styled(
            "i import | t train | c convert | e export | x clear | ↑/↓ scroll | End follow | q quit",
            Style::default().fg(Color::DarkGray),
        ))
    };
    let footer = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}
