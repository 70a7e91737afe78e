//! Terminal UI for the Moneta advisor chat.

mod app;
mod event;
mod ui;

use anyhow::Context;
use app::App;
use clap::Parser;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyEvent,
    KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use event::AppEvent;
use log::{debug, error, info, warn};
use moneta_config::{ChatMode, MonetaConfig};
use moneta_core::{
    ChatEngine, HttpAdvisorBackend, JsonlChatStore, PRODUCT_CHOICES, QuestionKind, RiskCategory,
    SurveyStep, TurnOutcome,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Command-line options for the Moneta TUI.
#[derive(Parser)]
#[command(name = "moneta", version)]
struct Cli {
    /// Optional path to a moneta.json5 config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Advisor backend base URL
    #[arg(long)]
    base_url: Option<String>,
    /// Directory for the local chat history
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Initial chat mode (assistant or plain)
    #[arg(long)]
    mode: Option<String>,
    /// Skip the risk-profile survey on startup
    #[arg(long)]
    no_survey: bool,
}

/// Entry point for the Moneta TUI client.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();
    info!(
        "starting TUI (config_set={}, base_url_set={}, no_survey={})",
        cli.config.is_some(),
        cli.base_url.is_some(),
        cli.no_survey
    );

    let config = if let Some(path) = cli.config.as_ref() {
        MonetaConfig::load_from_path(path).context("failed to load config")?
    } else {
        let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
        let layered =
            MonetaConfig::load_layered(&cwd).context("failed to load layered config")?;
        debug!("layered config loaded (layers={})", layered.layers.len());
        layered.config
    };

    let base_url = cli
        .base_url
        .clone()
        .unwrap_or_else(|| config.backend.base_url.clone());
    let mode = match cli.mode.as_deref() {
        Some("assistant") => ChatMode::Assistant,
        Some("plain") => ChatMode::Plain,
        Some(other) => anyhow::bail!("unknown mode: {other} (expected assistant or plain)"),
        None => config.chat.default_mode,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.storage.path.as_ref().map(PathBuf::from))
        .or_else(default_data_dir)
        .context("failed to resolve a data directory")?;

    let store = Arc::new(JsonlChatStore::new(&data_dir).context("failed to open chat store")?);
    let backend = Arc::new(HttpAdvisorBackend::new(base_url.clone()));
    let engine = Arc::new(ChatEngine::new(store, backend, mode));

    let mut app = App::new(mode, base_url, data_dir.display().to_string());
    match engine.history().await {
        Ok(history) => {
            debug!("loaded history (count={})", history.len());
            app.load_messages(history);
        }
        Err(err) => {
            warn!("failed to load history: {err}");
            app.push_status("failed to load history");
        }
    }
    app.epoch = engine.epoch();
    if config.survey.auto_start && !cli.no_survey {
        app.start_survey();
    }

    let mut terminal = setup_terminal()?;
    let (tx, mut rx) = mpsc::channel(256);
    spawn_input_handler(tx.clone());

    loop {
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        let Some(event) = rx.recv().await else { break };
        if handle_app_event(event, &engine, &mut app, tx.clone()).await? {
            break;
        }
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}

/// Default chat data directory under the user data dir.
fn default_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "moneta").map(|dirs| dirs.data_dir().join("chat"))
}

/// Dispatch a UI event and return true when the app should exit.
async fn handle_app_event(
    event: AppEvent,
    engine: &Arc<ChatEngine>,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> anyhow::Result<bool> {
    match event {
        AppEvent::Input(key) => handle_input(key, engine, app, sender).await,
        AppEvent::TurnSettled { epoch, outcome } => {
            app.busy = false;
            if epoch != app.epoch {
                debug!("ignoring stale turn event (epoch={epoch})");
                return Ok(false);
            }
            match outcome {
                TurnOutcome::Replied(message) | TurnOutcome::Failed(message) => {
                    app.push_assistant_message(message.content);
                }
                TurnOutcome::Rejected | TurnOutcome::Superseded => {}
            }
            app.push_status("idle");
            Ok(false)
        }
        AppEvent::SurveySettled { epoch, report } => {
            if epoch != app.epoch {
                debug!("ignoring stale survey event (epoch={epoch})");
                return Ok(false);
            }
            match report {
                Some(report) => {
                    app.push_status(format!(
                        "risk profile: {}",
                        report.category.display_name()
                    ));
                    app.push_assistant_message(report.reply.content);
                    app.push_assistant_message(report.follow_up.content);
                    app.open_follow_up();
                }
                None => app.push_status("risk profile report failed (see logs)"),
            }
            Ok(false)
        }
        AppEvent::ChoiceRecorded { epoch, ack } => {
            if epoch != app.epoch {
                debug!("ignoring stale choice event (epoch={epoch})");
                return Ok(false);
            }
            if let Some(ack) = ack {
                app.push_assistant_message(ack.content);
                app.push_status("choice saved");
            }
            Ok(false)
        }
        AppEvent::ActionError(message) => {
            app.busy = false;
            app.push_status(message);
            Ok(false)
        }
        AppEvent::Scroll(delta) => {
            if delta < 0 {
                app.scroll_up((-delta) as u16);
            } else if delta > 0 {
                app.scroll_down(delta as u16);
            }
            Ok(false)
        }
    }
}

/// Handle keyboard input and dispatch actions.
async fn handle_input(
    key: KeyEvent,
    engine: &Arc<ChatEngine>,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Ok(true);
    }

    if app.survey.is_some() {
        return handle_survey_input(key, engine, app, sender);
    }
    if app.follow_up.is_some() {
        return handle_follow_up_input(key, engine, app, sender);
    }

    match key.code {
        KeyCode::Esc => return Ok(true),
        KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            match engine.new_chat().await {
                Ok(()) => {
                    app.epoch = engine.epoch();
                    app.entries.clear();
                    app.push_status("new chat");
                }
                Err(err) => {
                    error!("failed to start a new chat: {err}");
                    app.push_status("failed to clear the chat");
                }
            }
        }
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.mode = engine.toggle_mode();
            app.push_status(format!("mode: {}", app.mode));
        }
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.start_survey();
            app.push_status("survey restarted");
        }
        KeyCode::PageUp => app.scroll_up(5),
        KeyCode::PageDown => app.scroll_down(5),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.enable_auto_scroll(),
        KeyCode::Enter => {
            let text = app.input.trim().to_string();
            if text.is_empty() {
                return Ok(false);
            }
            app.input.clear();
            app.push_user_message(text.clone());
            app.enable_auto_scroll();
            app.busy = true;
            app.push_status("waiting for advisor");
            spawn_submit(engine.clone(), text, sender);
        }
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(ch) => {
            if !key.modifiers.contains(KeyModifiers::CONTROL) {
                app.input.push(ch);
            }
        }
        _ => {}
    }

    Ok(false)
}

/// Handle keyboard input while the survey modal is open.
fn handle_survey_input(
    key: KeyEvent,
    engine: &Arc<ChatEngine>,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> anyhow::Result<bool> {
    let Some(mut survey) = app.survey.take() else {
        return Ok(false);
    };
    let mut keep = true;

    match key.code {
        KeyCode::Esc => {
            keep = false;
            info!("survey dismissed (question={})", survey.index() + 1);
            app.push_status("survey dismissed");
        }
        KeyCode::Enter => {
            if let Some(category) = survey.category() {
                keep = false;
                app.push_status("reporting risk profile");
                spawn_survey_report(engine.clone(), category, sender);
            } else if survey.can_commit() {
                if let Err(err) = survey.commit_selection() {
                    debug!("survey input ignored: {err}");
                }
            }
        }
        KeyCode::Char(ch) if ch.is_ascii_digit() => {
            if let Some(option) = (ch as u8).checked_sub(b'1').map(usize::from) {
                let step = match survey.current().kind {
                    QuestionKind::Multi => survey.toggle(option).map(|()| None),
                    QuestionKind::Single => survey.answer(option).map(Some),
                };
                match step {
                    Ok(Some(SurveyStep::Armed)) => app.push_status("press Enter to finish"),
                    Ok(_) => {}
                    Err(err) => debug!("survey input ignored: {err}"),
                }
            }
        }
        _ => {}
    }

    if keep {
        app.survey = Some(survey);
    }
    Ok(false)
}

/// Handle keyboard input while the product follow-up panel is shown.
fn handle_follow_up_input(
    key: KeyEvent,
    engine: &Arc<ChatEngine>,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> anyhow::Result<bool> {
    let Some(mut panel) = app.follow_up.take() else {
        return Ok(false);
    };

    match panel.free_text.as_mut() {
        None => match key.code {
            KeyCode::Esc => {
                app.push_status("follow-up dismissed");
                return Ok(false);
            }
            KeyCode::Char(ch) if ('1'..='5').contains(&ch) => {
                let choice = PRODUCT_CHOICES[(ch as u8 - b'1') as usize].to_string();
                // The panel is one-shot: it stays closed once a choice is made.
                spawn_record_choice(engine.clone(), choice, sender);
                return Ok(false);
            }
            KeyCode::Char('6') => panel.free_text = Some(String::new()),
            _ => {}
        },
        Some(text) => match key.code {
            KeyCode::Esc => panel.free_text = None,
            KeyCode::Enter => {
                let entry = text.trim().to_string();
                if !entry.is_empty() {
                    spawn_record_choice(engine.clone(), entry, sender);
                    return Ok(false);
                }
            }
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Char(ch) => text.push(ch),
            _ => {}
        },
    }

    app.follow_up = Some(panel);
    Ok(false)
}

/// Spawn a task to run a chat turn asynchronously.
fn spawn_submit(engine: Arc<ChatEngine>, text: String, sender: mpsc::Sender<AppEvent>) {
    let epoch = engine.epoch();
    tokio::spawn(async move {
        debug!("dispatching chat turn (content_len={})", text.len());
        let event = match engine.submit(&text).await {
            Ok(outcome) => AppEvent::TurnSettled { epoch, outcome },
            Err(err) => AppEvent::ActionError(format!("chat turn failed: {err}")),
        };
        let _ = sender.send(event).await;
    });
}

/// Spawn a task to report the survey category.
fn spawn_survey_report(
    engine: Arc<ChatEngine>,
    category: RiskCategory,
    sender: mpsc::Sender<AppEvent>,
) {
    let epoch = engine.epoch();
    tokio::spawn(async move {
        debug!("dispatching risk profile report (category={category})");
        let event = match engine.complete_survey(category).await {
            Ok(report) => AppEvent::SurveySettled { epoch, report },
            Err(err) => AppEvent::ActionError(format!("survey report failed: {err}")),
        };
        let _ = sender.send(event).await;
    });
}

/// Spawn a task to record a follow-up product choice.
fn spawn_record_choice(engine: Arc<ChatEngine>, choice: String, sender: mpsc::Sender<AppEvent>) {
    let epoch = engine.epoch();
    tokio::spawn(async move {
        debug!("dispatching product choice (choice={choice})");
        let event = match engine.record_product_choice(&choice).await {
            Ok(ack) => AppEvent::ChoiceRecorded { epoch, ack },
            Err(err) => AppEvent::ActionError(format!("recording choice failed: {err}")),
        };
        let _ = sender.send(event).await;
    });
}

/// Spawn a task to poll for input events.
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        const MOUSE_SCROLL_LINES: i16 = 3;
        loop {
            if let Ok(true) = crossterm::event::poll(Duration::from_millis(30)) {
                while let Ok(true) = crossterm::event::poll(Duration::from_millis(0)) {
                    let event = match crossterm::event::read() {
                        Ok(event) => event,
                        Err(_) => break,
                    };
                    match event {
                        CrosstermEvent::Key(key) => {
                            let _ = sender.send(AppEvent::Input(key)).await;
                        }
                        CrosstermEvent::Mouse(mouse) => match mouse.kind {
                            MouseEventKind::ScrollUp => {
                                let _ = sender.send(AppEvent::Scroll(-MOUSE_SCROLL_LINES)).await;
                            }
                            MouseEventKind::ScrollDown => {
                                let _ = sender.send(AppEvent::Scroll(MOUSE_SCROLL_LINES)).await;
                            }
                            _ => {}
                        },
                        _ => {}
                    }
                }
            }
        }
    });
}

/// Configure terminal in raw mode with alternate screen.
fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
