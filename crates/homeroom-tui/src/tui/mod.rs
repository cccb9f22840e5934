// Terminal UI: page views, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors what the app orchestrator reports.
// The orchestrator pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them to `ViewState` and re-renders at ~30 fps. Reward games live
// entirely in `ViewState` and are stepped from the render tick.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{info, warn};

use homeroom_core::chat::ChatEntry;
use homeroom_core::config::ProfileConfig;
use homeroom_core::credentials::SecretsStatus;
use homeroom_core::protocol::{
    LlmStatus, Page, PracticeSnapshot, StorageStatus, UiUpdate, UserCommand,
};
use homeroom_llm::news::{DEFAULT_QUERY, DEFAULT_TOP_N};

use crate::games::GameSession;
use layout::build_layout;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
///
/// Updated incrementally via `UiUpdate` messages and local key handling.
/// `render_frame` reads this struct to draw the current page.
pub struct ViewState {
    /// Home page tiles, in config order. The News tile follows them.
    pub profiles: Vec<ProfileConfig>,
    pub page: Page,
    /// Selected home tile; `profiles.len()` is the News tile.
    pub home_selected: usize,

    /// Last snapshot for the user whose practice page is open.
    pub practice: Option<PracticeSnapshot>,
    /// Answer text per question, in question order.
    pub answers: Vec<String>,
    pub answer_focus: usize,

    pub secrets: SecretsStatus,
    pub translate_input: String,
    pub translating: bool,
    pub last_translation: Option<ChatEntry>,
    pub translation_debug: Option<String>,
    /// Oldest first, as stored.
    pub chat_history: Vec<ChatEntry>,
    pub storage: StorageStatus,

    pub news_query: String,
    pub news_top_n: u8,
    pub news_text: String,
    pub news_status: LlmStatus,
    pub news_error: Option<String>,

    /// One-line message shown in the status bar until the page changes.
    pub notice: Option<String>,
    /// Scroll offset for the page's long text panel.
    pub scroll_offset: u16,
    pub confirm_quit: bool,
    /// Full-screen reward game, drawn over the practice page.
    pub game: Option<GameSession>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            profiles: Vec::new(),
            page: Page::Home,
            home_selected: 0,
            practice: None,
            answers: Vec::new(),
            answer_focus: 0,
            secrets: SecretsStatus::default(),
            translate_input: String::new(),
            translating: false,
            last_translation: None,
            translation_debug: None,
            chat_history: Vec::new(),
            storage: StorageStatus::Idle,
            news_query: DEFAULT_QUERY.to_string(),
            news_top_n: DEFAULT_TOP_N,
            news_text: String::new(),
            news_status: LlmStatus::Idle,
            news_error: None,
            notice: None,
            scroll_offset: 0,
            confirm_quit: false,
            game: None,
        }
    }
}

impl ViewState {
    pub fn new(profiles: Vec<ProfileConfig>) -> Self {
        ViewState {
            profiles,
            ..Default::default()
        }
    }

    /// Switch pages locally. Clears per-page transient state.
    pub fn open_page(&mut self, page: Page) {
        if let Page::Practice { user } = &page {
            let same_user = self
                .practice
                .as_ref()
                .is_some_and(|s| s.user.eq_ignore_ascii_case(user));
            if !same_user {
                self.practice = None;
                self.answers.clear();
                self.answer_focus = 0;
            }
        }
        self.page = page;
        self.notice = None;
        self.scroll_offset = 0;
        self.game = None;
    }

    /// The user whose practice page is open, if any.
    pub fn practice_user(&self) -> Option<&str> {
        match &self.page {
            Page::Practice { user } => Some(user),
            _ => None,
        }
    }

    fn apply_practice(&mut self, snapshot: PracticeSnapshot) {
        let for_open_page = self
            .practice_user()
            .is_some_and(|user| user.eq_ignore_ascii_case(&snapshot.user));
        if !for_open_page {
            return;
        }
        // Typed answers belong to one batch. A regenerated batch starts blank
        // even when the bank hands back the same questions.
        let new_batch = self.practice.as_ref().map_or(true, |old| {
            old.generation != snapshot.generation || old.questions != snapshot.questions
        });
        if new_batch {
            self.answers = vec![String::new(); snapshot.questions.len()];
            self.answer_focus = 0;
        }
        self.practice = Some(snapshot);
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Practice(snapshot) => state.apply_practice(*snapshot),
        UiUpdate::Secrets(secrets) => {
            state.secrets = secrets;
        }
        UiUpdate::ChatHistory(log) => {
            state.chat_history = log;
        }
        UiUpdate::TranslateStarted => {
            state.translating = true;
        }
        UiUpdate::Translation { entry, debug } => {
            state.translating = false;
            state.last_translation = Some(entry);
            state.translation_debug = debug;
        }
        UiUpdate::Storage(status) => {
            state.storage = status;
        }
        UiUpdate::NewsStarted => {
            state.news_text.clear();
            state.news_error = None;
            state.news_status = LlmStatus::Streaming;
            state.scroll_offset = 0;
        }
        UiUpdate::NewsToken(token) => {
            state.news_text.push_str(&token);
            state.news_status = LlmStatus::Streaming;
        }
        UiUpdate::NewsComplete(text) => {
            state.news_text = text;
            state.news_status = LlmStatus::Complete;
        }
        UiUpdate::NewsError(message) => {
            state.news_error = Some(message);
            state.news_status = LlmStatus::Error;
        }
        UiUpdate::Notice(notice) => {
            state.notice = Some(notice);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame for the current page.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::help_bar::render(frame, layout.help_bar, state);

    if let Some(session) = &state.game {
        session.game.render(frame, layout.body);
    } else {
        match &state.page {
            Page::Home => widgets::home::render(frame, layout.body, state),
            Page::Practice { .. } => widgets::practice::render(frame, layout.body, state),
            Page::Translate => widgets::translate::render(frame, layout.body, state),
            Page::News => widgets::news::render(frame, layout.body, state),
        }
    }

    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area());
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook that restores the terminal.
/// 3. Selects over UI updates, keyboard input and render ticks. Each render
///    tick also advances a running game by the elapsed wall time.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    profiles: Vec<ProfileConfig>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::new(profiles);
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => {
                        info!("UI channel closed, leaving TUI");
                        break;
                    }
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("terminal input error: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            _ = render_tick.tick() => {
                let now = Instant::now();
                if let Some(session) = view_state.game.as_mut() {
                    session.advance(now - last_tick);
                }
                last_tick = now;
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
