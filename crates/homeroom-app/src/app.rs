// Application state and orchestration logic.
//
// The central event loop that coordinates user commands from the TUI,
// results from spawned background tasks (question generation, translation,
// Gist reads and writes) and streamed LLM tokens for the news page. Holds
// per-user practice sessions and the shared chat log, and pushes UI updates
// to the TUI render loop.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use homeroom_core::chat::{keep_recent, ChatEntry};
use homeroom_core::config::Config;
use homeroom_core::history::{HistoryStore, TIMESTAMP_FORMAT};
use homeroom_core::protocol::{
    HistoryRow, LlmEvent, LlmStatus, Page, PracticeSnapshot, ResultRow, StorageStatus, UiUpdate,
    UserCommand,
};
use homeroom_core::Level;
use homeroom_llm::client::LlmClient;
use homeroom_llm::news::{build_news_prompt, news_request_options};
use homeroom_llm::translate::Translator;
use homeroom_practice::grading::{grade, GradedSession};
use homeroom_practice::{generate_questions, QuestionBatch};

use crate::gist::GistStore;
use crate::store::ChatLogStore;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// One user's practice page.
#[derive(Debug, Default)]
pub struct PracticeSession {
    pub level: Level,
    pub batch: Option<QuestionBatch>,
    /// Set once the current batch has been submitted.
    pub graded: Option<GradedSession>,
    pub reward_unlocked: bool,
    pub loading: bool,
    /// Bumped on every regeneration. Batches tagged with an older value are
    /// dropped.
    pub generation: u64,
    task: Option<JoinHandle<()>>,
}

impl PracticeSession {
    fn new(level: Level) -> Self {
        PracticeSession {
            level,
            ..Default::default()
        }
    }
}

/// Results reported back to the loop by spawned background tasks.
#[derive(Debug)]
pub enum TaskEvent {
    QuestionsGenerated {
        user: String,
        generation: u64,
        batch: QuestionBatch,
    },
    ChatLoaded(Vec<ChatEntry>),
    Translated {
        entry: ChatEntry,
        debug: Option<String>,
    },
    ChatSaved(bool),
}

/// Appended to a news analysis cut short by the token limit.
const TRUNCATED_NOTE: &str = "\n\n[Response truncated due to token limit]";

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub history: HistoryStore,
    /// Practice sessions keyed by lower-cased user name.
    pub sessions: HashMap<String, PracticeSession>,
    /// Client for question generation and news analysis.
    pub question_client: Arc<LlmClient>,
    pub translator: Arc<Translator>,
    /// `None` when the Gist credentials are not configured.
    pub chat_store: Option<Arc<dyn ChatLogStore>>,
    pub chat_log: Vec<ChatEntry>,
    /// Whether the chat log load has been started.
    pub chat_loaded: bool,
    /// Whether the stored log has arrived. Saves wait for it, since every
    /// save replaces the whole stored log.
    pub chat_ready: bool,
    /// A translation finished before the load did.
    pub save_pending: bool,
    pub translating: bool,
    pub news_task: Option<JoinHandle<()>>,
    /// Identifies the current news stream. Events from stale generations are
    /// discarded in `handle_llm_event`.
    pub llm_generation: u64,
    pub news_text: String,
    pub news_status: LlmStatus,
    pub llm_tx: mpsc::Sender<LlmEvent>,
    pub task_tx: mpsc::Sender<TaskEvent>,
}

impl AppState {
    pub fn new(
        config: Config,
        history: HistoryStore,
        question_client: LlmClient,
        translator: Translator,
        chat_store: Option<Arc<dyn ChatLogStore>>,
        llm_tx: mpsc::Sender<LlmEvent>,
        task_tx: mpsc::Sender<TaskEvent>,
    ) -> Self {
        AppState {
            config,
            history,
            sessions: HashMap::new(),
            question_client: Arc::new(question_client),
            translator: Arc::new(translator),
            chat_store,
            chat_log: Vec::new(),
            chat_loaded: false,
            chat_ready: false,
            save_pending: false,
            translating: false,
            news_task: None,
            llm_generation: 0,
            news_text: String::new(),
            news_status: LlmStatus::Idle,
            llm_tx,
            task_tx,
        }
    }

    /// Wire up the real clients and stores described by `config`.
    pub fn from_config(
        config: Config,
        llm_tx: mpsc::Sender<LlmEvent>,
        task_tx: mpsc::Sender<TaskEvent>,
    ) -> Self {
        let history = HistoryStore::open(&config.storage.history_path);
        let question_client = LlmClient::for_questions(&config);
        let translator = Translator::from_config(&config);
        let chat_store = GistStore::from_config(&config)
            .map(|store| Arc::new(store) as Arc<dyn ChatLogStore>);
        if !question_client.is_active() {
            warn!("no question LLM key configured; practice will use the built-in questions");
        }
        if chat_store.is_none() {
            warn!("Gist credentials not configured; chat history will not be stored");
        }
        AppState::new(
            config,
            history,
            question_client,
            translator,
            chat_store,
            llm_tx,
            task_tx,
        )
    }

    fn session_mut(&mut self, user: &str) -> &mut PracticeSession {
        let level = self.config.practice.level();
        self.sessions
            .entry(session_key(user))
            .or_insert_with(|| PracticeSession::new(level))
    }

    /// Discard the user's current batch and spawn a generation task for a
    /// fresh one at the session's level.
    pub fn start_generation(&mut self, user: &str) {
        let count = self.config.practice.question_count;
        let style = self.config.practice.style;
        let fast = self.config.practice.fast;
        let client = Arc::clone(&self.question_client);
        let tx = self.task_tx.clone();

        let session = self.session_mut(user);
        if let Some(task) = session.task.take() {
            task.abort();
        }
        session.generation += 1;
        session.batch = None;
        session.graded = None;
        session.reward_unlocked = false;
        session.loading = true;

        let generation = session.generation;
        let level = session.level;
        let user = user.to_string();
        info!(%user, %level, generation, "generating questions");

        session.task = Some(tokio::spawn(async move {
            let batch = generate_questions(&client, level, count, style, fast).await;
            let _ = tx
                .send(TaskEvent::QuestionsGenerated {
                    user,
                    generation,
                    batch,
                })
                .await;
        }));
    }

    /// Everything the practice page needs for `user`.
    pub fn practice_snapshot(&self, user: &str) -> PracticeSnapshot {
        let history = self.history_rows(user);
        let Some(session) = self.sessions.get(&session_key(user)) else {
            return PracticeSnapshot {
                user: user.to_string(),
                level: self.config.practice.level(),
                history,
                ..Default::default()
            };
        };

        let (questions, fallback_reason) = match &session.batch {
            Some(batch) => (
                batch.questions.iter().map(|q| q.text.clone()).collect(),
                batch.fallback_reason().map(str::to_string),
            ),
            None => (Vec::new(), None),
        };
        let (results, score, total) = match &session.graded {
            Some(graded) => (
                Some(
                    graded
                        .results
                        .iter()
                        .map(|r| ResultRow {
                            question: r.question.clone(),
                            given: r.given,
                            expected: r.expected,
                            correct: r.correct,
                        })
                        .collect(),
                ),
                graded.score,
                graded.total,
            ),
            None => (None, 0, 0),
        };

        PracticeSnapshot {
            user: user.to_string(),
            level: session.level,
            questions,
            generation: session.generation,
            loading: session.loading,
            fallback_reason,
            results,
            score,
            total,
            reward_unlocked: session.reward_unlocked,
            history,
        }
    }

    /// Past sessions for `user`, newest first.
    pub fn history_rows(&self, user: &str) -> Vec<HistoryRow> {
        self.history
            .sessions_for(user)
            .into_iter()
            .map(|(key, record)| HistoryRow {
                timestamp: record.timestamp,
                level: level_from_key(&key).to_string(),
                score: record.score,
                total: record.total,
            })
            .collect()
    }

    /// Grade the user's current batch, record it and unlock the reward on a
    /// perfect score. Returns a notice for the user when something went
    /// wrong.
    pub fn submit_answers(&mut self, user: &str, answers: &[String]) -> Option<String> {
        let session = self.session_mut(user);
        if session.loading {
            return Some("Questions are still loading".to_string());
        }
        let Some(batch) = &session.batch else {
            return Some("No questions to grade yet".to_string());
        };
        if session.graded.is_some() {
            return Some("These answers were already graded; press F5 for new questions".to_string());
        }

        let graded = grade(&batch.questions, answers);
        let level = session.level;
        session.reward_unlocked = graded.is_perfect();
        let record = graded.to_record(Local::now().format(TIMESTAMP_FORMAT).to_string());
        info!(user, %level, score = graded.score, total = graded.total, "graded session");
        session.graded = Some(graded);

        match self
            .history
            .record(user, level, Local::now().date_naive(), record)
        {
            Ok(key) => {
                debug!("recorded history entry {key}");
                None
            }
            Err(e) => {
                warn!("failed to record history: {e:#}");
                Some(format!("Could not save history: {e}"))
            }
        }
    }

    /// Spawn the one-time chat log load, if a store is configured.
    fn load_chat_log(&mut self) -> bool {
        if self.chat_loaded {
            return false;
        }
        let Some(store) = self.chat_store.clone() else {
            return false;
        };
        self.chat_loaded = true;
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let entries = store.load().await;
            let _ = tx.send(TaskEvent::ChatLoaded(entries)).await;
        });
        info!("loading chat log");
        true
    }

    /// Spawn both translations of `text`.
    fn start_translation(&mut self, text: String) {
        self.translating = true;
        let translator = Arc::clone(&self.translator);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let (english, myanmar) = translator.translate_both(&text).await;
            let debug = english
                .debug
                .as_ref()
                .or(myanmar.debug.as_ref())
                .map(|d| d.render());
            let entry = ChatEntry::new(
                Local::now().naive_local(),
                &text,
                english.text,
                myanmar.text,
            );
            let _ = tx.send(TaskEvent::Translated { entry, debug }).await;
        });
    }

    /// Spawn a save of the whole chat log. Returns false when no store is
    /// configured.
    fn save_chat_log(&self) -> bool {
        let Some(store) = self.chat_store.clone() else {
            return false;
        };
        let snapshot = self.chat_log.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let saved = store.save(&snapshot).await;
            let _ = tx.send(TaskEvent::ChatSaved(saved)).await;
        });
        true
    }

    /// Start streaming a news analysis, cancelling any analysis in flight.
    pub fn trigger_news_analysis(&mut self, query: &str, top_n: u8) {
        self.cancel_news_task();

        self.news_text.clear();
        self.news_status = LlmStatus::Streaming;

        let prompt = build_news_prompt(query, top_n);
        let opts = news_request_options(self.config.llm.news_max_tokens);
        let client = Arc::clone(&self.question_client);
        let tx = self.llm_tx.clone();

        self.llm_generation += 1;
        let generation = self.llm_generation;

        let handle = tokio::spawn(async move {
            if let Err(e) = client.stream_message(&opts, &prompt, tx, generation).await {
                warn!("news analysis task failed: {}", e);
            }
        });

        self.news_task = Some(handle);
        info!("Triggered news analysis (gen: {})", generation);
    }

    pub fn cancel_news_task(&mut self) {
        if let Some(handle) = self.news_task.take() {
            handle.abort();
            info!("Cancelled previous news analysis");
        }
    }

    fn abort_all(&mut self) {
        self.cancel_news_task();
        for session in self.sessions.values_mut() {
            if let Some(task) = session.task.take() {
                task.abort();
            }
        }
    }
}

fn session_key(user: &str) -> String {
    user.trim().to_lowercase()
}

/// The level segment of a `user_LEVEL_date` history key.
fn level_from_key(key: &str) -> &str {
    key.rsplitn(3, '_').nth(1).unwrap_or("")
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens on three channels using `tokio::select!`:
/// 1. Streamed LLM events for the news page
/// 2. Results from spawned background tasks
/// 3. User commands from the TUI
///
/// Pushes UI updates through `ui_tx` for the TUI render loop.
pub async fn run(
    mut llm_rx: mpsc::Receiver<LlmEvent>,
    mut task_rx: mpsc::Receiver<TaskEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    // The state holds senders for both task channels, so they only close if
    // the caller dropped the receivers' peers some other way. Stop polling a
    // closed one so select! never spins on it.
    let mut llm_open = true;
    let mut task_open = true;

    loop {
        tokio::select! {
            // --- LLM events ---
            llm_event = llm_rx.recv(), if llm_open => {
                match llm_event {
                    Some(event) => handle_llm_event(&mut state, event, &ui_tx).await,
                    None => {
                        info!("LLM channel closed");
                        llm_open = false;
                    }
                }
            }

            // --- Background task results ---
            task_event = task_rx.recv(), if task_open => {
                match task_event {
                    Some(event) => handle_task_event(&mut state, event, &ui_tx).await,
                    None => {
                        info!("Task channel closed");
                        task_open = false;
                    }
                }
            }

            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => handle_user_command(&mut state, cmd, &ui_tx).await,
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    // Cleanup
    state.abort_all();
    info!("Application event loop exiting");
    Ok(())
}

async fn handle_llm_event(state: &mut AppState, event: LlmEvent, ui_tx: &mpsc::Sender<UiUpdate>) {
    // Discard events from stale (cancelled) tasks.
    if event.generation() != state.llm_generation {
        debug!(
            "Discarding stale LLM event (event gen: {}, current gen: {})",
            event.generation(),
            state.llm_generation
        );
        return;
    }
    if state.news_status != LlmStatus::Streaming {
        debug!("Received LLM event with no active analysis, discarding");
        return;
    }

    match event {
        LlmEvent::Token { text, .. } => {
            state.news_text.push_str(&text);
            let _ = ui_tx.send(UiUpdate::NewsToken(text)).await;
        }
        LlmEvent::Complete {
            full_text,
            stop_reason,
            ..
        } => {
            let text = if stop_reason.as_deref() == Some("length") {
                format!("{full_text}{TRUNCATED_NOTE}")
            } else {
                full_text
            };
            state.news_text = text.clone();
            state.news_status = LlmStatus::Complete;
            state.news_task = None;
            let _ = ui_tx.send(UiUpdate::NewsComplete(text)).await;
        }
        LlmEvent::Error { message, .. } => {
            warn!("news analysis error: {}", message);
            state.news_status = LlmStatus::Error;
            state.news_task = None;
            let _ = ui_tx
                .send(UiUpdate::NewsError(format!("分析失敗：{message}")))
                .await;
        }
    }
}

async fn handle_task_event(
    state: &mut AppState,
    event: TaskEvent,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match event {
        TaskEvent::QuestionsGenerated {
            user,
            generation,
            batch,
        } => {
            let session = state.session_mut(&user);
            if session.generation != generation {
                debug!(
                    "Discarding stale question batch for {} (gen {}, current {})",
                    user, generation, session.generation
                );
                return;
            }
            session.batch = Some(batch);
            session.loading = false;
            session.task = None;
            let snapshot = state.practice_snapshot(&user);
            let _ = ui_tx.send(UiUpdate::Practice(Box::new(snapshot))).await;
        }
        TaskEvent::ChatLoaded(entries) => {
            // Anything translated while the load was in flight goes after
            // the stored entries.
            let mut log = entries;
            log.append(&mut state.chat_log);
            keep_recent(&mut log, state.config.storage.max_chat_history);
            info!(n = log.len(), "chat log ready");
            state.chat_log = log;
            state.chat_ready = true;
            let _ = ui_tx
                .send(UiUpdate::ChatHistory(state.chat_log.clone()))
                .await;
            let status = if std::mem::take(&mut state.save_pending) && state.save_chat_log() {
                StorageStatus::Saving
            } else {
                StorageStatus::Ready
            };
            let _ = ui_tx.send(UiUpdate::Storage(status)).await;
        }
        TaskEvent::Translated { entry, debug } => {
            state.translating = false;
            state.chat_log.push(entry.clone());
            keep_recent(&mut state.chat_log, state.config.storage.max_chat_history);
            let _ = ui_tx
                .send(UiUpdate::ChatHistory(state.chat_log.clone()))
                .await;
            let _ = ui_tx.send(UiUpdate::Translation { entry, debug }).await;
            if state.chat_store.is_some() && !state.chat_ready {
                debug!("chat log still loading; save deferred");
                state.save_pending = true;
            } else if state.save_chat_log() {
                let _ = ui_tx.send(UiUpdate::Storage(StorageStatus::Saving)).await;
            }
        }
        TaskEvent::ChatSaved(saved) => {
            if saved {
                debug!("chat log saved");
                let _ = ui_tx.send(UiUpdate::Storage(StorageStatus::Ready)).await;
            } else {
                warn!("chat log save failed");
                let _ = ui_tx.send(UiUpdate::Storage(StorageStatus::Failed)).await;
                let _ = ui_tx
                    .send(UiUpdate::Notice("Failed to save chat history".to_string()))
                    .await;
            }
        }
    }
}

/// Handle a user command from the TUI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::OpenPage(page) => {
            info!("Opened page: {}", page.title());
            match page {
                Page::Practice { user } => {
                    let session = state.session_mut(&user);
                    if session.batch.is_none() && !session.loading {
                        state.start_generation(&user);
                    }
                    let snapshot = state.practice_snapshot(&user);
                    let _ = ui_tx.send(UiUpdate::Practice(Box::new(snapshot))).await;
                }
                Page::Translate => {
                    let secrets = state.config.credentials.secrets_status();
                    let ready = secrets.all_present();
                    let _ = ui_tx.send(UiUpdate::Secrets(secrets)).await;
                    if ready && state.load_chat_log() {
                        let _ = ui_tx.send(UiUpdate::Storage(StorageStatus::Loading)).await;
                    } else if state.chat_loaded {
                        let _ = ui_tx
                            .send(UiUpdate::ChatHistory(state.chat_log.clone()))
                            .await;
                    }
                }
                Page::Home | Page::News => {}
            }
        }
        UserCommand::SelectLevel { user, level } => {
            state.session_mut(&user).level = level;
            state.start_generation(&user);
            let snapshot = state.practice_snapshot(&user);
            let _ = ui_tx.send(UiUpdate::Practice(Box::new(snapshot))).await;
        }
        UserCommand::NewQuestions { user } => {
            state.start_generation(&user);
            let snapshot = state.practice_snapshot(&user);
            let _ = ui_tx.send(UiUpdate::Practice(Box::new(snapshot))).await;
        }
        UserCommand::SubmitAnswers { user, answers } => {
            if let Some(notice) = state.submit_answers(&user, &answers) {
                let _ = ui_tx.send(UiUpdate::Notice(notice)).await;
            }
            let snapshot = state.practice_snapshot(&user);
            let _ = ui_tx.send(UiUpdate::Practice(Box::new(snapshot))).await;
        }
        UserCommand::Translate(text) => {
            let text = text.trim();
            let secrets = state.config.credentials.secrets_status();
            let notice = if text.is_empty() {
                Some("Enter some text first".to_string())
            } else if !secrets.all_present() {
                Some(format!(
                    "Missing secrets: {}. Configure them in config/credentials.toml or the environment.",
                    secrets.missing().join(", ")
                ))
            } else if state.translating {
                Some("A translation is already in progress".to_string())
            } else {
                None
            };
            match notice {
                Some(notice) => {
                    let _ = ui_tx.send(UiUpdate::Notice(notice)).await;
                }
                None => {
                    if state.load_chat_log() {
                        let _ = ui_tx.send(UiUpdate::Storage(StorageStatus::Loading)).await;
                    }
                    state.start_translation(text.to_string());
                    let _ = ui_tx.send(UiUpdate::TranslateStarted).await;
                }
            }
        }
        UserCommand::AnalyseNews { query, top_n } => {
            if query.trim().is_empty() {
                let _ = ui_tx
                    .send(UiUpdate::NewsError("Please enter a query or URL".to_string()))
                    .await;
                return;
            }
            state.trigger_news_analysis(&query, top_n);
            let _ = ui_tx.send(UiUpdate::NewsStarted).await;
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use homeroom_core::config::*;
    use homeroom_core::credentials::CredentialsConfig;
    use homeroom_practice::fallback::fallback_questions;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    // -----------------------------------------------------------------------
    // Test helpers
    // -----------------------------------------------------------------------

    /// In-memory chat store that records every save. With `gate` set, loads
    /// wait until the gate is opened.
    #[derive(Default)]
    struct MemoryStore {
        stored: Mutex<Vec<ChatEntry>>,
        saves: Mutex<Vec<Vec<ChatEntry>>>,
        reject_saves: bool,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl ChatLogStore for MemoryStore {
        async fn load(&self) -> Vec<ChatEntry> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.stored.lock().unwrap().clone()
        }

        async fn save(&self, history: &[ChatEntry]) -> bool {
            self.saves.lock().unwrap().push(history.to_vec());
            !self.reject_saves
        }
    }

    fn full_credentials() -> CredentialsConfig {
        CredentialsConfig {
            openrouter_api_key: Some("sk-or".into()),
            deepseek_api_key: Some("sk-ds".into()),
            github_token: Some("ghp".into()),
            github_gist_id: Some("gist".into()),
        }
    }

    fn test_config(tmp: &TempDir, credentials: CredentialsConfig) -> Config {
        Config {
            practice: PracticeConfig {
                question_count: 3,
                ..Default::default()
            },
            llm: LlmConfig::default(),
            translate: TranslateConfig::default(),
            storage: StorageConfig {
                history_path: tmp.path().join("history.json").display().to_string(),
                max_chat_history: 3,
                ..Default::default()
            },
            profiles: vec![ProfileConfig {
                name: "Ella".into(),
                icon: String::new(),
                page: ProfilePage::Practice,
            }],
            credentials,
        }
    }

    struct Harness {
        state: AppState,
        task_rx: mpsc::Receiver<TaskEvent>,
        _llm_rx: mpsc::Receiver<LlmEvent>,
        ui_tx: mpsc::Sender<UiUpdate>,
        ui_rx: mpsc::Receiver<UiUpdate>,
        store: Arc<MemoryStore>,
        _tmp: TempDir,
    }

    fn harness_with(credentials: CredentialsConfig, store: MemoryStore) -> Harness {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp, credentials);
        let (llm_tx, llm_rx) = mpsc::channel(16);
        let (task_tx, task_rx) = mpsc::channel(16);
        let (ui_tx, ui_rx) = mpsc::channel(64);
        let store = Arc::new(store);
        let state = AppState::new(
            config.clone(),
            HistoryStore::open(&config.storage.history_path),
            LlmClient::Disabled,
            Translator::new(LlmClient::Disabled, 100, 0.3),
            Some(store.clone() as Arc<dyn ChatLogStore>),
            llm_tx,
            task_tx,
        );
        Harness {
            state,
            task_rx,
            _llm_rx: llm_rx,
            ui_tx,
            ui_rx,
            store,
            _tmp: tmp,
        }
    }

    fn harness() -> Harness {
        harness_with(full_credentials(), MemoryStore::default())
    }

    impl Harness {
        async fn command(&mut self, cmd: UserCommand) {
            handle_user_command(&mut self.state, cmd, &self.ui_tx).await;
        }

        /// Wait for the next background task result and feed it back in.
        async fn pump_task(&mut self) {
            let event = self.task_rx.recv().await.unwrap();
            handle_task_event(&mut self.state, event, &self.ui_tx).await;
        }

        /// Open the translate page and wait for the stored log to arrive.
        async fn open_translate(&mut self) {
            self.command(UserCommand::OpenPage(Page::Translate)).await;
            self.pump_task().await;
            self.drain_ui();
        }

        fn drain_ui(&mut self) -> Vec<UiUpdate> {
            let mut updates = Vec::new();
            while let Ok(update) = self.ui_rx.try_recv() {
                updates.push(update);
            }
            updates
        }

        fn last_practice(&mut self) -> PracticeSnapshot {
            self.drain_ui()
                .into_iter()
                .filter_map(|u| match u {
                    UiUpdate::Practice(s) => Some(*s),
                    _ => None,
                })
                .last()
                .expect("no practice snapshot sent")
        }
    }

    fn notices(updates: &[UiUpdate]) -> Vec<String> {
        updates
            .iter()
            .filter_map(|u| match u {
                UiUpdate::Notice(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    fn entry(original: &str) -> ChatEntry {
        ChatEntry {
            timestamp: "2025-01-01 00:00:00".into(),
            original: original.into(),
            english: original.into(),
            myanmar: original.into(),
        }
    }

    fn perfect_answers(level: Level, count: usize) -> Vec<String> {
        fallback_questions(level, count)
            .iter()
            .map(|q| q.answer.to_string())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Tests: practice
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn opening_practice_generates_questions() {
        let mut h = harness();
        h.command(UserCommand::OpenPage(Page::Practice { user: "Ella".into() }))
            .await;

        let loading = h.last_practice();
        assert!(loading.loading);
        assert_eq!(loading.level, Level::P2);
        assert!(loading.questions.is_empty());

        h.pump_task().await;
        let ready = h.last_practice();
        assert!(!ready.loading);
        assert_eq!(ready.questions.len(), 3);
        assert_eq!(ready.fallback_reason.as_deref(), Some("API key not configured"));
    }

    #[tokio::test]
    async fn reopening_practice_keeps_existing_questions() {
        let mut h = harness();
        h.command(UserCommand::OpenPage(Page::Practice { user: "Ella".into() }))
            .await;
        h.pump_task().await;
        let generation = h.state.sessions["ella"].generation;

        h.command(UserCommand::OpenPage(Page::Practice { user: "ELLA".into() }))
            .await;
        assert_eq!(h.state.sessions["ella"].generation, generation);
        assert!(h.task_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stale_batches_are_dropped() {
        let mut h = harness();
        h.command(UserCommand::OpenPage(Page::Practice { user: "Ella".into() }))
            .await;
        h.command(UserCommand::SelectLevel {
            user: "Ella".into(),
            level: Level::P5,
        })
        .await;
        assert_eq!(h.state.sessions["ella"].generation, 2);
        h.drain_ui();

        // A late result from the first generation.
        let stale = QuestionBatch {
            questions: fallback_questions(Level::P2, 3),
            origin: homeroom_practice::Origin::Llm,
        };
        handle_task_event(
            &mut h.state,
            TaskEvent::QuestionsGenerated {
                user: "Ella".into(),
                generation: 1,
                batch: stale,
            },
            &h.ui_tx,
        )
        .await;
        assert!(h.drain_ui().is_empty());
        assert!(h.state.sessions["ella"].batch.is_none());

        h.pump_task().await;
        let snapshot = h.last_practice();
        assert_eq!(snapshot.level, Level::P5);
        let expected: Vec<String> = fallback_questions(Level::P5, 3)
            .into_iter()
            .map(|q| q.text)
            .collect();
        assert_eq!(snapshot.questions, expected);
    }

    #[tokio::test]
    async fn perfect_score_unlocks_reward_and_records_history() {
        let mut h = harness();
        h.command(UserCommand::OpenPage(Page::Practice { user: "Ella".into() }))
            .await;
        h.pump_task().await;
        h.drain_ui();

        h.command(UserCommand::SubmitAnswers {
            user: "Ella".into(),
            answers: perfect_answers(Level::P2, 3),
        })
        .await;
        let snapshot = h.last_practice();
        assert!(snapshot.reward_unlocked);
        assert_eq!((snapshot.score, snapshot.total), (3, 3));
        assert!(snapshot.results.unwrap().iter().all(|r| r.correct));
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].level, "P2");
        assert_eq!(snapshot.history[0].score, 3);

        let sessions = h.state.history.sessions_for("ella");
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].0.starts_with("ella_P2_"));
    }

    #[tokio::test]
    async fn imperfect_score_does_not_unlock_reward() {
        let mut h = harness();
        h.command(UserCommand::OpenPage(Page::Practice { user: "Ella".into() }))
            .await;
        h.pump_task().await;
        h.drain_ui();

        let mut answers = perfect_answers(Level::P2, 3);
        answers[1] = "nope".into();
        h.command(UserCommand::SubmitAnswers {
            user: "Ella".into(),
            answers,
        })
        .await;
        let snapshot = h.last_practice();
        assert!(!snapshot.reward_unlocked);
        assert_eq!(snapshot.score, 2);
        let results = snapshot.results.unwrap();
        assert_eq!(results[1].given, None);
        assert!(!results[1].correct);
    }

    #[tokio::test]
    async fn answers_are_graded_once_per_batch() {
        let mut h = harness();
        h.command(UserCommand::OpenPage(Page::Practice { user: "Ella".into() }))
            .await;
        h.pump_task().await;
        let submit = UserCommand::SubmitAnswers {
            user: "Ella".into(),
            answers: perfect_answers(Level::P2, 3),
        };
        h.command(submit.clone()).await;
        h.drain_ui();

        h.command(submit).await;
        let updates = h.drain_ui();
        assert_eq!(notices(&updates).len(), 1);
        assert_eq!(h.state.history.sessions_for("ella").len(), 1);
    }

    #[tokio::test]
    async fn submit_while_loading_is_refused() {
        let mut h = harness();
        h.command(UserCommand::OpenPage(Page::Practice { user: "Ella".into() }))
            .await;
        h.drain_ui();
        h.command(UserCommand::SubmitAnswers {
            user: "Ella".into(),
            answers: vec!["1".into()],
        })
        .await;
        assert_eq!(notices(&h.drain_ui()), vec!["Questions are still loading"]);
    }

    #[tokio::test]
    async fn new_questions_clear_results() {
        let mut h = harness();
        h.command(UserCommand::OpenPage(Page::Practice { user: "Ella".into() }))
            .await;
        h.pump_task().await;
        h.command(UserCommand::SubmitAnswers {
            user: "Ella".into(),
            answers: perfect_answers(Level::P2, 3),
        })
        .await;
        h.command(UserCommand::NewQuestions { user: "Ella".into() })
            .await;

        let snapshot = h.last_practice();
        assert!(snapshot.loading);
        assert_eq!(snapshot.generation, 2);
        assert!(snapshot.results.is_none());
        assert!(!snapshot.reward_unlocked);
        assert_eq!(snapshot.history.len(), 1);
    }

    #[test]
    fn level_is_read_from_history_key() {
        assert_eq!(level_from_key("ella_P2_2025-01-31"), "P2");
        assert_eq!(level_from_key("a_b_PLSE_2025-01-31"), "PLSE");
        assert_eq!(level_from_key("garbage"), "");
    }

    // -----------------------------------------------------------------------
    // Tests: translate
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn opening_translate_reports_secrets_and_loads_once() {
        let store = MemoryStore::default();
        store.stored.lock().unwrap().push(ChatEntry {
            timestamp: "2025-01-01 00:00:00".into(),
            original: "hi".into(),
            english: "hi".into(),
            myanmar: "မင်္ဂလာပါ".into(),
        });
        let mut h = harness_with(full_credentials(), store);

        h.command(UserCommand::OpenPage(Page::Translate)).await;
        let updates = h.drain_ui();
        assert!(matches!(&updates[0], UiUpdate::Secrets(s) if s.all_present()));
        assert!(matches!(updates[1], UiUpdate::Storage(StorageStatus::Loading)));

        h.pump_task().await;
        assert_eq!(h.state.chat_log.len(), 1);
        let updates = h.drain_ui();
        assert!(updates
            .iter()
            .any(|u| matches!(u, UiUpdate::ChatHistory(log) if log.len() == 1)));

        // Second visit reuses the loaded log.
        h.command(UserCommand::OpenPage(Page::Translate)).await;
        assert!(h.task_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_secrets_block_translation() {
        let credentials = CredentialsConfig {
            deepseek_api_key: Some("sk".into()),
            ..Default::default()
        };
        let mut h = harness_with(credentials, MemoryStore::default());

        h.command(UserCommand::OpenPage(Page::Translate)).await;
        let updates = h.drain_ui();
        assert_eq!(updates.len(), 1);
        match &updates[0] {
            UiUpdate::Secrets(s) => {
                assert_eq!(s.missing(), vec!["GITHUB_TOKEN", "GITHUB_GIST_ID"]);
            }
            other => panic!("expected Secrets, got {other:?}"),
        }

        h.command(UserCommand::Translate("hello".into())).await;
        let notice = notices(&h.drain_ui()).pop().unwrap();
        assert!(notice.starts_with("Missing secrets: GITHUB_TOKEN, GITHUB_GIST_ID."));
        assert!(!h.state.translating);
    }

    #[tokio::test]
    async fn empty_text_is_refused() {
        let mut h = harness();
        h.command(UserCommand::Translate("   ".into())).await;
        assert_eq!(notices(&h.drain_ui()), vec!["Enter some text first"]);
    }

    #[tokio::test]
    async fn translation_appends_and_saves_log() {
        let mut h = harness();
        h.open_translate().await;
        h.command(UserCommand::Translate("  你好  ".into())).await;
        assert!(h.state.translating);
        assert!(matches!(h.drain_ui()[0], UiUpdate::TranslateStarted));

        h.pump_task().await; // Translated
        assert!(!h.state.translating);
        let updates = h.drain_ui();
        let (entry, debug) = updates
            .iter()
            .find_map(|u| match u {
                UiUpdate::Translation { entry, debug } => Some((entry.clone(), debug.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(entry.original, "你好");
        assert_eq!(entry.english, "Translation error: API key not configured");
        assert!(debug.unwrap().starts_with("HTTP status: none"));
        assert!(updates
            .iter()
            .any(|u| matches!(u, UiUpdate::Storage(StorageStatus::Saving))));

        h.pump_task().await; // ChatSaved
        assert!(matches!(
            h.drain_ui().last(),
            Some(UiUpdate::Storage(StorageStatus::Ready))
        ));
        let saves = h.store.saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0], vec![entry]);
    }

    #[tokio::test]
    async fn translation_during_slow_load_keeps_stored_entries() {
        let gate = Arc::new(Notify::new());
        let store = MemoryStore {
            stored: Mutex::new(vec![entry("old 1"), entry("old 2")]),
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        let mut h = harness_with(full_credentials(), store);

        h.command(UserCommand::OpenPage(Page::Translate)).await;
        h.command(UserCommand::Translate("new".into())).await;
        h.pump_task().await; // Translated, load still blocked
        assert!(h.state.save_pending);
        assert!(h.store.saves.lock().unwrap().is_empty());
        assert!(!h
            .drain_ui()
            .iter()
            .any(|u| matches!(u, UiUpdate::Storage(StorageStatus::Saving))));

        gate.notify_one();
        h.pump_task().await; // ChatLoaded
        assert!(!h.state.save_pending);
        assert!(matches!(
            h.drain_ui().last(),
            Some(UiUpdate::Storage(StorageStatus::Saving))
        ));

        h.pump_task().await; // ChatSaved
        let saves = h.store.saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        let originals: Vec<&str> = saves[0].iter().map(|e| e.original.as_str()).collect();
        assert_eq!(originals, vec!["old 1", "old 2", "new"]);
    }

    #[tokio::test]
    async fn translating_before_opening_page_loads_first() {
        let store = MemoryStore {
            stored: Mutex::new(vec![entry("old")]),
            gate: Some(Arc::new(Notify::new())),
            ..Default::default()
        };
        let mut h = harness_with(full_credentials(), store);

        h.command(UserCommand::Translate("new".into())).await;
        assert!(h.state.chat_loaded);
        let updates = h.drain_ui();
        assert!(matches!(updates[0], UiUpdate::Storage(StorageStatus::Loading)));
        assert!(matches!(updates[1], UiUpdate::TranslateStarted));

        h.pump_task().await; // Translated
        assert!(h.state.save_pending);
        assert!(h.store.saves.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_save_shows_notice() {
        let store = MemoryStore {
            reject_saves: true,
            ..Default::default()
        };
        let mut h = harness_with(full_credentials(), store);
        h.open_translate().await;
        h.command(UserCommand::Translate("hello".into())).await;
        h.pump_task().await;
        h.pump_task().await;
        let updates = h.drain_ui();
        assert!(updates
            .iter()
            .any(|u| matches!(u, UiUpdate::Storage(StorageStatus::Failed))));
        assert_eq!(notices(&updates), vec!["Failed to save chat history"]);
    }

    #[tokio::test]
    async fn chat_log_keeps_most_recent_entries() {
        let mut h = harness();
        h.open_translate().await;
        for i in 0..5 {
            h.command(UserCommand::Translate(format!("msg {i}"))).await;
            h.pump_task().await;
            h.pump_task().await;
        }
        let originals: Vec<&str> = h.state.chat_log.iter().map(|e| e.original.as_str()).collect();
        assert_eq!(originals, vec!["msg 2", "msg 3", "msg 4"]);
    }

    // -----------------------------------------------------------------------
    // Tests: news
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_news_query_is_an_error() {
        let mut h = harness();
        h.command(UserCommand::AnalyseNews {
            query: "  ".into(),
            top_n: 3,
        })
        .await;
        match h.drain_ui().as_slice() {
            [UiUpdate::NewsError(msg)] => assert_eq!(msg, "Please enter a query or URL"),
            other => panic!("unexpected updates: {other:?}"),
        }
        assert_eq!(h.state.llm_generation, 0);
    }

    #[tokio::test]
    async fn news_events_follow_current_generation() {
        let mut h = harness();
        h.state.llm_generation = 4;
        h.state.news_status = LlmStatus::Streaming;

        let stale = LlmEvent::Token {
            text: "old".into(),
            generation: 3,
        };
        handle_llm_event(&mut h.state, stale, &h.ui_tx).await;
        assert!(h.drain_ui().is_empty());

        let token = LlmEvent::Token {
            text: "新".into(),
            generation: 4,
        };
        handle_llm_event(&mut h.state, token, &h.ui_tx).await;
        assert!(matches!(&h.drain_ui()[..], [UiUpdate::NewsToken(t)] if t == "新"));

        let done = LlmEvent::Complete {
            full_text: "新聞".into(),
            stop_reason: Some("length".into()),
            generation: 4,
        };
        handle_llm_event(&mut h.state, done, &h.ui_tx).await;
        assert_eq!(h.state.news_status, LlmStatus::Complete);
        match &h.drain_ui()[..] {
            [UiUpdate::NewsComplete(text)] => {
                assert!(text.starts_with("新聞"));
                assert!(text.ends_with("[Response truncated due to token limit]"));
            }
            other => panic!("unexpected updates: {other:?}"),
        }
    }

    #[tokio::test]
    async fn news_without_key_reports_failure() {
        let tmp = TempDir::new().unwrap();
        let (llm_tx, mut llm_rx) = mpsc::channel(16);
        let (task_tx, _task_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);
        let config = test_config(&tmp, CredentialsConfig::default());
        let mut state = AppState::from_config(config, llm_tx, task_tx);
        assert!(state.chat_store.is_none());

        handle_user_command(
            &mut state,
            UserCommand::AnalyseNews {
                query: "Unitree".into(),
                top_n: 3,
            },
            &ui_tx,
        )
        .await;
        assert!(matches!(ui_rx.recv().await, Some(UiUpdate::NewsStarted)));

        let event = llm_rx.recv().await.unwrap();
        handle_llm_event(&mut state, event, &ui_tx).await;
        match ui_rx.recv().await {
            Some(UiUpdate::NewsError(msg)) => assert_eq!(msg, "分析失敗：LLM not configured"),
            other => panic!("expected NewsError, got {other:?}"),
        }
        assert_eq!(state.news_status, LlmStatus::Error);
    }

    // -----------------------------------------------------------------------
    // Tests: event loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn event_loop_handles_quit_command() {
        let h = harness();
        let (_llm_tx, llm_rx) = mpsc::channel(16);
        let (_task_tx, task_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        let handle = tokio::spawn(run(llm_rx, task_rx, cmd_rx, h.ui_tx.clone(), h.state));
        cmd_tx.send(UserCommand::Quit).await.unwrap();

        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn event_loop_exits_when_commands_close() {
        let h = harness();
        let (_llm_tx, llm_rx) = mpsc::channel(16);
        let (_task_tx, task_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel::<UserCommand>(16);

        let handle = tokio::spawn(run(llm_rx, task_rx, cmd_rx, h.ui_tx.clone(), h.state));
        drop(cmd_tx);
        assert!(handle.await.unwrap().is_ok());
    }
}
