// Message types passed between the app loop, background tasks and the TUI.

use crate::chat::ChatEntry;
use crate::credentials::SecretsStatus;
use crate::level::Level;

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// A top-level page of the application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Home,
    /// Math practice for one profile. `user` is the profile name.
    Practice { user: String },
    Translate,
    News,
}

impl Page {
    pub fn title(&self) -> String {
        match self {
            Page::Home => "Home".to_string(),
            Page::Practice { user } => format!("{}'s Math Practice", user.to_uppercase()),
            Page::Translate => "Translate Chat".to_string(),
            Page::News => "News Analysis".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// TUI -> app
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    OpenPage(Page),
    SelectLevel { user: String, level: Level },
    NewQuestions { user: String },
    /// Raw text typed for each question, in question order.
    SubmitAnswers { user: String, answers: Vec<String> },
    Translate(String),
    AnalyseNews { query: String, top_n: u8 },
    Quit,
}

// ---------------------------------------------------------------------------
// app -> TUI
// ---------------------------------------------------------------------------

/// One graded question as shown on the results panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub question: String,
    pub given: Option<f64>,
    pub expected: f64,
    pub correct: bool,
}

/// A past session in the practice side panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub timestamp: String,
    pub level: String,
    pub score: u32,
    pub total: u32,
}

/// Everything the practice page needs to draw one user's session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PracticeSnapshot {
    pub user: String,
    pub level: Level,
    pub questions: Vec<String>,
    /// Changes whenever the batch is regenerated, even to identical
    /// questions.
    pub generation: u64,
    pub loading: bool,
    /// Set when the questions came from the built-in bank instead of the LLM.
    pub fallback_reason: Option<String>,
    pub results: Option<Vec<ResultRow>>,
    pub score: u32,
    pub total: u32,
    pub reward_unlocked: bool,
    pub history: Vec<HistoryRow>,
}

/// Remote chat-log storage as shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Saving,
    Failed,
}

/// Messages pushed to the TUI to update its view.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    Practice(Box<PracticeSnapshot>),
    Secrets(SecretsStatus),
    ChatHistory(Vec<ChatEntry>),
    TranslateStarted,
    Translation {
        entry: ChatEntry,
        /// Status and raw body of a failed request, if any.
        debug: Option<String>,
    },
    Storage(StorageStatus),
    NewsStarted,
    NewsToken(String),
    NewsComplete(String),
    NewsError(String),
    /// One-line message for the status bar.
    Notice(String),
}

// ---------------------------------------------------------------------------
// LLM streaming
// ---------------------------------------------------------------------------

/// Events emitted by a streaming LLM request. `generation` identifies the
/// request so late events from a cancelled one can be dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmEvent {
    Token {
        text: String,
        generation: u64,
    },
    Complete {
        full_text: String,
        stop_reason: Option<String>,
        generation: u64,
    },
    Error {
        message: String,
        generation: u64,
    },
}

impl LlmEvent {
    pub fn generation(&self) -> u64 {
        match self {
            LlmEvent::Token { generation, .. }
            | LlmEvent::Complete { generation, .. }
            | LlmEvent::Error { generation, .. } => *generation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmStatus {
    #[default]
    Idle,
    Streaming,
    Complete,
    Error,
}
