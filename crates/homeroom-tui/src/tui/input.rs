// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages for the app
// orchestrator, or into local ViewState mutations (page switching, text
// entry, focus, scrolling, games).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use homeroom_core::config::ProfilePage;
use homeroom_core::protocol::{Page, UserCommand};
use homeroom_llm::news::MAX_TOP_N;

use super::ViewState;
use crate::games::{GameKind, GameSession};

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Windows reports both Press and Release.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode (escape hatch)
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    if view_state.game.is_some() {
        return handle_game(key_event, view_state);
    }

    match view_state.page.clone() {
        Page::Home => handle_home(key_event, view_state),
        Page::Practice { user } => handle_practice(key_event, view_state, user),
        Page::Translate => handle_translate(key_event, view_state),
        Page::News => handle_news(key_event, view_state),
    }
}

/// Quit confirmation: `y`/`q` confirm, `n`/Esc cancel, everything else is
/// blocked.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

fn go_home(view_state: &mut ViewState) -> Option<UserCommand> {
    view_state.open_page(Page::Home);
    Some(UserCommand::OpenPage(Page::Home))
}

fn handle_home(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Profiles plus the News tile.
    let tiles = view_state.profiles.len() + 1;
    match key_event.code {
        KeyCode::Left | KeyCode::Up | KeyCode::Char('k') => {
            view_state.home_selected = (view_state.home_selected + tiles - 1) % tiles;
            None
        }
        KeyCode::Right | KeyCode::Down | KeyCode::Tab | KeyCode::Char('j') => {
            view_state.home_selected = (view_state.home_selected + 1) % tiles;
            None
        }
        KeyCode::Enter => {
            let page = match view_state.profiles.get(view_state.home_selected) {
                Some(profile) => match profile.page {
                    ProfilePage::Practice => Page::Practice {
                        user: profile.name.clone(),
                    },
                    ProfilePage::Translate => Page::Translate,
                },
                None => Page::News,
            };
            view_state.open_page(page.clone());
            Some(UserCommand::OpenPage(page))
        }
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

fn handle_practice(
    key_event: KeyEvent,
    view_state: &mut ViewState,
    user: String,
) -> Option<UserCommand> {
    let Some(snapshot) = &view_state.practice else {
        return if key_event.code == KeyCode::Esc {
            go_home(view_state)
        } else {
            None
        };
    };
    let level = snapshot.level;
    let loading = snapshot.loading;
    let graded = snapshot.results.is_some();
    let reward = snapshot.reward_unlocked;

    match key_event.code {
        KeyCode::Esc => go_home(view_state),
        KeyCode::Left => Some(UserCommand::SelectLevel {
            user,
            level: level.prev(),
        }),
        KeyCode::Right => Some(UserCommand::SelectLevel {
            user,
            level: level.next(),
        }),
        KeyCode::F(5) => Some(UserCommand::NewQuestions { user }),
        KeyCode::Up | KeyCode::BackTab => {
            let count = view_state.answers.len().max(1);
            view_state.answer_focus = (view_state.answer_focus + count - 1) % count;
            None
        }
        KeyCode::Down | KeyCode::Tab => {
            let count = view_state.answers.len().max(1);
            view_state.answer_focus = (view_state.answer_focus + 1) % count;
            None
        }
        KeyCode::Enter if !loading && !view_state.answers.is_empty() => {
            Some(UserCommand::SubmitAnswers {
                user,
                answers: view_state.answers.clone(),
            })
        }
        KeyCode::Char(c) if graded => {
            if reward {
                if let Some(kind) = GameKind::from_key(c) {
                    view_state.game = Some(GameSession::new(kind, rand::random()));
                    return None;
                }
            }
            if c == 'q' {
                view_state.confirm_quit = true;
            }
            None
        }
        KeyCode::Char(c) if !loading => {
            if let Some(answer) = view_state.answers.get_mut(view_state.answer_focus) {
                answer.push(c);
            }
            None
        }
        KeyCode::Backspace if !graded => {
            if let Some(answer) = view_state.answers.get_mut(view_state.answer_focus) {
                answer.pop();
            }
            None
        }
        _ => None,
    }
}

fn handle_translate(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => go_home(view_state),
        KeyCode::Enter => {
            let text = view_state.translate_input.clone();
            // Keep the text when the app is going to refuse it.
            if !text.trim().is_empty() && view_state.secrets.all_present() && !view_state.translating
            {
                view_state.translate_input.clear();
            }
            Some(UserCommand::Translate(text))
        }
        KeyCode::Backspace => {
            view_state.translate_input.pop();
            None
        }
        KeyCode::Char(c) => {
            view_state.translate_input.push(c);
            None
        }
        KeyCode::Up => {
            view_state.scroll_offset = view_state.scroll_offset.saturating_sub(1);
            None
        }
        KeyCode::Down => {
            view_state.scroll_offset = view_state.scroll_offset.saturating_add(1);
            None
        }
        _ => None,
    }
}

fn handle_news(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => go_home(view_state),
        KeyCode::Enter => Some(UserCommand::AnalyseNews {
            query: view_state.news_query.clone(),
            top_n: view_state.news_top_n,
        }),
        KeyCode::Up => {
            view_state.news_top_n = (view_state.news_top_n + 1).min(MAX_TOP_N);
            None
        }
        KeyCode::Down => {
            view_state.news_top_n = view_state.news_top_n.saturating_sub(1).max(1);
            None
        }
        KeyCode::PageUp => {
            view_state.scroll_offset = view_state.scroll_offset.saturating_sub(5);
            None
        }
        KeyCode::PageDown => {
            view_state.scroll_offset = view_state.scroll_offset.saturating_add(5);
            None
        }
        KeyCode::Backspace => {
            view_state.news_query.pop();
            None
        }
        KeyCode::Char(c) => {
            view_state.news_query.push(c);
            None
        }
        _ => None,
    }
}

/// Esc leaves the game; everything else is the game's.
fn handle_game(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    if key_event.code == KeyCode::Esc {
        view_state.game = None;
    } else if let Some(session) = view_state.game.as_mut() {
        session.handle_key(key_event.code);
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
