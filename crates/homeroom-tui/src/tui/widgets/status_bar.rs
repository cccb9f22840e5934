// Status bar: page title, practice level, chat storage and news stream state,
// then the latest notice.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use homeroom_core::protocol::{Page, StorageStatus};

use super::news::status_indicator;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![Span::styled(
        format!(" {} ", state.page.title()),
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD),
    )];
    let separator = || Span::styled(" | ", Style::default().fg(Color::Gray));

    match &state.page {
        Page::Practice { .. } => {
            if let Some(snapshot) = &state.practice {
                spans.push(separator());
                spans.push(Span::styled(
                    format!("Level {}", snapshot.level),
                    Style::default().fg(Color::Cyan),
                ));
            }
            if let Some(session) = &state.game {
                spans.push(separator());
                spans.push(Span::styled(
                    format!("{} {}", session.game.kind().title(), session.game.score()),
                    Style::default().fg(Color::Magenta),
                ));
            }
        }
        Page::Translate => {
            let (text, color) = storage_indicator(state.storage);
            spans.push(separator());
            spans.push(Span::styled(format!("Gist: {text}"), Style::default().fg(color)));
        }
        Page::News => {
            let (text, color) = status_indicator(state.news_status);
            spans.push(separator());
            spans.push(Span::styled(format!("LLM: {text}"), Style::default().fg(color)));
        }
        Page::Home => {}
    }

    if let Some(notice) = &state.notice {
        spans.push(separator());
        spans.push(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Text and color for the chat-log storage state.
pub fn storage_indicator(status: StorageStatus) -> (&'static str, Color) {
    match status {
        StorageStatus::Idle => ("idle", Color::DarkGray),
        StorageStatus::Loading => ("loading...", Color::Yellow),
        StorageStatus::Ready => ("synced", Color::Green),
        StorageStatus::Saving => ("saving...", Color::Yellow),
        StorageStatus::Failed => ("save failed", Color::Red),
    }
}
