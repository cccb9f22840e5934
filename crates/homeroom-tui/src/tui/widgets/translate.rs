// Translate chat page.
//
// Top to bottom: secrets presence row, input box, the latest result
// (English | Myanmar), failure details when a request went wrong, and the
// shared chat log newest first.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use homeroom_core::chat::ChatEntry;
use homeroom_core::credentials::SecretsStatus;

use super::{focused_border_style, with_cursor};
use crate::tui::ViewState;

/// Chat log entries listed on the page.
pub const HISTORY_LIMIT: usize = 100;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let debug_height = if state.translation_debug.is_some() { 6 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(debug_height),
            Constraint::Min(3),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(secrets_line(&state.secrets)), rows[0]);

    let input_title = if state.translating {
        " Translating... "
    } else {
        " Text to translate (Enter to send) "
    };
    let input = Paragraph::new(with_cursor(&state.translate_input)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(input_title)
            .border_style(focused_border_style(!state.translating)),
    );
    frame.render_widget(input, rows[1]);

    render_result(frame, rows[2], state.last_translation.as_ref());

    if let Some(debug) = &state.translation_debug {
        let block = Paragraph::new(debug.as_str())
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title(" Debug "));
        frame.render_widget(block, rows[3]);
    }

    let items: Vec<ListItem> = history_labels(&state.chat_history)
        .into_iter()
        .skip(state.scroll_offset as usize)
        .map(ListItem::new)
        .collect();
    let title = format!(" Chat history ({}) ", state.chat_history.len());
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, rows[4]);
}

fn render_result(frame: &mut Frame, area: Rect, entry: Option<&ChatEntry>) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let (english, myanmar) = match entry {
        Some(e) => (e.english.as_str(), e.myanmar.as_str()),
        None => ("", ""),
    };
    for (rect, title, text) in [
        (columns[0], " English ", english),
        (columns[1], " Myanmar ", myanmar),
    ] {
        let panel = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(panel, rect);
    }
}

/// One span per secret: green check when configured, red cross when not.
pub fn secrets_line(secrets: &SecretsStatus) -> Line<'static> {
    let mut spans = vec![Span::styled(
        " Secrets: ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (name, present) in &secrets.entries {
        let (mark, color) = if *present {
            ("✓", Color::Green)
        } else {
            ("✗", Color::Red)
        };
        spans.push(Span::styled(
            format!("{mark} {name}  "),
            Style::default().fg(color),
        ));
    }
    Line::from(spans)
}

/// History labels, newest first, capped at [`HISTORY_LIMIT`].
pub fn history_labels(log: &[ChatEntry]) -> Vec<String> {
    log.iter()
        .rev()
        .take(HISTORY_LIMIT)
        .map(ChatEntry::label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> ChatEntry {
        ChatEntry {
            timestamp: format!("2025-01-01 08:{:02}:00", n % 60),
            original: format!("message {n}"),
            english: format!("english {n}"),
            myanmar: format!("myanmar {n}"),
        }
    }

    #[test]
    fn history_is_newest_first_and_capped() {
        let log: Vec<ChatEntry> = (0..120).map(entry).collect();
        let labels = history_labels(&log);
        assert_eq!(labels.len(), 100);
        assert!(labels[0].contains("message 119"));
        assert!(labels[99].contains("message 20"));
    }

    #[test]
    fn secrets_line_marks_missing() {
        let secrets = SecretsStatus {
            entries: vec![
                ("DEEPSEEK_API_KEY".into(), true),
                ("GITHUB_TOKEN".into(), false),
            ],
        };
        let line = secrets_line(&secrets);
        assert_eq!(line.spans[1].content, "✓ DEEPSEEK_API_KEY  ");
        assert_eq!(line.spans[2].style.fg, Some(Color::Red));
    }

    #[test]
    fn render_with_result_and_debug() {
        let mut state = ViewState::default();
        state.last_translation = Some(entry(1));
        state.translation_debug = Some("Status: 401\n{\"error\":\"bad key\"}".into());
        state.chat_history = vec![entry(1)];
        state.translate_input = "hi".into();

        let backend = ratatui::backend::TestBackend::new(100, 30);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("english 1"));
        assert!(text.contains("Status: 401"));
        assert!(text.contains("Chat history (1)"));
    }
}
