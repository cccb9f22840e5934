// News analysis page: query input, item count, and the streamed analysis.
// Auto-scrolls to the bottom while streaming.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use homeroom_core::protocol::LlmStatus;

use super::with_cursor;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(area);

    let query = Paragraph::new(with_cursor(&state.news_query)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Query or URL (Enter to analyse) "),
    );
    frame.render_widget(query, rows[0]);

    let count = Line::from(vec![
        Span::raw(" Items: "),
        Span::styled(
            state.news_top_n.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled("  (Up/Down 1-5)", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(count), rows[1]);

    let content = match &state.news_error {
        Some(error) if state.news_status == LlmStatus::Error => error.clone(),
        _ if state.news_text.is_empty() => placeholder_text(state.news_status).to_string(),
        _ => state.news_text.clone(),
    };

    let inner_height = rows[2].height.saturating_sub(2) as usize;
    let line_count = content.lines().count();
    let scroll = if state.news_status == LlmStatus::Streaming && line_count > inner_height {
        (line_count - inner_height) as u16
    } else {
        state.scroll_offset
    };

    let (status_text, status_color) = status_indicator(state.news_status);
    let title = Line::from(vec![
        Span::styled(" Analysis", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(" -- ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{status_text} "), Style::default().fg(status_color)),
    ]);
    let border = match state.news_status {
        LlmStatus::Streaming => Style::default().fg(Color::Yellow),
        LlmStatus::Error => Style::default().fg(Color::Red),
        _ => Style::default(),
    };
    let analysis = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(analysis, rows[2]);
}

/// Status text and color for the analysis stream.
pub fn status_indicator(status: LlmStatus) -> (&'static str, Color) {
    match status {
        LlmStatus::Idle => ("idle", Color::DarkGray),
        LlmStatus::Streaming => ("streaming...", Color::Yellow),
        LlmStatus::Complete => ("complete", Color::Green),
        LlmStatus::Error => ("error", Color::Red),
    }
}

fn placeholder_text(status: LlmStatus) -> &'static str {
    match status {
        LlmStatus::Streaming => "Analysing...",
        _ => "Enter a query and press Enter.",
    }
}
