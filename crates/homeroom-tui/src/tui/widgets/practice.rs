// Practice page: level picker, questions with answer inputs, graded results,
// the reward banner, and the user's recent history.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use homeroom_core::protocol::{HistoryRow, PracticeSnapshot, ResultRow};

use super::{focused_border_style, with_cursor};
use crate::games::GameKind;
use crate::tui::layout::practice_columns;
use crate::tui::ViewState;

/// History rows shown in the side panel.
const HISTORY_ROWS: usize = 20;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let (main, side) = practice_columns(area);
    let title = format!(" {} ", state.page.title());

    let Some(snapshot) = &state.practice else {
        let waiting = Paragraph::new("Loading...")
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(waiting, area);
        return;
    };

    let lines = question_lines(snapshot, &state.answers, state.answer_focus);
    let questions = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(focused_border_style(snapshot.results.is_none())),
        );
    frame.render_widget(questions, main);

    let items: Vec<ListItem> = snapshot
        .history
        .iter()
        .take(HISTORY_ROWS)
        .map(|row| ListItem::new(history_text(row)))
        .collect();
    let history = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Recent sessions "),
    );
    frame.render_widget(history, side);
}

fn question_lines<'a>(
    snapshot: &'a PracticeSnapshot,
    answers: &'a [String],
    focus: usize,
) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                snapshot.level.code(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" ▶  ", Style::default().fg(Color::DarkGray)),
            Span::raw(snapshot.level.description()),
        ]),
        Line::default(),
    ];

    if snapshot.loading {
        lines.push(Line::styled(
            "Generating questions...",
            Style::default().fg(Color::Yellow),
        ));
        return lines;
    }
    if let Some(reason) = &snapshot.fallback_reason {
        lines.push(Line::styled(
            format!("Using built-in questions ({reason})"),
            Style::default().fg(Color::Yellow),
        ));
        lines.push(Line::default());
    }

    for (i, question) in snapshot.questions.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("Q{}. ", i + 1),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(question.as_str()),
        ]));

        let answer = answers.get(i).map(String::as_str).unwrap_or_default();
        match snapshot.results.as_ref().and_then(|r| r.get(i)) {
            Some(row) => lines.push(result_line(row)),
            None if i == focus => lines.push(Line::styled(
                format!("   Answer: {}", with_cursor(answer)),
                Style::default().fg(Color::Cyan),
            )),
            None => lines.push(Line::raw(format!("   Answer: {answer}"))),
        }
    }

    if snapshot.results.is_some() {
        lines.push(Line::default());
        lines.push(Line::styled(
            score_text(snapshot.score, snapshot.total),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        if snapshot.reward_unlocked {
            lines.push(reward_banner());
        }
    }
    lines
}

/// `✅` for a correct answer, otherwise `❌` with the expected value.
pub fn result_line(row: &ResultRow) -> Line<'static> {
    let given = row
        .given
        .map(|g| g.to_string())
        .unwrap_or_else(|| "-".to_string());
    if row.correct {
        Line::styled(
            format!("   ✅ {given}"),
            Style::default().fg(Color::Green),
        )
    } else {
        Line::styled(
            format!("   ❌ {given} (correct answer: {})", row.expected),
            Style::default().fg(Color::Red),
        )
    }
}

pub fn score_text(score: u32, total: u32) -> String {
    format!("Score: {score}/{total}")
}

fn reward_banner() -> Line<'static> {
    let games = GameKind::ALL
        .iter()
        .enumerate()
        .map(|(i, kind)| format!("{}: {}", i + 1, kind.title()))
        .collect::<Vec<_>>()
        .join("  ");
    Line::styled(
        format!("🎉 Perfect score! Play a game: {games}"),
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    )
}

fn history_text(row: &HistoryRow) -> String {
    format!("{}  {:<4} {}/{}", row.timestamp, row.level, row.score, row.total)
}
