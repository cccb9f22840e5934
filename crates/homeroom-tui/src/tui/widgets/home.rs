// Home page: one tile per configured profile plus the News tile.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use homeroom_core::config::ProfilePage;

use crate::tui::ViewState;

const TILE_HEIGHT: u16 = 5;

/// Label and subtitle for each tile, in selection order.
pub fn tiles(state: &ViewState) -> Vec<(String, &'static str)> {
    let mut tiles: Vec<(String, &'static str)> = state
        .profiles
        .iter()
        .map(|p| {
            let subtitle = match p.page {
                ProfilePage::Practice => "Math practice",
                ProfilePage::Translate => "Translate chat",
            };
            (format!("{} {}", p.icon, p.name).trim().to_string(), subtitle)
        })
        .collect();
    tiles.push(("📰 News".to_string(), "News analysis"));
    tiles
}

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(" Homeroom ")
        .title_alignment(Alignment::Center);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let tiles = tiles(state);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            tiles
                .iter()
                .map(|_| Constraint::Length(TILE_HEIGHT))
                .chain(std::iter::once(Constraint::Min(0))),
        )
        .split(inner);

    for (i, (label, subtitle)) in tiles.iter().enumerate() {
        let selected = i == state.home_selected;
        let border = if selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let text = vec![
            Line::from(label.as_str()).style(Style::default().add_modifier(Modifier::BOLD)),
            Line::from(*subtitle).style(Style::default().fg(Color::Gray)),
        ];
        let tile = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(border));
        frame.render_widget(tile, rows[i]);
    }
}
