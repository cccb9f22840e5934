// Widgets for each page and the fixed bars.

pub mod help_bar;
pub mod home;
pub mod news;
pub mod practice;
pub mod quit_confirm;
pub mod status_bar;
pub mod translate;

use ratatui::style::{Color, Modifier, Style};

/// Border style for a panel that has (or lacks) keyboard focus.
pub fn focused_border_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

/// Text input contents followed by a block cursor.
pub fn with_cursor(text: &str) -> String {
    format!("{text}█")
}
