// Help bar: the keys that do something on the current page.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use homeroom_core::protocol::Page;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        hints(state),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

pub fn hints(state: &ViewState) -> &'static str {
    if state.confirm_quit {
        return " y:Quit | n/Esc:Cancel";
    }
    if let Some(session) = &state.game {
        return if session.game.is_over() {
            " Space/Enter:Play again | Esc:Back"
        } else {
            " Arrows/Space:Play | Esc:Back"
        };
    }
    match &state.page {
        Page::Home => " ←→:Select | Enter:Open | q:Quit",
        Page::Practice { .. } => match &state.practice {
            Some(s) if s.reward_unlocked => " 1-3:Play a game | F5:New questions | ←→:Level | Esc:Home | q:Quit",
            Some(s) if s.results.is_some() => " F5:New questions | ←→:Level | Esc:Home | q:Quit",
            _ => " Type answers | ↑↓/Tab:Move | Enter:Submit | F5:New | ←→:Level | Esc:Home",
        },
        Page::Translate => " Type text | Enter:Translate | ↑↓:Scroll history | Esc:Home | Ctrl+C:Quit",
        Page::News => " Type query | ↑↓:Items | Enter:Analyse | PgUp/PgDn:Scroll | Esc:Home",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeroom_core::protocol::PracticeSnapshot;

    use crate::games::{GameKind, GameSession};

    #[test]
    fn hints_follow_page_and_mode() {
        let mut state = ViewState::default();
        assert!(hints(&state).contains("Enter:Open"));

        state.page = Page::Practice {
            user: "Lucas".into(),
        };
        assert!(hints(&state).contains("Enter:Submit"));
        state.practice = Some(PracticeSnapshot {
            results: Some(vec![]),
            reward_unlocked: true,
            ..Default::default()
        });
        assert!(hints(&state).contains("1-3:Play"));

        state.game = Some(GameSession::new(GameKind::Parkour, 1));
        assert!(hints(&state).contains("Esc:Back"));

        state.confirm_quit = true;
        assert_eq!(hints(&state), " y:Quit | n/Esc:Cancel");
    }

    #[test]
    fn render_does_not_panic() {
        let backend = ratatui::backend::TestBackend::new(80, 1);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
