// Reward mini-games unlocked by a perfect practice score.
//
// Each game is a plain simulation advanced in fixed 60 Hz steps and drawn on
// a ratatui canvas in its own field coordinates (origin top-left, y down).
// Games never talk to the app loop.

pub mod flappy;
pub mod parkour;
pub mod snake;

use std::time::Duration;

use crossterm::event::KeyCode;
use ratatui::layout::Rect;
use ratatui::Frame;

use flappy::Flappy;
use parkour::Parkour;
use snake::Snake;

/// One simulation step.
pub const STEP: Duration = Duration::from_nanos(16_666_667);

/// Upper bound on steps per `advance` so a stalled terminal does not make
/// the game jump ahead.
const MAX_STEPS_PER_ADVANCE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    Snake,
    Flappy,
    Parkour,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Snake, GameKind::Flappy, GameKind::Parkour];

    pub fn title(self) -> &'static str {
        match self {
            GameKind::Snake => "Snake",
            GameKind::Flappy => "Flappy Bird",
            GameKind::Parkour => "Parkour",
        }
    }

    /// Launch key on the reward banner.
    pub fn from_key(c: char) -> Option<GameKind> {
        match c {
            '1' => Some(GameKind::Snake),
            '2' => Some(GameKind::Flappy),
            '3' => Some(GameKind::Parkour),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Game {
    Snake(Snake),
    Flappy(Flappy),
    Parkour(Parkour),
}

impl Game {
    pub fn new(kind: GameKind, seed: u64) -> Self {
        match kind {
            GameKind::Snake => Game::Snake(Snake::new(seed)),
            GameKind::Flappy => Game::Flappy(Flappy::new(seed)),
            GameKind::Parkour => Game::Parkour(Parkour::new(seed)),
        }
    }

    pub fn kind(&self) -> GameKind {
        match self {
            Game::Snake(_) => GameKind::Snake,
            Game::Flappy(_) => GameKind::Flappy,
            Game::Parkour(_) => GameKind::Parkour,
        }
    }

    pub fn step(&mut self) {
        match self {
            Game::Snake(g) => g.step(),
            Game::Flappy(g) => g.step(),
            Game::Parkour(g) => g.step(),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match self {
            Game::Snake(g) => g.handle_key(code),
            Game::Flappy(g) => g.handle_key(code),
            Game::Parkour(g) => g.handle_key(code),
        }
    }

    pub fn is_over(&self) -> bool {
        match self {
            Game::Snake(g) => g.is_over(),
            Game::Flappy(g) => g.is_over(),
            Game::Parkour(g) => g.is_over(),
        }
    }

    pub fn score(&self) -> u32 {
        match self {
            Game::Snake(g) => g.score(),
            Game::Flappy(g) => g.score(),
            Game::Parkour(g) => g.score(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        match self {
            Game::Snake(g) => g.render(frame, area),
            Game::Flappy(g) => g.render(frame, area),
            Game::Parkour(g) => g.render(frame, area),
        }
    }
}

/// A running game plus its fixed-timestep clock.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub game: Game,
    seed: u64,
    accumulator: Duration,
}

impl GameSession {
    pub fn new(kind: GameKind, seed: u64) -> Self {
        GameSession {
            game: Game::new(kind, seed),
            seed,
            accumulator: Duration::ZERO,
        }
    }

    /// Run as many whole steps as `elapsed` (plus leftover time) covers.
    /// Returns the number of steps taken.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut steps = 0;
        while self.accumulator >= STEP && steps < MAX_STEPS_PER_ADVANCE {
            self.accumulator -= STEP;
            self.game.step();
            steps += 1;
        }
        if steps == MAX_STEPS_PER_ADVANCE {
            self.accumulator = Duration::ZERO;
        }
        steps
    }

    /// Space/Enter after game over restarts; everything else goes to the
    /// game.
    pub fn handle_key(&mut self, code: KeyCode) {
        if self.game.is_over() && matches!(code, KeyCode::Char(' ') | KeyCode::Enter) {
            self.seed = self.seed.wrapping_add(1);
            self.game = Game::new(self.game.kind(), self.seed);
            self.accumulator = Duration::ZERO;
            return;
        }
        self.game.handle_key(code);
    }
}

/// Status text drawn over a finished game.
pub(crate) fn game_over_text(score: u32) -> String {
    format!("Game Over! Score: {score}  (Space: play again, Esc: back)")
}
