// Snake on a 20x20 grid. The snake moves one cell every 200 ms.

use std::collections::VecDeque;

use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Rectangle};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use super::game_over_text;

pub const GRID: i32 = 20;
/// 200 ms at 60 steps per second.
pub const STEPS_PER_MOVE: u32 = 12;
const START: Cell = Cell { x: 9, y: 9 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snake {
    /// Head first.
    pub body: VecDeque<Cell>,
    pub direction: Direction,
    /// Turn requested since the last move.
    pending: Option<Direction>,
    pub food: Cell,
    score: u32,
    over: bool,
    ticks: u32,
    rng: StdRng,
}

impl Snake {
    pub fn new(seed: u64) -> Self {
        let mut snake = Snake {
            body: VecDeque::from([START]),
            direction: Direction::Right,
            pending: None,
            food: START,
            score: 0,
            over: false,
            ticks: 0,
            rng: StdRng::seed_from_u64(seed),
        };
        snake.food = snake.free_cell();
        snake
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        let wanted = match code {
            KeyCode::Up => Direction::Up,
            KeyCode::Down => Direction::Down,
            KeyCode::Left => Direction::Left,
            KeyCode::Right => Direction::Right,
            _ => return,
        };
        // No reversing into the neck.
        if wanted != self.direction.opposite() {
            self.pending = Some(wanted);
        }
    }

    pub fn step(&mut self) {
        if self.over {
            return;
        }
        self.ticks += 1;
        if self.ticks % STEPS_PER_MOVE == 0 {
            self.advance();
        }
    }

    /// Move one cell.
    pub fn advance(&mut self) {
        if self.over {
            return;
        }
        if let Some(direction) = self.pending.take() {
            self.direction = direction;
        }
        let (dx, dy) = self.direction.delta();
        let head = self.body[0];
        let next = Cell {
            x: head.x + dx,
            y: head.y + dy,
        };

        let off_grid = next.x < 0 || next.x >= GRID || next.y < 0 || next.y >= GRID;
        if off_grid || self.body.contains(&next) {
            self.over = true;
            return;
        }

        self.body.push_front(next);
        if next == self.food {
            self.score += 1;
            self.food = self.free_cell();
        } else {
            self.body.pop_back();
        }
    }

    /// A random cell not covered by the snake. Falls back to the head cell
    /// when the board is full.
    fn free_cell(&mut self) -> Cell {
        let free: Vec<Cell> = (0..GRID)
            .flat_map(|y| (0..GRID).map(move |x| Cell { x, y }))
            .filter(|c| !self.body.contains(c))
            .collect();
        if free.is_empty() {
            return self.body[0];
        }
        free[self.rng.random_range(0..free.len())]
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Snake | Score: {} ", self.score);
        let grid = GRID as f64;
        let canvas = Canvas::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .marker(Marker::Block)
            .x_bounds([0.0, grid])
            .y_bounds([0.0, grid])
            .paint(|ctx| {
                ctx.draw(&cell_rect(self.food, Color::Red));
                for (i, cell) in self.body.iter().enumerate() {
                    let color = if i == 0 { Color::LightGreen } else { Color::Green };
                    ctx.draw(&cell_rect(*cell, color));
                }
                if self.over {
                    ctx.print(1.0, grid / 2.0, game_over_text(self.score));
                }
            });
        frame.render_widget(canvas, area);
    }
}

/// Canvas rectangle for a grid cell; canvas y grows upwards.
fn cell_rect(cell: Cell, color: Color) -> Rectangle {
    Rectangle {
        x: cell.x as f64,
        y: (GRID - 1 - cell.y) as f64,
        width: 0.9,
        height: 0.9,
        color,
    }
}
