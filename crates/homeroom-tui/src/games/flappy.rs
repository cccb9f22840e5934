// Flappy-bird clone on a 400x300 field. Space flaps.

use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Rectangle};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use super::game_over_text;

pub const WIDTH: f64 = 400.0;
pub const HEIGHT: f64 = 300.0;
const BIRD_X: f64 = 80.0;
const BIRD_RADIUS: f64 = 12.0;
const GRAVITY: f64 = 0.6;
const FLAP_VELOCITY: f64 = -9.0;
const PIPE_INTERVAL: u32 = 90;
const PIPE_WIDTH: f64 = 40.0;
const PIPE_GAP: f64 = 90.0;
const PIPE_SPEED: f64 = 2.5;
/// Drawn only; collisions use the field edge.
const GROUND_HEIGHT: f64 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub x: f64,
    /// Top edge of the gap.
    pub top: f64,
}

#[derive(Debug, Clone)]
pub struct Flappy {
    pub bird_y: f64,
    pub bird_vy: f64,
    pub pipes: Vec<Pipe>,
    frame: u32,
    score: u32,
    over: bool,
    rng: StdRng,
}

impl Flappy {
    pub fn new(seed: u64) -> Self {
        Flappy {
            bird_y: HEIGHT / 2.0,
            bird_vy: 0.0,
            pipes: Vec::new(),
            frame: 0,
            score: 0,
            over: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        if matches!(code, KeyCode::Char(' ') | KeyCode::Up) {
            self.flap();
        }
    }

    pub fn flap(&mut self) {
        if !self.over {
            self.bird_vy = FLAP_VELOCITY;
        }
    }

    pub fn step(&mut self) {
        if self.over {
            return;
        }
        self.frame += 1;
        if self.frame % PIPE_INTERVAL == 0 {
            let top = self.rng.random_range(20.0..HEIGHT - 180.0);
            self.pipes.push(Pipe { x: WIDTH, top });
        }

        self.bird_vy += GRAVITY;
        self.bird_y += self.bird_vy;
        if self.bird_y + BIRD_RADIUS > HEIGHT || self.bird_y - BIRD_RADIUS < 0.0 {
            self.over = true;
        }

        for pipe in &mut self.pipes {
            pipe.x -= PIPE_SPEED;
        }
        let before = self.pipes.len();
        self.pipes.retain(|p| p.x + PIPE_WIDTH >= 0.0);
        self.score += (before - self.pipes.len()) as u32;

        if self.pipes.iter().any(|p| self.hits(p)) {
            self.over = true;
        }
    }

    fn hits(&self, pipe: &Pipe) -> bool {
        let overlaps_x =
            BIRD_X + BIRD_RADIUS > pipe.x && BIRD_X - BIRD_RADIUS < pipe.x + PIPE_WIDTH;
        let outside_gap = self.bird_y - BIRD_RADIUS < pipe.top
            || self.bird_y + BIRD_RADIUS > pipe.top + PIPE_GAP;
        overlaps_x && outside_gap
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Flappy Bird | Score: {} ", self.score);
        let canvas = Canvas::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .marker(Marker::Braille)
            .x_bounds([0.0, WIDTH])
            .y_bounds([0.0, HEIGHT])
            .paint(|ctx| {
                ctx.draw(&Rectangle {
                    x: 0.0,
                    y: 0.0,
                    width: WIDTH,
                    height: GROUND_HEIGHT,
                    color: Color::Yellow,
                });
                for pipe in &self.pipes {
                    // Upper pipe from the top of the field down to the gap.
                    ctx.draw(&Rectangle {
                        x: pipe.x,
                        y: HEIGHT - pipe.top,
                        width: PIPE_WIDTH,
                        height: pipe.top,
                        color: Color::Green,
                    });
                    let bottom = pipe.top + PIPE_GAP;
                    ctx.draw(&Rectangle {
                        x: pipe.x,
                        y: 0.0,
                        width: PIPE_WIDTH,
                        height: HEIGHT - bottom,
                        color: Color::Green,
                    });
                }
                ctx.draw(&Circle {
                    x: BIRD_X,
                    y: HEIGHT - self.bird_y,
                    radius: BIRD_RADIUS,
                    color: Color::Red,
                });
                if self.over {
                    ctx.print(10.0, HEIGHT / 2.0, game_over_text(self.score));
                }
            });
        frame.render_widget(canvas, area);
    }
}
