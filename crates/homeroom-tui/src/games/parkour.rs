// Side-scrolling runner. After a five second countdown obstacles roll in
// from the right and speed up over time; Space jumps.

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

pub const WIDTH: f64 = 640.0;
pub const HEIGHT: f64 = 300.0;
pub const GROUND: f64 = 250.0;
pub const COUNTDOWN_TICKS: u32 = 5 * 60;
const PLAYER_X: f64 = 50.0;
const PLAYER_W: f64 = 20.0;
const PLAYER_H: f64 = 30.0;
const GRAVITY: f64 = 0.9;
const JUMP_VELOCITY: f64 = -12.0;
const SPAWN_INTERVAL: u32 = 90;
const SPEEDUP_INTERVAL: u32 = 600;
const START_SPEED: f64 = 1.5;
const SPEEDUP: f64 = 0.2;
const OBSTACLE_W: f64 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub h: f64,
}

#[derive(Debug, Clone)]
pub struct Parkour {
    /// Feet position; the player spans `player_y - 30 .. player_y`.
    pub player_y: f64,
    pub player_vy: f64,
    pub obstacles: Vec<Obstacle>,
    pub speed: f64,
    countdown: u32,
    tick: u32,
    over: bool,
    rng: StdRng,
}

impl Parkour {
    pub fn new(seed: u64) -> Self {
        Parkour {
            player_y: 220.0,
            player_vy: 0.0,
            obstacles: Vec::new(),
            speed: START_SPEED,
            countdown: COUNTDOWN_TICKS,
            tick: 0,
            over: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn started(&self) -> bool {
        self.countdown == 0
    }

    /// Whole seconds left on the countdown, rounded up.
    pub fn countdown_secs(&self) -> u32 {
        self.countdown.div_ceil(60)
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn score(&self) -> u32 {
        self.tick / 10
    }

    fn on_ground(&self) -> bool {
        self.player_y >= GROUND
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        if matches!(code, KeyCode::Char(' ') | KeyCode::Up) {
            self.jump();
        }
    }

    pub fn jump(&mut self) {
        if !self.over && self.on_ground() {
            self.player_vy = JUMP_VELOCITY;
        }
    }

    pub fn step(&mut self) {
        if self.over {
            return;
        }
        if self.countdown > 0 {
            self.countdown -= 1;
            return;
        }

        if self.tick % SPAWN_INTERVAL == 0 {
            let h = self.rng.random_range(20.0..60.0);
            self.obstacles.push(Obstacle {
                x: WIDTH,
                y: GROUND - h,
                h,
            });
        }
        if self.tick > 0 && self.tick % SPEEDUP_INTERVAL == 0 {
            self.speed += SPEEDUP;
        }

        self.player_vy += GRAVITY;
        self.player_y += self.player_vy;
        if self.player_y > GROUND {
            self.player_y = GROUND;
            self.player_vy = 0.0;
        }

        for obstacle in &mut self.obstacles {
            obstacle.x -= self.speed;
        }
        self.obstacles.retain(|o| o.x + OBSTACLE_W >= 0.0);
        if self.obstacles.iter().any(|o| self.collides(o)) {
            self.over = true;
        }

        self.tick += 1;
    }

    fn collides(&self, o: &Obstacle) -> bool {
        PLAYER_X < o.x + OBSTACLE_W
            && PLAYER_X + PLAYER_W > o.x
            && self.player_y > o.y
            && self.player_y - PLAYER_H < o.y + o.h
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let title = if self.started() {
            format!(" Parkour | Score: {} ", self.score())
        } else {
            " Parkour ".to_string()
        };
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
                    height: HEIGHT - GROUND,
                    color: Color::Green,
                });
                for o in &self.obstacles {
                    ctx.draw(&Rectangle {
                        x: o.x,
                        y: HEIGHT - o.y - o.h,
                        width: OBSTACLE_W,
                        height: o.h,
                        color: Color::Red,
                    });
                }
                // Body plus a round head.
                let feet = HEIGHT - self.player_y;
                ctx.draw(&Rectangle {
                    x: PLAYER_X + 6.0,
                    y: feet,
                    width: 8.0,
                    height: PLAYER_H - 12.0,
                    color: Color::LightRed,
                });
                ctx.draw(&Circle {
                    x: PLAYER_X + PLAYER_W / 2.0,
                    y: feet + PLAYER_H - 6.0,
                    radius: 6.0,
                    color: Color::LightRed,
                });

                if !self.started() {
                    ctx.print(
                        10.0,
                        HEIGHT - 30.0,
                        format!("Starting in: {}", self.countdown_secs()),
                    );
                } else if self.over {
                    ctx.print(10.0, HEIGHT / 2.0, game_over_text(self.score()));
                }
            });
        frame.render_widget(canvas, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(seed: u64) -> Parkour {
        let mut game = Parkour::new(seed);
        for _ in 0..COUNTDOWN_TICKS {
            game.step();
        }
        game
    }

    #[test]
    fn countdown_holds_the_world_still() {
        let mut game = Parkour::new(1);
        assert_eq!(game.countdown_secs(), 5);
        for _ in 0..61 {
            game.step();
        }
        assert_eq!(game.countdown_secs(), 4);
        assert!(game.obstacles.is_empty());
        assert_eq!(game.player_y, 220.0);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn first_step_spawns_and_player_lands() {
        let mut game = started(3);
        assert!(game.started());
        game.step();
        assert_eq!(game.obstacles.len(), 1);
        let o = &game.obstacles[0];
        assert!((20.0..60.0).contains(&o.h));
        assert!((o.y + o.h - GROUND).abs() < 1e-9);

        for _ in 0..20 {
            game.step();
        }
        assert_eq!(game.player_y, GROUND);
    }

    #[test]
    fn jump_only_from_the_ground() {
        let mut game = started(1);
        game.jump();
        assert_eq!(game.player_vy, 0.0, "still falling from the start height");

        for _ in 0..10 {
            game.step();
        }
        game.obstacles.clear();
        game.jump();
        assert_eq!(game.player_vy, -12.0);
        game.step();
        assert!(game.player_y < GROUND);
        let vy = game.player_vy;
        game.jump();
        assert_eq!(game.player_vy, vy);
    }

    #[test]
    fn speed_rises_every_600_ticks() {
        let mut game = started(1);
        for _ in 0..600 {
            game.step();
            game.obstacles.clear();
        }
        assert!((game.speed - 1.5).abs() < 1e-9);
        game.step();
        assert!((game.speed - 1.7).abs() < 1e-9);
        assert_eq!(game.score(), 60);
    }

    #[test]
    fn running_into_an_obstacle_ends_the_game() {
        let mut game = started(1);
        game.player_y = GROUND;
        game.obstacles.push(Obstacle {
            x: 60.0,
            y: GROUND - 40.0,
            h: 40.0,
        });
        game.tick = 1;
        game.step();
        assert!(game.is_over());

        let score = game.score();
        game.step();
        assert_eq!(game.score(), score);
    }

    #[test]
    fn clearing_an_obstacle_is_safe() {
        let mut game = started(1);
        game.tick = 1;
        game.player_y = 100.0;
        game.obstacles.push(Obstacle {
            x: 60.0,
            y: GROUND - 40.0,
            h: 40.0,
        });
        game.step();
        assert!(!game.is_over());
    }
}
