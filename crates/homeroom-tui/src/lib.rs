// Library root: the terminal UI and the reward games, exposed so the
// binary and the tests share one public API.

pub mod games;
pub mod tui;
