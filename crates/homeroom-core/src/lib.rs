pub mod chat;
pub mod config;
pub mod credentials;
pub mod history;
pub mod level;
pub mod paths;
pub mod protocol;

pub use level::Level;
