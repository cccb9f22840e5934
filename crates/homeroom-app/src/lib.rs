pub mod app;
pub mod gist;
pub mod store;
