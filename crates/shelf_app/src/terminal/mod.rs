//! Line-oriented terminal front end.
mod app;
mod effects;
mod input;
mod render;

pub use app::run_app;
