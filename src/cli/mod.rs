pub mod app;
pub mod commands;
pub mod ui;

pub use app::{AppContext, Cli, Commands, run};
