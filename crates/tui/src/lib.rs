pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod tui;

pub use tdl_core as core;
pub use tdl_core::model;

pub use tdl_core::AppConfig;
