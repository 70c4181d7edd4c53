pub use tdl_tui::cli;
pub use tdl_tui::commands;
pub use tdl_tui::config;
pub use tdl_tui::logging;
pub use tdl_tui::tui;
pub use tdl_tui::AppConfig;

pub use tdl_core as core;
pub use tdl_core::backend;
pub use tdl_core::database as db;
pub use tdl_core::model;
