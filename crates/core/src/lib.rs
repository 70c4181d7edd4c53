pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod database;
pub mod due;
pub mod form;
pub mod model;
pub mod optimistic;
pub mod page;
pub mod render;
pub mod view;

pub use api::{ApiError, RestResource};
pub use backend::{connect, LocalBackend, RestBackend, TodoBackend};
pub use cache::CategoryCache;
pub use config::{AppConfig, BackendKind, ConfigOverrides};
pub use database::Database;
pub use due::DueStatus;
pub use form::{CategoryForm, TaskForm, ValidationError};
pub use model::*;
pub use page::{CategoryPage, PageSettings, TodoPage};
pub use render::{CategoryRow, TaskRow};
pub use view::{StatusKind, StatusMessage, View};
