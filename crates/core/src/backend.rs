//! The operations the page controllers need, independent of where tasks live.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::api::{ApiError, RestResource};
use crate::config::{AppConfig, BackendKind};
use crate::database::Database;
use crate::model::{
    Category, CategoryId, CategoryPatch, CategoryTaskLink, NewCategory, NewTask, Task, TaskId,
    TaskPatch,
};

#[async_trait]
pub trait TodoBackend: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    /// Tasks with their categories embedded, ascending by id.
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;

    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError>;

    async fn link_category(&self, link: &CategoryTaskLink) -> Result<CategoryTaskLink, ApiError>;

    /// `None` when the backend acknowledged the change without echoing the row.
    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, ApiError>;

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError>;

    async fn delete_all_tasks(&self) -> Result<(), ApiError>;

    async fn create_category(&self, category: &NewCategory) -> Result<Category, ApiError>;

    async fn update_category(
        &self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<Option<Category>, ApiError>;

    /// Drops the category's links before the category itself.
    async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError>;
}

/// Pick the backend named by `config`.
pub fn connect(config: &AppConfig) -> Result<Arc<dyn TodoBackend>> {
    match config.backend() {
        BackendKind::Rest => {
            debug!(api_url = config.api_url(), "using REST backend");
            Ok(Arc::new(RestBackend::new(config)?))
        }
        BackendKind::Local => {
            debug!(db = %config.db_path().display(), "using offline backend");
            Ok(Arc::new(LocalBackend::new(config.clone())?))
        }
    }
}

/// PostgREST-style API with `todos`, `categories` and `categories_todos`.
#[derive(Debug, Clone)]
pub struct RestBackend {
    todos: RestResource<Task>,
    categories: RestResource<Category>,
    links: RestResource<CategoryTaskLink>,
}

impl RestBackend {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self::with_client(
            client,
            config.api_url(),
            config.api_token().map(str::to_string),
        ))
    }

    pub fn with_client(client: Client, api_url: &str, token: Option<String>) -> Self {
        Self {
            todos: RestResource::new(client.clone(), api_url, "todos").with_token(token.clone()),
            categories: RestResource::new(client.clone(), api_url, "categories")
                .with_token(token.clone()),
            links: RestResource::new(client, api_url, "categories_todos").with_token(token),
        }
    }
}

#[async_trait]
impl TodoBackend for RestBackend {
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.categories.list_with(&[("order", "id.asc")]).await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.todos
            .list_with(&[("select", "*,categories(*)"), ("order", "id.asc")])
            .await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        self.todos.create(task).await
    }

    async fn link_category(&self, link: &CategoryTaskLink) -> Result<CategoryTaskLink, ApiError> {
        self.links.create(link).await
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, ApiError> {
        self.todos.update(id, patch).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        self.todos.remove(id).await
    }

    async fn delete_all_tasks(&self) -> Result<(), ApiError> {
        self.todos.remove_all().await
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, ApiError> {
        self.categories.create(category).await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<Option<Category>, ApiError> {
        self.categories.update(id, patch).await
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
        self.links.remove_where("category_id", id).await?;
        self.categories.remove(id).await
    }
}

/// Offline backend over the SQLite store in the data directory.
///
/// Each call opens its own connection on the blocking pool.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    config: AppConfig,
}

impl LocalBackend {
    pub fn new(config: AppConfig) -> Result<Self> {
        Database::initialize(&config)?;
        Ok(Self { config })
    }

    async fn with_database<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let mut db = Database::initialize(&config)?;
            f(&mut db)
        })
        .await
        .map_err(|err| anyhow!("blocking task failed: {}", err))
        .and_then(|result| result)
        .map_err(ApiError::storage)
    }
}

#[async_trait]
impl TodoBackend for LocalBackend {
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.with_database(|db| db.fetch_categories()).await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.with_database(|db| db.fetch_tasks()).await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let task = task.clone();
        self.with_database(move |db| db.insert_task(&task)).await
    }

    async fn link_category(&self, link: &CategoryTaskLink) -> Result<CategoryTaskLink, ApiError> {
        let link = *link;
        self.with_database(move |db| db.insert_link(&link)).await
    }

    async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, ApiError> {
        let patch = patch.clone();
        self.with_database(move |db| db.update_task(id, &patch)).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ApiError> {
        self.with_database(move |db| db.delete_task(id).map(|_| ()))
            .await
    }

    async fn delete_all_tasks(&self) -> Result<(), ApiError> {
        self.with_database(|db| db.delete_all_tasks().map(|_| ()))
            .await
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, ApiError> {
        let category = category.clone();
        self.with_database(move |db| db.insert_category(&category))
            .await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<Option<Category>, ApiError> {
        let patch = patch.clone();
        self.with_database(move |db| db.update_category(id, &patch))
            .await
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
        self.with_database(move |db| db.delete_category(id).map(|_| ()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn local() -> (LocalBackend, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let config = AppConfig::from_data_dir(dir.path().to_path_buf())
            .expect("config")
            .offline();
        (LocalBackend::new(config).expect("backend"), dir)
    }

    #[tokio::test]
    async fn local_backend_round_trips_linked_task() {
        let (backend, _dir) = local();
        let category = backend
            .create_category(&NewCategory {
                title: "Garden".into(),
                color: "#00ff00".into(),
            })
            .await
            .unwrap();
        let task = backend
            .create_task(&NewTask {
                title: "Mow lawn".into(),
                due_date: None,
                done: false,
            })
            .await
            .unwrap();
        backend
            .link_category(&CategoryTaskLink {
                category_id: category.id,
                todo_id: task.id,
            })
            .await
            .unwrap();

        let tasks = backend.list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].primary_category(), Some(&category));

        backend.delete_category(category.id).await.unwrap();
        let tasks = backend.list_tasks().await.unwrap();
        assert!(tasks[0].categories.is_empty());
        assert!(backend.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn local_backend_reports_storage_errors() {
        let (backend, _dir) = local();
        let err = backend
            .link_category(&CategoryTaskLink {
                category_id: 7,
                todo_id: 8,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));
    }

    #[test]
    fn connect_honours_backend_kind() {
        let dir = TempDir::new().expect("temp dir");
        let config = AppConfig::from_data_dir(dir.path().to_path_buf()).expect("config");
        assert!(connect(&config).is_ok());
        assert!(connect(&config.offline()).is_ok());
        assert!(dir.path().join("tdl.sqlite3").exists());
    }

    #[test]
    fn rest_backend_targets_the_three_collections() {
        let backend = RestBackend::with_client(Client::new(), "http://localhost:3000/", None);
        assert_eq!(backend.todos.url(), "http://localhost:3000/todos");
        assert_eq!(backend.categories.url(), "http://localhost:3000/categories");
        assert_eq!(backend.links.url(), "http://localhost:3000/categories_todos");
    }
}
