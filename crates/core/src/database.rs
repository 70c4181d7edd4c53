use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::config::AppConfig;
use crate::model::{
    Category, CategoryId, CategoryPatch, CategoryTaskLink, NewCategory, NewTask, Task, TaskId,
    TaskPatch,
};

/// SQLite store mirroring the three REST collections (`todos`, `categories`,
/// `categories_todos`) for offline use.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn initialize(config: &AppConfig) -> Result<Self> {
        let conn = Connection::open(config.db_path()).with_context(|| {
            format!("Failed to open database at {}", config.db_path().display())
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to configure SQLite connection")?;

        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    color TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS todos (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    due_date TEXT,
                    done INTEGER NOT NULL DEFAULT 0
                );
                CREATE TABLE IF NOT EXISTS categories_todos (
                    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                    todo_id INTEGER NOT NULL REFERENCES todos(id) ON DELETE CASCADE,
                    PRIMARY KEY (category_id, todo_id)
                );
                CREATE INDEX IF NOT EXISTS idx_categories_todos_todo ON categories_todos(todo_id);",
            )
            .context("Failed to apply database migrations")?;
        Ok(())
    }

    pub fn fetch_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, color FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], map_category)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read categories")
    }

    pub fn fetch_category(&self, id: CategoryId) -> Result<Option<Category>> {
        self.conn
            .query_row(
                "SELECT id, title, color FROM categories WHERE id = :id",
                named_params! { ":id": id },
                map_category,
            )
            .optional()
            .context("Failed to read category")
    }

    /// Every task, oldest first, with its linked categories embedded.
    pub fn fetch_tasks(&self) -> Result<Vec<Task>> {
        let mut links = self.fetch_task_categories()?;
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, due_date, done FROM todos ORDER BY id")?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            let mut task = map_task(row)?;
            task.categories = links.remove(&task.id).unwrap_or_default();
            tasks.push(task);
        }
        Ok(tasks)
    }

    pub fn fetch_task(&self, id: TaskId) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(
                "SELECT id, title, due_date, done FROM todos WHERE id = :id",
                named_params! { ":id": id },
                map_task,
            )
            .optional()?;
        let Some(mut task) = task else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.title, c.color FROM categories c \
             JOIN categories_todos l ON l.category_id = c.id \
             WHERE l.todo_id = :id ORDER BY c.id",
        )?;
        task.categories = stmt
            .query_map(named_params! { ":id": id }, map_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(task))
    }

    fn fetch_task_categories(&self) -> Result<HashMap<TaskId, Vec<Category>>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.todo_id, c.id, c.title, c.color FROM categories_todos l \
             JOIN categories c ON c.id = l.category_id \
             ORDER BY l.todo_id, c.id",
        )?;
        let mut rows = stmt.query([])?;
        let mut by_task: HashMap<TaskId, Vec<Category>> = HashMap::new();
        while let Some(row) = rows.next()? {
            let todo_id: TaskId = row.get(0)?;
            by_task.entry(todo_id).or_default().push(Category {
                id: row.get(1)?,
                title: row.get(2)?,
                color: row.get(3)?,
            });
        }
        Ok(by_task)
    }

    pub fn insert_task(&self, task: &NewTask) -> Result<Task> {
        self.conn.execute(
            "INSERT INTO todos (title, due_date, done) VALUES (:title, :due_date, :done)",
            named_params! {
                ":title": task.title,
                ":due_date": task.due_date,
                ":done": task.done,
            },
        )?;
        let id = self.conn.last_insert_rowid();
        self.fetch_task(id)?
            .ok_or_else(|| anyhow!("Task {} vanished after insert", id))
    }

    pub fn insert_link(&self, link: &CategoryTaskLink) -> Result<CategoryTaskLink> {
        self.conn
            .execute(
                "INSERT INTO categories_todos (category_id, todo_id) VALUES (:category, :todo)",
                named_params! {
                    ":category": link.category_id,
                    ":todo": link.todo_id,
                },
            )
            .with_context(|| {
                format!(
                    "Failed to link category {} to task {}",
                    link.category_id, link.todo_id
                )
            })?;
        Ok(*link)
    }

    /// Apply the set fields of `patch`; `None` when no row has that id.
    pub fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>> {
        let changed = self.conn.execute(
            "UPDATE todos SET \
                title = COALESCE(:title, title), \
                due_date = COALESCE(:due_date, due_date), \
                done = COALESCE(:done, done) \
             WHERE id = :id",
            named_params! {
                ":title": patch.title,
                ":due_date": patch.due_date,
                ":done": patch.done,
                ":id": id,
            },
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.fetch_task(id)
    }

    pub fn delete_task(&self, id: TaskId) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM todos WHERE id = :id", named_params! { ":id": id })?;
        Ok(affected > 0)
    }

    pub fn delete_all_tasks(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM todos", [])?)
    }

    pub fn insert_category(&self, category: &NewCategory) -> Result<Category> {
        self.conn.execute(
            "INSERT INTO categories (title, color) VALUES (:title, :color)",
            named_params! {
                ":title": category.title,
                ":color": category.color,
            },
        )?;
        let id = self.conn.last_insert_rowid();
        self.fetch_category(id)?
            .ok_or_else(|| anyhow!("Category {} vanished after insert", id))
    }

    pub fn update_category(
        &self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<Option<Category>> {
        let changed = self.conn.execute(
            "UPDATE categories SET \
                title = COALESCE(:title, title), \
                color = COALESCE(:color, color) \
             WHERE id = :id",
            named_params! {
                ":title": patch.title,
                ":color": patch.color,
                ":id": id,
            },
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.fetch_category(id)
    }

    /// Remove a category's links, then the category itself.
    pub fn delete_category(&mut self, id: CategoryId) -> Result<bool> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM categories_todos WHERE category_id = :id",
            named_params! { ":id": id },
        )?;
        let affected = tx.execute(
            "DELETE FROM categories WHERE id = :id",
            named_params! { ":id": id },
        )?;
        tx.commit()?;
        Ok(affected > 0)
    }
}

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        title: row.get("title")?,
        color: row.get("color")?,
    })
}

fn map_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        due_date: row.get("due_date")?,
        done: row.get("done")?,
        categories: Vec::new(),
    })
}
