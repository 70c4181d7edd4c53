use std::io::Write;

use anyhow::{anyhow, bail, Context, Result};

use crate::cli::{AddArgs, CategoryAddArgs, CategoryEditArgs, ClearArgs, CliCommand, ListArgs};
use crate::config::AppConfig;
use crate::core::backend::{self, TodoBackend};
use crate::core::page::{PageSettings, OVERDUE_BANNER};
use crate::core::render::TaskRow;
use crate::core::{
    CategoryCache, CategoryForm, CategoryPage, StatusMessage, TaskForm, TodoPage, View,
};
use crate::model::{CategoryFilter, TaskId};

pub fn execute<W: Write>(config: &AppConfig, command: CliCommand, mut writer: W) -> Result<()> {
    if matches!(command, CliCommand::Tui) {
        return Err(anyhow!("launch interactive surfaces directly"));
    }
    let backend = backend::connect(config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let mut session = Session {
        tasks: TodoPage::new(backend.clone(), PageSettings::from(config)),
        categories: CategoryPage::new(backend),
        cache: CategoryCache::new(),
        view: ConsoleView::default(),
    };
    runtime.block_on(session.run(command, &mut writer))
}

struct Session {
    tasks: TodoPage<dyn TodoBackend>,
    categories: CategoryPage<dyn TodoBackend>,
    cache: CategoryCache,
    view: ConsoleView,
}

impl Session {
    async fn run<W: Write>(&mut self, command: CliCommand, writer: &mut W) -> Result<()> {
        match command {
            CliCommand::Tui => Err(anyhow!("launch interactive surfaces directly")),
            CliCommand::List(args) => self.list(&args, writer).await,
            CliCommand::Add(args) => self.add(args, writer).await,
            CliCommand::Done(task) => self.set_done(task.id, true, writer).await,
            CliCommand::Undo(task) => self.set_done(task.id, false, writer).await,
            CliCommand::Delete(task) => {
                self.load_tasks().await?;
                self.require_task(task.id)?;
                self.tasks.delete_task(task.id, &mut self.view).await;
                self.view.finish(writer)?;
                writeln!(writer, "Deleted task {}", task.id)?;
                Ok(())
            }
            CliCommand::Clear(args) => self.clear(&args, writer).await,
            CliCommand::Categories => {
                self.load_categories().await?;
                for row in self.categories.rows() {
                    writeln!(
                        writer,
                        "{:>4}  {}  {}",
                        row.category.id, row.category.color, row.category.title
                    )?;
                }
                if self.categories.rows().is_empty() {
                    writeln!(writer, "No categories")?;
                }
                Ok(())
            }
            CliCommand::CategoryAdd(args) => self.category_add(args, writer).await,
            CliCommand::CategoryEdit(args) => self.category_edit(args, writer).await,
            CliCommand::CategoryDelete(category) => {
                self.load_categories().await?;
                if !self.cache.contains(category.id) {
                    bail!("Category {} not found", category.id);
                }
                self.categories
                    .delete_category(category.id, &mut self.cache, &mut self.view)
                    .await;
                self.view.finish(writer)
            }
        }
    }

    async fn load_tasks(&mut self) -> Result<()> {
        self.tasks.load(&mut self.cache, &mut self.view).await;
        self.view.check()
    }

    async fn load_categories(&mut self) -> Result<()> {
        self.categories.load(&mut self.cache, &mut self.view).await;
        self.view.check()
    }

    fn require_task(&self, id: TaskId) -> Result<&TaskRow> {
        self.tasks
            .row(id)
            .ok_or_else(|| anyhow!("Task {} not found", id))
    }

    async fn list<W: Write>(&mut self, args: &ListArgs, writer: &mut W) -> Result<()> {
        self.load_tasks().await?;
        self.tasks.set_filter(args.category, &mut self.view);

        let mut shown = 0usize;
        for row in self.tasks.visible_rows() {
            writeln!(writer, "{}", format_task_row(row))?;
            shown += 1;
        }
        if shown == 0 {
            writeln!(writer, "No tasks")?;
        }
        if self.view.overdue {
            writeln!(writer, "{}", OVERDUE_BANNER)?;
        }
        Ok(())
    }

    async fn add<W: Write>(&mut self, args: AddArgs, writer: &mut W) -> Result<()> {
        if args.category.is_some() {
            self.load_categories().await?;
        }
        let form = TaskForm {
            title: args.title.join(" "),
            due_date: args.due.unwrap_or_default(),
            category: args.category,
        };
        let created = self.tasks.add_task(&form, &self.cache, &mut self.view).await;
        self.view.finish(writer)?;
        if let Some(id) = created {
            writeln!(writer, "Task id: {}", id)?;
        }
        Ok(())
    }

    async fn set_done<W: Write>(&mut self, id: TaskId, done: bool, writer: &mut W) -> Result<()> {
        self.load_tasks().await?;
        if self.require_task(id)?.done.checked == done {
            writeln!(
                writer,
                "Task {} is already {}",
                id,
                if done { "done" } else { "open" }
            )?;
            return Ok(());
        }
        self.tasks.toggle_done(id, &mut self.view).await;
        self.view.finish(writer)?;
        writeln!(
            writer,
            "Marked task {} as {}",
            id,
            if done { "done" } else { "open" }
        )?;
        Ok(())
    }

    async fn clear<W: Write>(&mut self, args: &ClearArgs, writer: &mut W) -> Result<()> {
        self.load_tasks().await?;
        if let CategoryFilter::Category(id) = args.category {
            if !self.cache.contains(id) {
                bail!("Category {} not found", id);
            }
        }
        self.view.assume_yes = args.yes;
        self.tasks.set_filter(args.category, &mut self.view);
        self.tasks.clear_tasks(&mut self.view).await;
        self.view.finish(writer)
    }

    async fn category_add<W: Write>(&mut self, args: CategoryAddArgs, writer: &mut W) -> Result<()> {
        let form = CategoryForm {
            title: args.title.join(" "),
            color: args.color,
        };
        let created = self
            .categories
            .add_category(&form, &mut self.cache, &mut self.view)
            .await;
        self.view.finish(writer)?;
        if let Some(id) = created {
            writeln!(writer, "Category id: {}", id)?;
        }
        Ok(())
    }

    async fn category_edit<W: Write>(&mut self, args: CategoryEditArgs, writer: &mut W) -> Result<()> {
        self.load_categories().await?;
        let form = CategoryForm {
            title: args.title.unwrap_or_default(),
            color: args.color.unwrap_or_default(),
        };
        self.categories
            .modify_category(args.id, &form, &mut self.cache, &mut self.view)
            .await;
        self.view.finish(writer)
    }
}

fn format_task_row(row: &TaskRow) -> String {
    let check = if row.done.checked { "[x]" } else { "[ ]" };
    let due = match row.due.status {
        Some(status) => format!("{} ({})", row.due.text, status),
        None => row.due.text.clone(),
    };
    format!(
        "{} {:>4}  {}  [{}]  {}",
        check, row.id, row.title, row.category.title, due
    )
}

/// Collects what the pages report so the command can print it, or fail
/// with the error message.
#[derive(Debug, Default)]
struct ConsoleView {
    assume_yes: bool,
    notices: Vec<String>,
    error: Option<String>,
    overdue: bool,
}

impl ConsoleView {
    fn check(&mut self) -> Result<()> {
        match self.error.take() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }

    fn finish<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        for notice in self.notices.drain(..) {
            writeln!(writer, "{}", notice)?;
        }
        self.check()
    }
}

impl View for ConsoleView {
    fn show_status(&mut self, message: StatusMessage) {
        if message.is_error() {
            self.error = Some(message.text);
        } else {
            self.notices.push(message.text);
        }
    }

    fn hide_status(&mut self) {}

    fn set_overdue_banner(&mut self, visible: bool) {
        self.overdue = visible;
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if !self.assume_yes {
            self.notices
                .push(format!("{} Re-run with --yes to confirm.", prompt));
        }
        self.assume_yes
    }
}
