use std::path::PathBuf;

use clap::{value_parser, Args, Parser, Subcommand};

use crate::model::{CategoryFilter, CategoryId, TaskId};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tdl",
    version,
    about = "A terminal client for a PostgREST to-do backend.",
    after_help = "Examples:\n  tdl                          Launch the TUI (same as `tdl tui`)\n  tdl add \"Buy milk\" --due tomorrow --category 2\n  tdl list --category none\n  tdl --offline clear --yes"
)]
pub struct Cli {
    /// Override the data directory (defaults to platform-specific app dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the REST API (defaults to $TDL_API_URL or http://localhost:3000)
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Use the local SQLite store instead of the REST API
    #[arg(long, global = true)]
    pub offline: bool,

    /// Days ahead that still count as "due soon"
    #[arg(long = "soon-days", value_name = "DAYS", global = true, value_parser = value_parser!(i64).range(0..))]
    pub soon_days: Option<i64>,

    /// Override the tracing filter (e.g. "info", "tdl_core=debug")
    #[arg(long = "log", value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Launch the keyboard-first terminal UI (default command)
    Tui,
    /// Print tasks with their category and due state
    List(ListArgs),
    /// Create a task
    Add(AddArgs),
    /// Mark a task as done
    Done(TaskRef),
    /// Mark a task as not done
    Undo(TaskRef),
    /// Delete a task by id
    Delete(TaskRef),
    /// Delete every task, or every task matching a category filter
    Clear(ClearArgs),
    /// Print categories
    Categories,
    /// Create a category
    CategoryAdd(CategoryAddArgs),
    /// Change a category's title or color
    CategoryEdit(CategoryEditArgs),
    /// Delete a category and unlink its tasks
    CategoryDelete(CategoryRef),
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Category filter: all, none, or a category id
    #[arg(long, value_name = "FILTER", default_value = "all")]
    pub category: CategoryFilter,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Task title
    #[arg(value_name = "TITLE", required = true)]
    pub title: Vec<String>,

    /// Due date (ISO e.g. 2024-12-24, today, tomorrow, +3d, mon)
    #[arg(long, value_name = "DATE")]
    pub due: Option<String>,

    /// Category id to attach
    #[arg(long, value_name = "ID")]
    pub category: Option<CategoryId>,
}

#[derive(Args, Debug, Clone)]
pub struct TaskRef {
    #[arg(value_name = "ID")]
    pub id: TaskId,
}

#[derive(Args, Debug, Clone)]
pub struct ClearArgs {
    /// Only delete tasks matching this filter: all, none, or a category id
    #[arg(long, value_name = "FILTER", default_value = "all")]
    pub category: CategoryFilter,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CategoryRef {
    #[arg(value_name = "ID")]
    pub id: CategoryId,
}

#[derive(Args, Debug, Clone)]
pub struct CategoryAddArgs {
    #[arg(value_name = "TITLE", required = true)]
    pub title: Vec<String>,

    /// Hex color such as #ff0000
    #[arg(long, value_name = "HEX", default_value = "#ff0000")]
    pub color: String,
}

#[derive(Args, Debug, Clone)]
pub struct CategoryEditArgs {
    #[arg(value_name = "ID")]
    pub id: CategoryId,

    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Hex color such as #00ff00
    #[arg(long, value_name = "HEX")]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["tdl"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.offline);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "tdl",
            "list",
            "--category",
            "none",
            "--offline",
            "--soon-days",
            "2",
        ])
        .unwrap();
        assert!(cli.offline);
        assert_eq!(cli.soon_days, Some(2));
        match cli.command {
            Some(CliCommand::List(args)) => assert_eq!(args.category, CategoryFilter::Uncategorized),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn add_collects_title_words() {
        let cli = Cli::try_parse_from(["tdl", "add", "Buy", "milk", "--due", "+2d", "--category", "3"])
            .unwrap();
        match cli.command {
            Some(CliCommand::Add(args)) => {
                assert_eq!(args.title.join(" "), "Buy milk");
                assert_eq!(args.due.as_deref(), Some("+2d"));
                assert_eq!(args.category, Some(3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_filter_and_negative_threshold() {
        assert!(Cli::try_parse_from(["tdl", "list", "--category", "work"]).is_err());
        assert!(Cli::try_parse_from(["tdl", "--soon-days", "-1", "list"]).is_err());
    }
}
