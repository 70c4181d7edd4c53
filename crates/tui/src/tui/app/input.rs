use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::buffer::TextBuffer;
use crate::tui::constants::{STATUS_HELP, STATUS_REFRESHED};

use super::{App, ConfirmChoice, FormField, InputMode, Page};

const STATUS_TASKS_ONLY: &str = "Switch to the Tasks tab for that";

#[derive(Debug, Clone, Copy)]
pub(crate) enum NormalAction {
    Quit,
    Add,
    ToggleDone,
    Edit,
    Delete,
    Clear,
    CycleFilter,
    Refresh,
    ShowHelp,
    SelectNext,
    SelectPrev,
    SwitchPage,
    SelectFirst,
    SelectLast,
}

impl NormalAction {
    fn from_event(key: &KeyEvent) -> Option<Self> {
        if matches!(key.code, KeyCode::Char('c')) && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Self::Quit);
        }

        match key.code {
            KeyCode::Char('q') => Some(Self::Quit),
            KeyCode::Char('a') => Some(Self::Add),
            KeyCode::Char(' ') | KeyCode::Char('d') => Some(Self::ToggleDone),
            KeyCode::Char('e') => Some(Self::Edit),
            KeyCode::Char('x') | KeyCode::Delete => Some(Self::Delete),
            KeyCode::Char('X') => Some(Self::Clear),
            KeyCode::Char('f') => Some(Self::CycleFilter),
            KeyCode::Char('r') => Some(Self::Refresh),
            KeyCode::Char('h') => Some(Self::ShowHelp),
            KeyCode::Char('j') | KeyCode::Down => Some(Self::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Self::SelectPrev),
            KeyCode::Tab | KeyCode::BackTab => Some(Self::SwitchPage),
            KeyCode::Home => Some(Self::SelectFirst),
            KeyCode::End => Some(Self::SelectLast),
            _ => None,
        }
    }
}

/// Shared line-editing keys; returns false when the key was not consumed.
fn edit_buffer(buffer: &mut TextBuffer, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            buffer.insert_char(ch)
        }
        KeyCode::Backspace => buffer.backspace(),
        KeyCode::Delete => buffer.delete_char(),
        KeyCode::Left => buffer.move_left(),
        KeyCode::Right => buffer.move_right(),
        KeyCode::Home => buffer.move_home(),
        KeyCode::End => buffer.move_end(),
        _ => return false,
    }
    true
}

impl App {
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.input_mode {
            InputMode::Normal => self.handle_normal_mode(key),
            InputMode::AddTask => self.handle_task_form_mode(key),
            InputMode::Rename => self.handle_rename_mode(key),
            InputMode::CategoryForm => self.handle_category_form_mode(key),
            InputMode::Help => self.handle_help_mode(key),
            InputMode::Confirm => self.handle_confirm_mode(key),
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> Result<()> {
        if let Some(action) = NormalAction::from_event(&key) {
            self.execute_normal_action(action)?;
        }
        Ok(())
    }

    fn execute_normal_action(&mut self, action: NormalAction) -> Result<()> {
        match action {
            NormalAction::Quit => {
                self.should_quit = true;
            }
            NormalAction::Add => match self.page {
                Page::Tasks => self.begin_add_task(),
                Page::Categories => self.begin_category_form(None),
            },
            NormalAction::ToggleDone => {
                if self.ensure_tasks_page() {
                    self.toggle_selected();
                }
            }
            NormalAction::Edit => match self.page {
                Page::Tasks => self.begin_rename(),
                Page::Categories => match self.selected_category_id() {
                    Some(id) => self.begin_category_form(Some(id)),
                    None => self.set_status_info("Nothing to modify"),
                },
            },
            NormalAction::Delete => self.prompt_delete(),
            NormalAction::Clear => {
                if self.ensure_tasks_page() {
                    self.prompt_clear();
                }
            }
            NormalAction::CycleFilter => {
                if self.ensure_tasks_page() {
                    self.cycle_filter();
                }
            }
            NormalAction::Refresh => {
                self.refresh();
                if !self.screen_shows_error() {
                    self.set_status_info(STATUS_REFRESHED);
                }
            }
            NormalAction::ShowHelp => {
                self.input_mode = InputMode::Help;
                self.set_status_info(STATUS_HELP);
            }
            NormalAction::SelectNext => self.select_next(),
            NormalAction::SelectPrev => self.select_prev(),
            NormalAction::SwitchPage => self.switch_page(),
            NormalAction::SelectFirst => {
                match self.page {
                    Page::Tasks => self.selected = 0,
                    Page::Categories => self.category_selected = 0,
                }
                self.clamp_selection();
            }
            NormalAction::SelectLast => {
                match self.page {
                    Page::Tasks => self.selected = usize::MAX,
                    Page::Categories => self.category_selected = usize::MAX,
                }
                self.clamp_selection();
            }
        }
        Ok(())
    }

    fn ensure_tasks_page(&mut self) -> bool {
        if self.page == Page::Tasks {
            true
        } else {
            self.set_status_info(STATUS_TASKS_ONLY);
            false
        }
    }

    fn handle_task_form_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.screen.status = None;
            }
            KeyCode::Enter => self.submit_task_form(),
            KeyCode::Tab => self.task_form.field = self.task_form.field.next(true),
            KeyCode::BackTab => {
                // Two steps forward in a three-field cycle is one step back.
                let field = self.task_form.field.next(true);
                self.task_form.field = field.next(true);
            }
            KeyCode::Left | KeyCode::Right if self.task_form.field == FormField::Category => {
                self.cycle_form_category(key.code == KeyCode::Right);
            }
            _ => {
                if let Some(buffer) = self.task_form.focused() {
                    edit_buffer(buffer, &key);
                }
            }
        }
        Ok(())
    }

    fn handle_rename_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.renaming = None;
                self.rename.clear();
                self.input_mode = InputMode::Normal;
                self.screen.status = None;
            }
            KeyCode::Enter => self.submit_rename(),
            _ => {
                edit_buffer(&mut self.rename, &key);
            }
        }
        Ok(())
    }

    fn handle_category_form_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.screen.status = None;
            }
            KeyCode::Enter => self.submit_category_form(),
            KeyCode::Tab | KeyCode::BackTab => {
                self.category_form.field = self.category_form.field.next(false);
            }
            _ => {
                edit_buffer(self.category_form.focused(), &key);
            }
        }
        Ok(())
    }

    fn handle_help_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('h') => {
                self.input_mode = InputMode::Normal;
                self.screen.status = None;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle_confirm_mode(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('n') => {
                self.resolve_confirm(ConfirmChoice::No);
                Ok(())
            }
            KeyCode::Char('y') => {
                self.resolve_confirm(ConfirmChoice::Yes);
                Ok(())
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                self.confirm_choice = self.confirm_choice.toggle();
                Ok(())
            }
            KeyCode::Enter => {
                self.resolve_confirm(self.confirm_choice);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
