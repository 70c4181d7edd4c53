use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// Text for the status region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusMessage {
    pub fn info<T: Into<String>>(text: T) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Info,
        }
    }

    pub fn error<T: Into<String>>(text: T) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Surface the page controllers report to.
///
/// The rows themselves stay with the controllers; a view only owns the
/// status region, the overdue banner, and the confirmation prompt.
pub trait View {
    fn show_status(&mut self, message: StatusMessage);

    fn hide_status(&mut self);

    fn set_overdue_banner(&mut self, visible: bool);

    /// Ask the user a yes/no question. Returning `false` aborts the action.
    fn confirm(&mut self, prompt: &str) -> bool;
}
