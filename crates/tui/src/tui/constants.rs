use std::time::Duration;

pub(crate) const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub(crate) const TICK_RATE: Duration = Duration::from_millis(200);
pub(crate) const STATUS_TTL: Duration = Duration::from_secs(5);

pub(crate) const STATUS_ENTER_ADD: &str =
    "New task — Tab: next field • ←/→: category • Enter: save • Esc: cancel";
pub(crate) const STATUS_ENTER_CATEGORY: &str =
    "Category — Tab: next field • Enter: save • Esc: cancel";
pub(crate) const STATUS_ENTER_RENAME: &str = "Rename task — Enter to save • Esc to cancel";
pub(crate) const STATUS_HELP: &str = "Keyboard reference — Enter/Esc to close";
pub(crate) const STATUS_CONFIRM: &str =
    "Confirm deletion — arrows choose, Enter confirms, Esc cancels";
pub(crate) const STATUS_REFRESHED: &str = "Reloaded tasks and categories";
