//! View seam for the todo client.
//!
//! The session controller drives a [`TodoView`] and never talks to the
//! terminal directly; tests substitute a recording view.

pub mod terminal;

pub use terminal::TerminalView;

use crate::backend::TodoItem;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// The UI surface consumed by the session controller.
///
/// `replace_items` is the only list mutation: the displayed collection is
/// replaced wholesale on every refresh. The controller guarantees it is
/// never called after the session has left the authenticated state.
pub trait TodoView: Send + Sync {
    /// Switch to the login screen, listing the configured providers.
    fn show_login(&self, providers: &[String]);

    /// Switch to the todo list screen.
    fn show_todo_list(&self);

    /// Replace the displayed item list wholesale.
    fn replace_items(&self, items: &[TodoItem]);

    /// Surface a one-line notice to the user.
    fn notify(&self, level: NoticeLevel, message: &str);
}
