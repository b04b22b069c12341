//! Terminal rendering of the todo list.
//!
//! Renders on state changes only: the polling refresher republishes the
//! list every interval, and reprinting an unchanged list every second
//! would flood the terminal.

use console::{style, Term};
use parking_lot::Mutex;

use super::{NoticeLevel, TodoView};
use crate::backend::TodoItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Login,
    TodoList,
}

struct ViewState {
    screen: Screen,
    items: Vec<TodoItem>,
    rendered_once: bool,
}

/// Console-backed [`TodoView`] implementation.
pub struct TerminalView {
    term: Term,
    state: Mutex<ViewState>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            state: Mutex::new(ViewState {
                screen: Screen::Login,
                items: Vec::new(),
                rendered_once: false,
            }),
        }
    }

    /// Snapshot of the currently displayed items.
    pub fn items(&self) -> Vec<TodoItem> {
        self.state.lock().items.clone()
    }

    fn write_line(&self, line: &str) {
        let _ = self.term.write_line(line);
    }

    fn render_items(&self, items: &[TodoItem]) {
        if items.is_empty() {
            self.write_line(&format!("  {}", style("(no items)").dim()));
            return;
        }
        for item in items {
            let mark = if item.checked {
                style("[x]").green().to_string()
            } else {
                style("[ ]").dim().to_string()
            };
            self.write_line(&format!("  {mark} {}", item.text));
        }
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoView for TerminalView {
    fn show_login(&self, providers: &[String]) {
        let mut state = self.state.lock();
        state.screen = Screen::Login;
        state.items.clear();
        state.rendered_once = false;

        self.write_line(&format!("\n{}", style("── Sign in ──").bold()));
        if providers.is_empty() {
            self.write_line(&format!(
                "  {}",
                style("No login providers are available.").red()
            ));
        } else {
            for name in providers {
                self.write_line(&format!("  {} login configured", name));
            }
        }
    }

    fn show_todo_list(&self) {
        let mut state = self.state.lock();
        state.screen = Screen::TodoList;
        state.items.clear();
        state.rendered_once = false;

        self.write_line(&format!("\n{}", style("── Todo list ──").bold()));
    }

    fn replace_items(&self, items: &[TodoItem]) {
        let mut state = self.state.lock();
        if state.screen != Screen::TodoList {
            tracing::debug!("dropping list update outside the todo screen");
            return;
        }
        if state.rendered_once && state.items == items {
            return;
        }
        state.items = items.to_vec();
        state.rendered_once = true;

        self.write_line(&format!("\n{}", style("── Todo list ──").bold()));
        self.render_items(items);
    }

    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => self.write_line(message),
            NoticeLevel::Error => self.write_line(&style(message).red().to_string()),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
