//! UI-agnostic screen model.
//!
//! Screens implement `Screen` and describe themselves as a `ScreenView`;
//! the terminal front end turns that into widgets. Keeping rendering out of
//! the core lets the guard and router be tested without a terminal.
//!
//! - `fetch`: background data loads tied to a screen's mount lifetime
//! - `form`: text-field forms (login, register)

pub mod fetch;
pub mod form;

pub use fetch::{Fetch, FetchState, Liveness};
pub use form::{can_add_char, Form, FormAction, FormField};

/// Keyboard input, already decoupled from the terminal backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Char(char),
    Backspace,
    Enter,
    Tab,
    BackTab,
    Up,
    Down,
    PageUp,
    PageDown,
    Esc,
}

/// Whether a screen consumed an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Handled,
    Ignored,
}

/// A navigable view.
///
/// `mount` runs once when the screen becomes current and `unmount` once when
/// it is replaced. `poll` is called every tick to apply finished background
/// work; it returns true when the view changed.
pub trait Screen: Send {
    fn mount(&mut self);

    fn poll(&mut self) -> bool {
        false
    }

    fn render(&self) -> ScreenView;

    fn handle_input(&mut self, _input: Input) -> InputOutcome {
        InputOutcome::Ignored
    }

    fn unmount(&mut self) {}

    /// True while a text field has focus, so global shortcuts stay off.
    fn captures_text(&self) -> bool {
        false
    }
}

/// Everything the front end needs to draw one screen
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScreenView {
    pub breadcrumbs: Vec<String>,
    pub title: String,
    pub body: Body,
    pub hint: Option<String>,
}

impl ScreenView {
    pub fn new(title: impl Into<String>, body: Body) -> Self {
        Self {
            breadcrumbs: Vec::new(),
            title: title.into(),
            body,
            hint: None,
        }
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn with_breadcrumbs(mut self, crumbs: &[&str]) -> Self {
        self.breadcrumbs = crumbs.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    Blank,
    Loading,
    Error(String),
    Text(Vec<String>),
    List(ListView),
    Form(FormView),
    /// Header lines above several side-by-side lists; `active` has focus.
    Panels {
        header: Vec<String>,
        panels: Vec<ListView>,
        active: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListView {
    pub title: String,
    pub items: Vec<String>,
    pub selected: Option<usize>,
    pub empty_message: String,
}

impl ListView {
    pub fn new(title: impl Into<String>, items: Vec<String>, selected: usize, empty_message: &str) -> Self {
        let selected = if items.is_empty() { None } else { Some(selected.min(items.len() - 1)) };
        Self {
            title: title.into(),
            items,
            selected,
            empty_message: empty_message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormView {
    pub fields: Vec<FieldView>,
    pub focus: usize,
    pub submit_label: String,
    pub error: Option<String>,
    pub busy: bool,
    /// Extra lines under the button (toggles, links)
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldView {
    pub label: String,
    /// Display value; masked fields are already replaced with `*`.
    pub value: String,
}

/// Move a list selection by `delta`, clamped to `len`
pub fn step_selection(selected: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = selected as isize + delta;
    next.clamp(0, len as isize - 1) as usize
}

/// Number of rows moved by PageUp/PageDown
pub const PAGE_SCROLL_SIZE: isize = 10;

/// Shared Up/Down/PageUp/PageDown handling for list screens
pub fn scroll_input(selected: &mut usize, len: usize, input: Input) -> InputOutcome {
    let delta = match input {
        Input::Up | Input::Char('k') => -1,
        Input::Down | Input::Char('j') => 1,
        Input::PageUp => -PAGE_SCROLL_SIZE,
        Input::PageDown => PAGE_SCROLL_SIZE,
        _ => return InputOutcome::Ignored,
    };
    *selected = step_selection(*selected, delta, len);
    InputOutcome::Handled
}
