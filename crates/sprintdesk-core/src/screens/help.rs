use crate::view::{Body, Screen, ScreenView};

const KEY_BINDINGS: &[(&str, &str)] = &[
    ("q", "Quit"),
    ("?", "This help"),
    ("g", "Home"),
    ("p", "Projects"),
    ("m", "Project management"),
    ("L", "Log out"),
    ("Esc", "Back"),
    ("Up/Down, j/k", "Move selection"),
    ("PgUp/PgDn", "Move selection by a page"),
    ("Enter", "Open / submit"),
    ("Tab", "Next field or panel"),
    ("r", "Reload (lists)"),
    ("a", "Add task (sprint)"),
    ("y / n / l", "Accept / decline / leave (project management)"),
];

pub struct HelpScreen;

impl Screen for HelpScreen {
    fn mount(&mut self) {}

    fn render(&self) -> ScreenView {
        let lines = KEY_BINDINGS
            .iter()
            .map(|(key, action)| format!("{:<14} {}", key, action))
            .collect();
        ScreenView::new("Help", Body::Text(lines)).with_breadcrumbs(&["Home", "Help"])
    }
}
