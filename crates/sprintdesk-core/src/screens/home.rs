use super::ScreenContext;
use crate::router::Route;
use crate::utils::format_minutes;
use crate::view::{Body, Input, InputOutcome, Screen, ScreenView};

pub struct HomeScreen {
    cx: ScreenContext,
}

impl HomeScreen {
    pub fn new(cx: ScreenContext) -> Self {
        Self { cx }
    }
}

impl Screen for HomeScreen {
    fn mount(&mut self) {}

    fn render(&self) -> ScreenView {
        let mut lines = vec![
            "Welcome to sprintdesk.".to_string(),
            "Plan projects, run sprints and keep track of tasks.".to_string(),
            String::new(),
        ];
        match self.cx.session.minutes_until_expiry() {
            Some(minutes) => {
                lines.push(format!("Signed in. Session expires in {}.", format_minutes(minutes)));
                lines.push("p  Projects".to_string());
                lines.push("m  Project management".to_string());
            }
            None => {
                lines.push("You are not signed in.".to_string());
                lines.push("l  Log in".to_string());
                lines.push("r  Create an account".to_string());
            }
        }
        lines.push("?  Help".to_string());

        ScreenView::new("Home", Body::Text(lines)).with_breadcrumbs(&["Home"])
    }

    fn handle_input(&mut self, input: Input) -> InputOutcome {
        let route = match input {
            Input::Char('l') => Route::Login { return_to: None },
            Input::Char('r') => Route::Register,
            _ => return InputOutcome::Ignored,
        };
        self.cx.navigator.navigate(route);
        InputOutcome::Handled
    }
}
