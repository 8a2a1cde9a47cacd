use tracing::{info, warn};

use super::ScreenContext;
use crate::models::{Message, RegisterRequest};
use crate::router::Route;
use crate::view::{Body, Fetch, Form, FormAction, FormField, Input, InputOutcome, Screen, ScreenView};

use super::{PASSWORD_MAX_LEN, USERNAME_MAX_LEN};

const EMAIL_MAX_LEN: usize = 254;

const USERNAME: usize = 0;
const EMAIL: usize = 1;
const PASSWORD: usize = 2;

pub struct RegisterScreen {
    cx: ScreenContext,
    form: Form,
    error: Option<String>,
    submit: Fetch<Message>,
}

impl RegisterScreen {
    pub fn new(cx: ScreenContext) -> Self {
        Self {
            cx,
            form: Form::new(
                vec![
                    FormField::text("Username", USERNAME_MAX_LEN),
                    FormField::text("Email", EMAIL_MAX_LEN),
                    FormField::secret("Password", PASSWORD_MAX_LEN),
                ],
                "Create account",
            ),
            error: None,
            submit: Fetch::new(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn validate(&self) -> Result<RegisterRequest, String> {
        let request = RegisterRequest {
            username: self.form.value(USERNAME).trim().to_string(),
            email: self.form.value(EMAIL).trim().to_string(),
            password: self.form.value(PASSWORD).to_string(),
        };
        if request.username.is_empty() || request.email.is_empty() || request.password.is_empty() {
            return Err("All fields are required".to_string());
        }
        if !request.email.contains('@') {
            return Err("Enter a valid email address".to_string());
        }
        Ok(request)
    }

    fn attempt_register(&mut self) {
        if self.submit.is_loading() {
            return;
        }
        let request = match self.validate() {
            Ok(request) => request,
            Err(message) => {
                self.error = Some(message);
                return;
            }
        };
        self.error = None;
        let auth = self.cx.auth.clone();
        self.submit.start(async move { auth.register(&request).await });
    }
}

impl Screen for RegisterScreen {
    fn mount(&mut self) {}

    fn poll(&mut self) -> bool {
        if !self.submit.poll() {
            return false;
        }
        if let Some(e) = self.submit.error() {
            warn!(error = %e, "Registration failed");
            self.error = Some(format!("Registration failed: {}", e.user_message()));
            self.form.clear(PASSWORD);
        } else {
            info!("Account created");
            self.cx.navigator.navigate(Route::Login { return_to: None });
        }
        true
    }

    fn render(&self) -> ScreenView {
        let mut form = self.form.view(self.error.clone(), self.submit.is_loading());
        form.notes = vec!["Already registered? Press Esc and then l to log in.".to_string()];
        ScreenView::new("Create account", Body::Form(form))
            .with_breadcrumbs(&["Home", "Register"])
            .with_hint("Tab: next field  Enter: submit")
    }

    fn handle_input(&mut self, input: Input) -> InputOutcome {
        let action = self.form.handle_input(input);
        if action == FormAction::Submit {
            self.attempt_register();
        }
        action.into()
    }

    fn unmount(&mut self) {
        self.submit.cancel();
    }

    fn captures_text(&self) -> bool {
        !self.form.on_button()
    }
}
