use tracing::{error, info, warn};

use super::ScreenContext;
use crate::api::ApiError;
use crate::auth::store::lock;
use crate::auth::{Keychain, RememberAction};
use crate::router::Route;
use crate::view::{Body, Fetch, Form, FormAction, FormField, Input, InputOutcome, Screen, ScreenView};

/// Maximum username length for login input
pub const USERNAME_MAX_LEN: usize = 50;

/// Maximum password length for login input
pub const PASSWORD_MAX_LEN: usize = 128;

const USERNAME: usize = 0;
const PASSWORD: usize = 1;

pub struct LoginScreen {
    cx: ScreenContext,
    return_to: Option<String>,
    form: Form,
    remember: bool,
    error: Option<String>,
    submit: Fetch<()>,
    /// Username and password of the attempt in flight
    pending: Option<(String, String)>,
}

impl LoginScreen {
    pub fn new(cx: ScreenContext, return_to: Option<String>) -> Self {
        Self {
            cx,
            return_to,
            form: Form::new(
                vec![
                    FormField::text("Username", USERNAME_MAX_LEN),
                    FormField::secret("Password", PASSWORD_MAX_LEN),
                ],
                "Log in",
            ),
            remember: false,
            error: None,
            submit: Fetch::new(),
            pending: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn attempt_login(&mut self) {
        if self.submit.is_loading() {
            return;
        }
        let username = self.form.value(USERNAME).trim().to_string();
        let password = self.form.value(PASSWORD).to_string();
        if username.is_empty() || password.is_empty() {
            self.error = Some("Username and password required".to_string());
            return;
        }

        self.error = None;
        self.pending = Some((username.clone(), password.clone()));
        let session = self.cx.session.clone();
        self.submit
            .start(async move { session.authenticate(&username, &password).await });
    }

    fn on_success(&mut self, username: String, password: String) {
        info!("Login successful");
        let was_remembered = {
            let mut config = lock(&self.cx.config);
            let was_remembered = config.remember_password;
            config.last_username = Some(username.clone());
            config.remember_password = self.remember;
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            was_remembered
        };

        let action = RememberAction::for_login(self.remember, was_remembered);
        if let Err(e) = Keychain::apply(action, &username, &password) {
            warn!(error = %e, "Failed to update remembered password");
        }

        self.form.clear(PASSWORD);
        let target = self
            .return_to
            .as_deref()
            .map(Route::parse)
            .unwrap_or(Route::Projects);
        self.cx.navigator.navigate(target);
    }

    fn on_failure(&mut self, e: &ApiError) {
        error!(error = %e, "Login failed");
        self.error = Some(login_error_message(e));
        self.form.clear(PASSWORD);
        self.form.focus = PASSWORD;
    }
}

/// User-facing text for a failed login
fn login_error_message(e: &ApiError) -> String {
    match e {
        ApiError::Unauthorized | ApiError::AccessDenied(_) | ApiError::Validation(_) => {
            "Invalid username or password".to_string()
        }
        ApiError::NetworkError(_) => {
            "Unable to connect to server. Check your internet connection.".to_string()
        }
        other => format!("Login failed: {}", other),
    }
}

impl Screen for LoginScreen {
    fn mount(&mut self) {
        let (username, password, remember) = {
            let config = lock(&self.cx.config);
            let username = config.prefill_username();
            let password = config.prefill_password(&username);
            (username, password, config.remember_password)
        };
        self.remember = remember;
        if self.form.value(USERNAME).is_empty() {
            self.form.fields[USERNAME] = FormField::text("Username", USERNAME_MAX_LEN).with_value(username);
        }
        if self.form.value(PASSWORD).is_empty() {
            self.form.fields[PASSWORD] = FormField::secret("Password", PASSWORD_MAX_LEN).with_value(password);
        }
        self.form.focus_first_empty();
    }

    fn poll(&mut self) -> bool {
        if !self.submit.poll() {
            return false;
        }
        let pending = self.pending.take();
        match (self.submit.error().cloned(), pending) {
            (Some(e), _) => self.on_failure(&e),
            (None, Some((username, password))) => self.on_success(username, password),
            (None, None) => {}
        }
        true
    }

    fn render(&self) -> ScreenView {
        let mut form = self.form.view(self.error.clone(), self.submit.is_loading());
        let mark = if self.remember { "x" } else { " " };
        form.notes = vec![
            format!("[{}] Remember password (r on the button)", mark),
            "No account yet? Press n on the button to register.".to_string(),
        ];
        if let Some(ref target) = self.return_to {
            form.notes.push(format!("You will continue to {} after logging in.", target));
        }
        ScreenView::new("Log in", Body::Form(form))
            .with_breadcrumbs(&["Home", "Log in"])
            .with_hint("Tab: next field  Enter: submit")
    }

    fn handle_input(&mut self, input: Input) -> InputOutcome {
        if self.form.on_button() {
            match input {
                Input::Char('r') | Input::Char(' ') => {
                    self.remember = !self.remember;
                    return InputOutcome::Handled;
                }
                Input::Char('n') => {
                    self.cx.navigator.navigate(Route::Register);
                    return InputOutcome::Handled;
                }
                _ => {}
            }
        }

        let action = self.form.handle_input(input);
        if action == FormAction::Submit {
            self.attempt_login();
        }
        action.into()
    }

    fn unmount(&mut self) {
        self.submit.cancel();
        self.pending = None;
    }

    fn captures_text(&self) -> bool {
        !self.form.on_button()
    }
}
