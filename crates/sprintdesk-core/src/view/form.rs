use super::{FieldView, FormView, Input, InputOutcome};

/// Check if a character is valid for text input (printable, non-control)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a character can be added to a field holding `current_len` chars
pub fn can_add_char(current_len: usize, max_len: usize, c: char) -> bool {
    current_len < max_len && is_valid_input_char(c)
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub max_len: usize,
    pub masked: bool,
}

impl FormField {
    pub fn text(label: &'static str, max_len: usize) -> Self {
        Self {
            label,
            value: String::new(),
            max_len,
            masked: false,
        }
    }

    pub fn secret(label: &'static str, max_len: usize) -> Self {
        Self {
            masked: true,
            ..Self::text(label, max_len)
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into().chars().take(self.max_len).collect();
        self
    }

    fn push(&mut self, c: char) -> bool {
        if can_add_char(self.value.chars().count(), self.max_len, c) {
            self.value.push(c);
            true
        } else {
            false
        }
    }

    fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// What a form did with an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Edited,
    Submit,
    Ignored,
}

impl From<FormAction> for InputOutcome {
    fn from(action: FormAction) -> Self {
        match action {
            FormAction::Ignored => InputOutcome::Ignored,
            _ => InputOutcome::Handled,
        }
    }
}

/// Text fields followed by a submit button; `focus == fields.len()` is the button.
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub submit_label: &'static str,
}

impl Form {
    pub fn new(fields: Vec<FormField>, submit_label: &'static str) -> Self {
        Self {
            fields,
            focus: 0,
            submit_label,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn clear(&mut self, index: usize) {
        if let Some(field) = self.fields.get_mut(index) {
            field.value.clear();
        }
    }

    /// Focus the first empty field, or the button when all are filled
    pub fn focus_first_empty(&mut self) {
        self.focus = self
            .fields
            .iter()
            .position(|f| f.value.is_empty())
            .unwrap_or(self.fields.len());
    }

    pub fn on_button(&self) -> bool {
        self.focus == self.fields.len()
    }

    fn slots(&self) -> usize {
        self.fields.len() + 1
    }

    pub fn handle_input(&mut self, input: Input) -> FormAction {
        match input {
            Input::Tab | Input::Down => {
                self.focus = (self.focus + 1) % self.slots();
                FormAction::Edited
            }
            Input::BackTab | Input::Up => {
                self.focus = (self.focus + self.slots() - 1) % self.slots();
                FormAction::Edited
            }
            Input::Enter => {
                if self.on_button() {
                    FormAction::Submit
                } else {
                    self.focus += 1;
                    if self.on_button() {
                        FormAction::Submit
                    } else {
                        FormAction::Edited
                    }
                }
            }
            Input::Backspace => match self.fields.get_mut(self.focus) {
                Some(field) => {
                    field.value.pop();
                    FormAction::Edited
                }
                None => FormAction::Ignored,
            },
            Input::Char(c) => match self.fields.get_mut(self.focus) {
                Some(field) => {
                    field.push(c);
                    FormAction::Edited
                }
                None => FormAction::Ignored,
            },
            _ => FormAction::Ignored,
        }
    }

    pub fn view(&self, error: Option<String>, busy: bool) -> FormView {
        FormView {
            fields: self
                .fields
                .iter()
                .map(|f| FieldView {
                    label: f.label.to_string(),
                    value: f.display(),
                })
                .collect(),
            focus: self.focus,
            submit_label: self.submit_label.to_string(),
            error,
            busy,
            notes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_form() -> Form {
        Form::new(
            vec![FormField::text("Username", 50), FormField::secret("Password", 128)],
            "Log in",
        )
    }

    #[test]
    fn test_can_add_char() {
        assert!(can_add_char(0, 50, 'a'));
        assert!(can_add_char(49, 50, 'z'));
        assert!(!can_add_char(50, 50, 'a'));
        assert!(!can_add_char(0, 50, '\x00'));
        assert!(!can_add_char(0, 50, '\n'));
        assert!(!can_add_char(0, 50, '\t'));
    }

    #[test]
    fn test_typing_and_masking() {
        let mut form = login_form();
        for c in "ada".chars() {
            form.handle_input(Input::Char(c));
        }
        assert_eq!(form.handle_input(Input::Tab), FormAction::Edited);
        for c in "pw!".chars() {
            form.handle_input(Input::Char(c));
        }
        form.handle_input(Input::Backspace);

        assert_eq!(form.value(0), "ada");
        assert_eq!(form.value(1), "pw");
        let view = form.view(None, false);
        assert_eq!(view.fields[1].value, "**");
        assert_eq!(view.focus, 1);
    }

    #[test]
    fn test_length_limit() {
        let mut form = Form::new(vec![FormField::text("Code", 3)], "Go");
        for c in "abcdef".chars() {
            form.handle_input(Input::Char(c));
        }
        assert_eq!(form.value(0), "abc");
        assert_eq!(FormField::text("Code", 3).with_value("abcdef").value, "abc");
    }

    #[test]
    fn test_enter_advances_then_submits() {
        let mut form = login_form();
        assert_eq!(form.handle_input(Input::Enter), FormAction::Edited);
        assert_eq!(form.focus, 1);
        assert_eq!(form.handle_input(Input::Enter), FormAction::Submit);
        assert!(form.on_button());
        assert_eq!(form.handle_input(Input::Enter), FormAction::Submit);
    }

    #[test]
    fn test_focus_wraps() {
        let mut form = login_form();
        form.handle_input(Input::BackTab);
        assert!(form.on_button());
        form.handle_input(Input::Tab);
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn test_focus_first_empty() {
        let mut form = login_form();
        form.fields[0].value = "ada".to_string();
        form.focus_first_empty();
        assert_eq!(form.focus, 1);
        form.fields[1].value = "pw".to_string();
        form.focus_first_empty();
        assert!(form.on_button());
    }
}
