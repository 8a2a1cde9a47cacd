use tracing::warn;

use super::{pending_body, ScreenContext};
use crate::models::{Sprint, Task};
use crate::view::{
    scroll_input, Body, Fetch, FetchState, Input, InputOutcome, ListView, Screen, ScreenView,
};

const NO_TASKS_MESSAGE: &str = "No tasks available. Add tasks to project first.";
const ASSIGN_FAILED_MESSAGE: &str = "Add task to sprint failed";

/// Task chooser opened with `a`
struct Picker {
    tasks: Fetch<Vec<Task>>,
    selected: usize,
}

pub struct SprintScreen {
    cx: ScreenContext,
    project_id: i64,
    sprint_id: i64,
    sprint: Fetch<Sprint>,
    selected: usize,
    picker: Option<Picker>,
    assign: Fetch<Task>,
    message: Option<String>,
}

impl SprintScreen {
    pub fn new(cx: ScreenContext, project_id: i64, sprint_id: i64) -> Self {
        Self {
            cx,
            project_id,
            sprint_id,
            sprint: Fetch::new(),
            selected: 0,
            picker: None,
            assign: Fetch::new(),
            message: None,
        }
    }

    fn reload(&mut self) {
        let sprint_id = self.sprint_id;
        self.cx
            .load(&mut self.sprint, move |api, token| async move {
                api.get_sprint(&token, sprint_id).await
            });
    }

    fn open_picker(&mut self) {
        let project_id = self.project_id;
        let mut picker = Picker {
            tasks: Fetch::new(),
            selected: 0,
        };
        self.cx
            .load(&mut picker.tasks, move |api, token| async move {
                api.get_tasks(&token, project_id).await
            });
        self.message = None;
        self.picker = Some(picker);
    }

    fn close_picker(&mut self) {
        if let Some(mut picker) = self.picker.take() {
            picker.tasks.cancel();
        }
    }

    fn assign_selected(&mut self) {
        if self.assign.is_loading() {
            return;
        }
        let Some(task_id) = self
            .picker
            .as_ref()
            .and_then(|p| p.tasks.data().and_then(|t| t.get(p.selected)))
            .map(|t| t.id)
        else {
            return;
        };
        let sprint_id = self.sprint_id;
        self.cx
            .load(&mut self.assign, move |api, token| async move {
                api.add_task_to_sprint(&token, sprint_id, task_id).await
            });
    }

    fn apply_assignment(&mut self) {
        match self.assign.state().clone() {
            FetchState::Ready(task) => {
                if let Some(sprint) = self.sprint.data_mut() {
                    sprint.tasks.push(task);
                }
                self.close_picker();
                self.assign.reset();
            }
            FetchState::Failed(e) => {
                warn!(error = %e, sprint_id = self.sprint_id, "Adding task to sprint failed");
                self.message = Some(ASSIGN_FAILED_MESSAGE.to_string());
            }
            FetchState::Idle | FetchState::Loading => {}
        }
    }

    fn render_picker(&self, picker: &Picker) -> Body {
        if let Some(body) = pending_body(&picker.tasks) {
            return body;
        }
        let tasks = picker.tasks.data().map(Vec::as_slice).unwrap_or_default();
        let items = tasks.iter().map(|t| t.name.clone()).collect();
        let mut header = Vec::new();
        if let Some(ref message) = self.message {
            header.push(message.clone());
        }
        Body::Panels {
            header,
            panels: vec![ListView::new("Add task", items, picker.selected, NO_TASKS_MESSAGE)],
            active: 0,
        }
    }
}

impl Screen for SprintScreen {
    fn mount(&mut self) {
        self.reload();
    }

    fn poll(&mut self) -> bool {
        let mut changed = self.sprint.poll();
        if let Some(ref mut picker) = self.picker {
            changed |= picker.tasks.poll();
        }
        if self.assign.poll() {
            self.apply_assignment();
            changed = true;
        }
        changed
    }

    fn render(&self) -> ScreenView {
        let title = self
            .sprint
            .data()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("Sprint {}", self.sprint_id));
        let project_crumb = format!("Project {}", self.project_id);
        let crumbs = ["Home", "Projects", project_crumb.as_str(), title.as_str()];

        if let Some(ref picker) = self.picker {
            return ScreenView::new(format!("{}: add task", title), self.render_picker(picker))
                .with_breadcrumbs(&crumbs)
                .with_hint("Enter: add  Esc: close");
        }

        let body = pending_body(&self.sprint).unwrap_or_else(|| {
            let Some(sprint) = self.sprint.data() else {
                return Body::Blank;
            };
            let header = vec![
                sprint.date_range(),
                format!("{}/{} tasks finished", sprint.finished_count(), sprint.tasks.len()),
            ];
            Body::Panels {
                header,
                panels: vec![ListView::new(
                    "Tasks",
                    sprint.tasks.iter().map(Task::summary).collect(),
                    self.selected,
                    "No tasks in this sprint",
                )],
                active: 0,
            }
        });

        ScreenView::new(title.clone(), body)
            .with_breadcrumbs(&crumbs)
            .with_hint("a: add task  r: reload")
    }

    fn handle_input(&mut self, input: Input) -> InputOutcome {
        if self.picker.is_some() {
            return match input {
                Input::Esc => {
                    self.close_picker();
                    InputOutcome::Handled
                }
                Input::Enter => {
                    self.assign_selected();
                    InputOutcome::Handled
                }
                other => match self.picker.as_mut() {
                    Some(picker) => {
                        let len = picker.tasks.data().map(Vec::len).unwrap_or(0);
                        scroll_input(&mut picker.selected, len, other)
                    }
                    None => InputOutcome::Ignored,
                },
            };
        }

        match input {
            Input::Char('a') => {
                self.open_picker();
                InputOutcome::Handled
            }
            Input::Char('r') => {
                self.reload();
                InputOutcome::Handled
            }
            other => {
                let len = self.sprint.data().map(|s| s.tasks.len()).unwrap_or(0);
                scroll_input(&mut self.selected, len, other)
            }
        }
    }

    fn unmount(&mut self) {
        self.sprint.cancel();
        self.assign.cancel();
        self.close_picker();
    }
}
