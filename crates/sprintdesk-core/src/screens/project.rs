use super::{pending_body, ScreenContext};
use crate::api::ApiError;
use crate::models::{Project, Sprint, Task};
use crate::router::Route;
use crate::view::{scroll_input, Body, Fetch, Input, InputOutcome, ListView, Screen, ScreenView};

/// Everything the project page shows, loaded together
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectOverview {
    pub project: Project,
    pub tasks: Vec<Task>,
    pub sprints: Vec<Sprint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Tasks,
    Sprints,
}

pub struct ProjectScreen {
    cx: ScreenContext,
    project_id: i64,
    overview: Fetch<ProjectOverview>,
    panel: Panel,
    task_selection: usize,
    sprint_selection: usize,
}

impl ProjectScreen {
    pub fn new(cx: ScreenContext, project_id: i64) -> Self {
        Self {
            cx,
            project_id,
            overview: Fetch::new(),
            panel: Panel::Tasks,
            task_selection: 0,
            sprint_selection: 0,
        }
    }

    fn reload(&mut self) {
        let project_id = self.project_id;
        self.cx.load(&mut self.overview, move |api, token| async move {
            let (project, tasks, sprints) = futures::try_join!(
                api.get_project(&token, project_id),
                api.get_tasks(&token, project_id),
                api.get_sprints(&token, project_id),
            )?;
            Ok::<_, ApiError>(ProjectOverview {
                project,
                tasks,
                sprints,
            })
        });
    }

    fn open_selected_sprint(&self) {
        let Some(sprint) = self
            .overview
            .data()
            .and_then(|o| o.sprints.get(self.sprint_selection))
        else {
            return;
        };
        self.cx.navigator.navigate(Route::Sprint {
            project_id: self.project_id,
            sprint_id: sprint.id,
        });
    }
}

impl Screen for ProjectScreen {
    fn mount(&mut self) {
        self.reload();
    }

    fn poll(&mut self) -> bool {
        self.overview.poll()
    }

    fn render(&self) -> ScreenView {
        let title = self
            .overview
            .data()
            .map(|o| o.project.name.clone())
            .unwrap_or_else(|| format!("Project {}", self.project_id));

        let body = pending_body(&self.overview).unwrap_or_else(|| {
            let Some(overview) = self.overview.data() else {
                return Body::Blank;
            };
            let mut header = vec![format!("Tag: {}", overview.project.tag_name())];
            if !overview.project.description.is_empty() {
                header.push(overview.project.description.clone());
            }
            let tasks = ListView::new(
                format!("Tasks ({})", overview.tasks.len()),
                overview.tasks.iter().map(Task::summary).collect(),
                self.task_selection,
                "No tasks yet",
            );
            let sprints = ListView::new(
                format!("Sprints ({})", overview.sprints.len()),
                overview
                    .sprints
                    .iter()
                    .map(|s| format!("{}  {}", s.name, s.date_range()))
                    .collect(),
                self.sprint_selection,
                "No sprints yet",
            );
            Body::Panels {
                header,
                panels: vec![tasks, sprints],
                active: match self.panel {
                    Panel::Tasks => 0,
                    Panel::Sprints => 1,
                },
            }
        });

        let crumb = title.clone();
        ScreenView::new(title, body)
            .with_breadcrumbs(&["Home", "Projects", crumb.as_str()])
            .with_hint("Tab: switch panel  Enter: open sprint  r: reload")
    }

    fn handle_input(&mut self, input: Input) -> InputOutcome {
        match input {
            Input::Tab | Input::BackTab => {
                self.panel = match self.panel {
                    Panel::Tasks => Panel::Sprints,
                    Panel::Sprints => Panel::Tasks,
                };
                InputOutcome::Handled
            }
            Input::Enter if self.panel == Panel::Sprints => {
                self.open_selected_sprint();
                InputOutcome::Handled
            }
            Input::Char('r') => {
                self.reload();
                InputOutcome::Handled
            }
            other => {
                let (tasks, sprints) = self
                    .overview
                    .data()
                    .map(|o| (o.tasks.len(), o.sprints.len()))
                    .unwrap_or((0, 0));
                match self.panel {
                    Panel::Tasks => scroll_input(&mut self.task_selection, tasks, other),
                    Panel::Sprints => scroll_input(&mut self.sprint_selection, sprints, other),
                }
            }
        }
    }

    fn unmount(&mut self) {
        self.overview.cancel();
    }
}
