use super::{pending_body, ScreenContext};
use crate::models::Project;
use crate::router::Route;
use crate::view::{scroll_input, Body, Fetch, Input, InputOutcome, ListView, Screen, ScreenView};

pub struct ProjectsScreen {
    cx: ScreenContext,
    projects: Fetch<Vec<Project>>,
    selected: usize,
}

impl ProjectsScreen {
    pub fn new(cx: ScreenContext) -> Self {
        Self {
            cx,
            projects: Fetch::new(),
            selected: 0,
        }
    }

    fn reload(&mut self) {
        self.cx
            .load(&mut self.projects, |api, token| async move { api.get_projects(&token).await });
    }

    fn len(&self) -> usize {
        self.projects.data().map(Vec::len).unwrap_or(0)
    }
}

fn project_row(project: &Project) -> String {
    let preview = project.description_preview();
    if preview.is_empty() {
        format!("{} [{}]", project.name, project.tag_name())
    } else {
        format!("{} [{}]  {}", project.name, project.tag_name(), preview)
    }
}

impl Screen for ProjectsScreen {
    fn mount(&mut self) {
        self.reload();
    }

    fn poll(&mut self) -> bool {
        self.projects.poll()
    }

    fn render(&self) -> ScreenView {
        let body = pending_body(&self.projects).unwrap_or_else(|| {
            let items = self
                .projects
                .data()
                .map(|projects| projects.iter().map(project_row).collect())
                .unwrap_or_default();
            Body::List(ListView::new("Projects", items, self.selected, "No projects yet"))
        });
        ScreenView::new("Projects", body)
            .with_breadcrumbs(&["Home", "Projects"])
            .with_hint("Enter: open  r: reload")
    }

    fn handle_input(&mut self, input: Input) -> InputOutcome {
        match input {
            Input::Enter => {
                if let Some(project) = self.projects.data().and_then(|p| p.get(self.selected)) {
                    self.cx.navigator.navigate(Route::Project {
                        project_id: project.id,
                    });
                }
                InputOutcome::Handled
            }
            Input::Char('r') => {
                self.reload();
                InputOutcome::Handled
            }
            other => {
                let len = self.len();
                scroll_input(&mut self.selected, len, other)
            }
        }
    }

    fn unmount(&mut self) {
        self.projects.cancel();
    }
}
